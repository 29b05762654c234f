//! Service lifecycle management.
//!
//! Wires the provider client, pull request source, and reconciler together,
//! runs the sweep ticker, and serves the HTTP API with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api;
use crate::config::JanitorConfig;
use crate::error::{JanitorError, JanitorResult};
use crate::naming::Namer;
use crate::policy::ProtectionPolicy;
use crate::provider::create_provider;
use crate::reconcile::Reconciler;
use crate::vcs::create_pull_request_source;

/// The janitor service.
pub struct JanitorService {
    config: JanitorConfig,
    cancel: CancellationToken,
}

impl JanitorService {
    /// Create a new service with the given configuration.
    #[must_use]
    pub fn new(config: JanitorConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Run the janitor service.
    ///
    /// This will:
    /// 1. Validate the configuration
    /// 2. Create the provider client and pull request source
    /// 3. Start the scheduled sweep task
    /// 4. Start the HTTP API server
    /// 5. Wait for shutdown signal
    pub async fn run(&self) -> JanitorResult<()> {
        self.config.validate()?;

        let provider = create_provider(&self.config.provider)?;
        info!(
            provider_type = ?self.config.provider.provider_type,
            "deployment provider configured"
        );

        let pull_requests = create_pull_request_source(&self.config.github)?;
        info!(repository = %self.config.github.repository, "pull request source configured");

        let reconciler = Arc::new(Reconciler::new(
            provider,
            pull_requests,
            Namer::new(self.config.provider.name_prefix.clone()),
            ProtectionPolicy::new(self.config.protection.protected_branches.iter().cloned()),
            self.config.sweep.clone(),
        ));

        if self.config.sweep.enabled {
            let sweep_reconciler = Arc::clone(&reconciler);
            let interval = Duration::from_secs(self.config.sweep.interval_secs);
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                run_sweep_loop(sweep_reconciler, interval, cancel).await;
            });
            info!(
                interval_secs = self.config.sweep.interval_secs,
                "sweep task started"
            );
        } else {
            info!("scheduled sweep disabled");
        }

        let state = api::AppState {
            reconciler,
            webhook_secret: Arc::from(self.config.webhook.secret.as_str()),
        };
        let app = api::router(state);

        let listener = tokio::net::TcpListener::bind(self.config.server.listen_addr)
            .await
            .map_err(|e| JanitorError::Config(format!("failed to bind: {e}")))?;
        info!(addr = %self.config.server.listen_addr, "janitor service listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.cancel.clone()))
            .await
            .map_err(|e| JanitorError::internal(format!("server error: {e}")))?;

        info!("janitor service shutdown complete");
        Ok(())
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Run sweeps on a fixed interval until cancelled.
///
/// The first sweep runs immediately at startup, which doubles as a check
/// that provider and VCS credentials work.
async fn run_sweep_loop(
    reconciler: Arc<Reconciler>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match reconciler.sweep().await {
                    Ok(report) => {
                        if !report.unevaluated.is_empty() {
                            error!(
                                unevaluated = report.unevaluated.len(),
                                "sweep abandoned before evaluating all orphans"
                            );
                        }
                    }
                    Err(e) => {
                        // An aborted sweep never blocks the next scheduled one.
                        error!(error = %e, "sweep aborted");
                    }
                }
            }
            () = cancel.cancelled() => {
                info!("sweep task stopping");
                break;
            }
        }
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("received SIGTERM, initiating shutdown");
        }
        () = cancel.cancelled() => {
            info!("shutdown requested");
        }
    }
}
