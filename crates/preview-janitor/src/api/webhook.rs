//! GitHub webhook receiver.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info};

use crate::reconcile::EventDecision;
use crate::types::{PullRequestAction, PullRequestEvent};

use super::{error_to_status, AppState, ErrorResponse};

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

/// Raw webhook payload, before validation.
#[derive(Debug, Deserialize)]
struct RawPayload {
    action: Option<PullRequestAction>,
    pull_request: Option<RawPullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    head: RawHead,
}

#[derive(Debug, Deserialize)]
struct RawHead {
    #[serde(rename = "ref")]
    branch: Option<String>,
}

/// Acknowledgment returned to the webhook sender.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    /// Always `"ok"`.
    pub status: &'static str,
    /// What the reconciler decided, when a pull request event was processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
}

/// Verify a GitHub `X-Hub-Signature-256` header against the raw body.
///
/// The header carries `sha256=<hex>`; the digest is HMAC-SHA256 over the raw
/// request body with the shared secret. Comparison is constant-time.
#[must_use]
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(hex_digest) = header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(claimed) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    expected.as_slice().ct_eq(claimed.as_slice()).into()
}

/// Receive one webhook delivery.
///
/// The signature is verified before the payload is even parsed. Event types
/// other than `pull_request` (pings and the like) are acknowledged without
/// action. Malformed pull request payloads are rejected with a validation
/// error rather than silently ignored.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<AckResponse>), (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("missing signature")),
            )
        })?;

    if !verify_signature(&state.webhook_secret, &body, signature) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("invalid signature")),
        ));
    }

    let delivery_id = headers
        .get(DELIVERY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    let event_type = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if event_type != "pull_request" {
        debug!(
            event = %event_type,
            delivery = delivery_id.as_deref().unwrap_or("-"),
            "ignoring non-pull-request event"
        );
        return Ok((
            StatusCode::OK,
            Json(AckResponse {
                status: "ok",
                decision: None,
            }),
        ));
    }

    let event = parse_event(&body, delivery_id).map_err(|message| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(message)),
        )
    })?;

    match state.reconciler.handle_pull_request(&event).await {
        Ok(decision) => {
            info!(
                branch = %event.head_branch,
                decision = decision_label(&decision),
                "webhook processed"
            );
            Ok((
                StatusCode::OK,
                Json(AckResponse {
                    status: "ok",
                    decision: Some(decision_label(&decision)),
                }),
            ))
        }
        Err(e) => {
            error!(branch = %event.head_branch, error = %e, "webhook processing failed");
            Err((
                error_to_status(&e),
                Json(ErrorResponse::new(e.to_string())),
            ))
        }
    }
}

/// Validate a raw payload into a typed event.
fn parse_event(body: &[u8], delivery_id: Option<String>) -> Result<PullRequestEvent, String> {
    let payload: RawPayload = serde_json::from_slice(body)
        .map_err(|e| format!("malformed pull request payload: {e}"))?;

    let action = payload
        .action
        .ok_or_else(|| "payload missing action".to_owned())?;

    let head_branch = payload
        .pull_request
        .and_then(|pr| pr.head.branch)
        .filter(|branch| !branch.is_empty())
        .ok_or_else(|| "payload missing head branch".to_owned())?;

    Ok(PullRequestEvent {
        action,
        head_branch,
        delivery_id,
    })
}

const fn decision_label(decision: &EventDecision) -> &'static str {
    match decision {
        EventDecision::Deleted(_) => "deleted",
        EventDecision::AlreadyAbsent(_) => "already_absent",
        EventDecision::SkippedAction(_) => "skipped_action",
        EventDecision::SkippedLongLivedBranch(_) => "skipped_long_lived_branch",
        EventDecision::SkippedProtected(_) => "skipped_protected",
        EventDecision::NotProvisioned(_) => "not_provisioned",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"action": "closed"}"#;
        let header = sign("secret", body);
        assert!(verify_signature("secret", body, &header));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = br#"{"action": "closed"}"#;
        let header = sign("other-secret", body);
        assert!(!verify_signature("secret", body, &header));
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign("secret", br#"{"action": "closed"}"#);
        assert!(!verify_signature("secret", br#"{"action": "opened"}"#, &header));
    }

    #[test]
    fn malformed_header_fails() {
        let body = b"x";
        assert!(!verify_signature("secret", body, "sha1=abcdef"));
        assert!(!verify_signature("secret", body, "sha256=not-hex"));
        assert!(!verify_signature("secret", body, ""));
    }

    #[test]
    fn parse_event_requires_action_and_branch() {
        let ok = parse_event(
            br#"{"action": "closed", "pull_request": {"head": {"ref": "fix"}}}"#,
            None,
        )
        .unwrap();
        assert_eq!(ok.action, PullRequestAction::Closed);
        assert_eq!(ok.head_branch, "fix");

        assert!(parse_event(br#"{"pull_request": {"head": {"ref": "fix"}}}"#, None).is_err());
        assert!(parse_event(br#"{"action": "closed"}"#, None).is_err());
        assert!(parse_event(br#"{"action": "closed", "pull_request": {"head": {}}}"#, None)
            .is_err());
        assert!(parse_event(b"not json", None).is_err());
    }
}
