//! Outcome → user-facing text.

use axum::http::StatusCode;
use kq_protocol::{QueryOutcome, ResourceKind};

/// Answer for any cluster read failure. The cause is logged, never shown.
pub const UPSTREAM_APOLOGY: &str = "Sorry, I couldn't retrieve that information from the \
    cluster right now. Please try again later.";

pub fn render(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Success { answer } => answer.clone(),
        QueryOutcome::ValidationFailed { message } => message.clone(),
        QueryOutcome::NotFound {
            kind: ResourceKind::Component,
            name,
        } => format!("I couldn't find a deployment for the component '{name}'."),
        QueryOutcome::NotFound { kind, name } => format!("I couldn't find the {kind} '{name}'."),
        QueryOutcome::UpstreamFailure { .. } => UPSTREAM_APOLOGY.to_string(),
    }
}

/// Every well-formed query is answered with 200, whatever the outcome.
pub fn http_status(outcome: &QueryOutcome) -> StatusCode {
    match outcome {
        QueryOutcome::Success { .. }
        | QueryOutcome::NotFound { .. }
        | QueryOutcome::ValidationFailed { .. }
        | QueryOutcome::UpstreamFailure { .. } => StatusCode::OK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_validation_pass_through() {
        assert_eq!(render(&QueryOutcome::success("There are 3 pods.")), "There are 3 pods.");
        assert_eq!(
            render(&QueryOutcome::validation_failed("Please specify a pod name.")),
            "Please specify a pod name."
        );
    }

    #[test]
    fn not_found_names_kind_and_object() {
        assert_eq!(
            render(&QueryOutcome::not_found(ResourceKind::Service, "ghost")),
            "I couldn't find the service 'ghost'."
        );
        assert_eq!(
            render(&QueryOutcome::not_found(ResourceKind::Component, "portal")),
            "I couldn't find a deployment for the component 'portal'."
        );
    }

    #[test]
    fn upstream_cause_never_rendered() {
        let outcome = QueryOutcome::upstream_failure(
            "unauthorized",
            "401 from https://10.0.0.1:6443 with token eyJhbGciOi",
        );
        let text = render(&outcome);
        assert_eq!(text, UPSTREAM_APOLOGY);
        assert!(!text.contains("eyJ"));
        assert!(!text.contains("10.0.0.1"));
    }

    #[test]
    fn all_outcomes_are_ok() {
        for outcome in [
            QueryOutcome::success("x"),
            QueryOutcome::not_found(ResourceKind::Pod, "p"),
            QueryOutcome::validation_failed("m"),
            QueryOutcome::upstream_failure("timeout", "c"),
        ] {
            assert_eq!(http_status(&outcome), StatusCode::OK);
        }
    }
}
