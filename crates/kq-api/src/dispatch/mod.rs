//! Query dispatcher: one handler per intent.
//!
//! `Dispatcher::dispatch` is an exhaustive `match` over `Intent`, so adding
//! an intent without a handler does not compile. Handlers return the answer
//! sentence or a `DispatchError`; the mapping to `QueryOutcome` happens in
//! one place.

pub mod cluster;
pub mod components;
pub mod deployments;
pub mod pods;
pub mod secrets;
pub mod services;

use std::sync::Arc;

use kq_cluster::{ClusterError, ClusterReader};
use kq_protocol::{
    ALL_NAMESPACES, DEFAULT_NAMESPACE, Intent, ParamKey, ParameterBag, QueryOutcome, ResourceKind,
};

/// Fixed answer for `Intent::Unknown`. No cluster call is made.
pub const UNKNOWN_ANSWER: &str = "Sorry, I couldn't understand that question. \
    You can ask about pods, deployments, services, namespaces, nodes, resource quotas, \
    secrets, or Harbor components such as core or registry.";

/// Handler-internal failure.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    #[error(transparent)]
    Cluster(ClusterError),

    #[error("missing parameter {0}")]
    MissingParam(ParamKey),
}

impl From<ClusterError> for DispatchError {
    fn from(e: ClusterError) -> Self {
        match e {
            ClusterError::NotFound { kind, name } => DispatchError::NotFound { kind, name },
            other => DispatchError::Cluster(other),
        }
    }
}

pub type DispatchResult = Result<String, DispatchError>;

/// Routes a validated intent to its handler.
#[derive(Clone)]
pub struct Dispatcher {
    reader: Arc<dyn ClusterReader>,
}

impl Dispatcher {
    pub fn new(reader: Arc<dyn ClusterReader>) -> Self {
        Self { reader }
    }

    pub async fn dispatch(&self, intent: Intent, params: &ParameterBag) -> QueryOutcome {
        let reader = self.reader.as_ref();
        let result = match intent {
            Intent::Unknown => return QueryOutcome::success(UNKNOWN_ANSWER),
            Intent::ListNamespaces => cluster::list_namespaces(reader).await,
            Intent::ListNodes => cluster::list_nodes(reader).await,
            Intent::ListNodeNames => cluster::list_node_names(reader).await,
            Intent::GetResourceQuota => cluster::resource_quota(reader, params).await,
            Intent::ListPods => pods::list_pods(reader, params).await,
            Intent::GetPodStatus => pods::pod_status(reader, params).await,
            Intent::GetPodLogs => pods::pod_logs(reader, params).await,
            Intent::ListDeployments => deployments::list_deployments(reader, params).await,
            Intent::DescribeDeployment => deployments::describe_deployment(reader, params).await,
            Intent::GetDeploymentStatus => deployments::deployment_status(reader, params).await,
            Intent::ListServices => services::list_services(reader, params).await,
            Intent::GetServiceNamespace => services::service_namespace(reader, params).await,
            Intent::GetServiceRoutePort => services::service_route_port(reader, params).await,
            Intent::GetContainerPort => components::container_port(reader, params).await,
            Intent::GetReadinessProbePath => components::readiness_probe_path(reader, params).await,
            Intent::GetEnvironmentVariable => {
                components::environment_variable(reader, params).await
            }
            Intent::GetVolumeMountPath => components::volume_mount_path(reader, params).await,
            Intent::GetPodsAssociatedWithSecret => secrets::pods_for_secret(reader, params).await,
        };

        match result {
            Ok(answer) => QueryOutcome::success(answer),
            Err(DispatchError::NotFound { kind, name }) => {
                tracing::info!(intent = %intent, kind = %kind, name = %name, "resource not found");
                QueryOutcome::not_found(kind, name)
            }
            Err(DispatchError::MissingParam(key)) => QueryOutcome::validation_failed(format!(
                "Please specify {} to answer that question.",
                key.describe()
            )),
            Err(DispatchError::Cluster(e)) => {
                tracing::warn!(
                    intent = %intent,
                    reason = e.reason_code(),
                    error = %e,
                    "cluster read failed"
                );
                QueryOutcome::upstream_failure(e.reason_code(), e.to_string())
            }
        }
    }
}

// ── Shared helpers ──────────────────────────────────────────────

/// Namespace selection for list-style intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope<'a> {
    Namespace(&'a str),
    All,
}

impl Scope<'_> {
    /// "the 'x' namespace" / "the entire cluster".
    pub(crate) fn describe(&self) -> String {
        match self {
            Scope::Namespace(ns) => format!("the '{ns}' namespace"),
            Scope::All => "the entire cluster".to_string(),
        }
    }
}

pub(crate) fn required(params: &ParameterBag, key: ParamKey) -> Result<&str, DispatchError> {
    params.non_empty(key).ok_or(DispatchError::MissingParam(key))
}

/// Absent → default namespace, sentinel → every namespace.
pub(crate) fn list_scope(params: &ParameterBag) -> Scope<'_> {
    match params.non_empty(ParamKey::Namespace) {
        Some(ALL_NAMESPACES) => Scope::All,
        Some(ns) => Scope::Namespace(ns),
        None => Scope::Namespace(DEFAULT_NAMESPACE),
    }
}

/// Absent or sentinel → search every namespace.
pub(crate) fn lookup_scope(params: &ParameterBag) -> Option<&str> {
    params
        .non_empty(ParamKey::Namespace)
        .filter(|ns| *ns != ALL_NAMESPACES)
}

/// "There are no pods" / "There is 1 pod" / "There are 3 pods".
pub(crate) fn there_are(count: usize, singular: &str, plural: &str) -> String {
    match count {
        0 => format!("There are no {plural}"),
        1 => format!("There is 1 {singular}"),
        n => format!("There are {n} {plural}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kq_cluster::MockClusterReader;

    fn dispatcher(mock: MockClusterReader) -> (Dispatcher, Arc<MockClusterReader>) {
        let mock = Arc::new(mock);
        (Dispatcher::new(mock.clone()), mock)
    }

    #[tokio::test]
    async fn unknown_makes_no_cluster_calls() {
        let (dispatcher, mock) = dispatcher(MockClusterReader::with_sample_cluster());
        let outcome = dispatcher.dispatch(Intent::Unknown, &ParameterBag::new()).await;
        assert_eq!(outcome, QueryOutcome::success(UNKNOWN_ANSWER));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn transport_error_is_upstream_failure() {
        let mut mock = MockClusterReader::with_sample_cluster();
        mock.fail_on(
            "list_namespaces",
            ClusterError::Transport("dial tcp 10.0.0.1:6443: connection refused".into()),
        );
        let (dispatcher, _) = dispatcher(mock);

        let outcome = dispatcher
            .dispatch(Intent::ListNamespaces, &ParameterBag::new())
            .await;
        match outcome {
            QueryOutcome::UpstreamFailure { reason, cause } => {
                assert_eq!(reason, "unreachable");
                assert!(cause.contains("connection refused"));
            }
            other => panic!("expected upstream failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn forbidden_is_upstream_not_not_found() {
        let mut mock = MockClusterReader::with_sample_cluster();
        mock.fail_on("list_nodes", ClusterError::Forbidden("nodes is forbidden".into()));
        let (dispatcher, _) = dispatcher(mock);

        let outcome = dispatcher.dispatch(Intent::ListNodes, &ParameterBag::new()).await;
        assert_eq!(outcome.label(), "upstream_failure");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let (dispatcher, _) = dispatcher(MockClusterReader::with_sample_cluster());
        let params = ParameterBag::new()
            .with(ParamKey::PodName, "ghost")
            .with(ParamKey::Namespace, "harbor");

        let outcome = dispatcher.dispatch(Intent::GetPodStatus, &params).await;
        assert_eq!(outcome, QueryOutcome::not_found(ResourceKind::Pod, "ghost"));
    }

    #[tokio::test]
    async fn missing_required_param_is_validation_failure() {
        let (dispatcher, mock) = dispatcher(MockClusterReader::with_sample_cluster());
        let outcome = dispatcher
            .dispatch(Intent::GetPodLogs, &ParameterBag::new())
            .await;
        assert_eq!(outcome.label(), "validation_failed");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn scopes() {
        let empty = ParameterBag::new();
        assert_eq!(list_scope(&empty), Scope::Namespace(DEFAULT_NAMESPACE));
        assert_eq!(lookup_scope(&empty), None);

        let all = ParameterBag::new().with(ParamKey::Namespace, "all");
        assert_eq!(list_scope(&all), Scope::All);
        assert_eq!(lookup_scope(&all), None);

        let harbor = ParameterBag::new().with(ParamKey::Namespace, "harbor");
        assert_eq!(list_scope(&harbor), Scope::Namespace("harbor"));
        assert_eq!(lookup_scope(&harbor), Some("harbor"));
    }

    #[test]
    fn there_are_pluralizes() {
        assert_eq!(there_are(0, "pod", "pods"), "There are no pods");
        assert_eq!(there_are(1, "pod", "pods"), "There is 1 pod");
        assert_eq!(there_are(42, "pod", "pods"), "There are 42 pods");
    }
}
