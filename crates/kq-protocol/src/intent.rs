//! The closed intent set and its static parameter schema.
//!
//! Every question the service can answer maps to exactly one [`Intent`].
//! The schema (required/optional keys, namespace policy) is declared here
//! once and shared by the classifier prompt, the validator, and the
//! `/intents` introspection endpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Namespace used when a namespace-scoped intent omits one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Canonical sentinel selecting the cluster-wide code path.
pub const ALL_NAMESPACES: &str = "all";

/// Closed set of question types the dispatcher knows how to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Intent {
    ListNamespaces,
    ListPods,
    ListNodes,
    GetPodStatus,
    ListDeployments,
    ListServices,
    GetPodLogs,
    DescribeDeployment,
    ListNodeNames,
    GetResourceQuota,
    GetContainerPort,
    GetReadinessProbePath,
    GetEnvironmentVariable,
    GetVolumeMountPath,
    GetPodsAssociatedWithSecret,
    GetServiceNamespace,
    GetDeploymentStatus,
    GetServiceRoutePort,
    /// Fallback for anything the classifier could not map.
    Unknown,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Intent; 19] = [
        Intent::ListNamespaces,
        Intent::ListPods,
        Intent::ListNodes,
        Intent::GetPodStatus,
        Intent::ListDeployments,
        Intent::ListServices,
        Intent::GetPodLogs,
        Intent::DescribeDeployment,
        Intent::ListNodeNames,
        Intent::GetResourceQuota,
        Intent::GetContainerPort,
        Intent::GetReadinessProbePath,
        Intent::GetEnvironmentVariable,
        Intent::GetVolumeMountPath,
        Intent::GetPodsAssociatedWithSecret,
        Intent::GetServiceNamespace,
        Intent::GetDeploymentStatus,
        Intent::GetServiceRoutePort,
        Intent::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::ListNamespaces => "ListNamespaces",
            Intent::ListPods => "ListPods",
            Intent::ListNodes => "ListNodes",
            Intent::GetPodStatus => "GetPodStatus",
            Intent::ListDeployments => "ListDeployments",
            Intent::ListServices => "ListServices",
            Intent::GetPodLogs => "GetPodLogs",
            Intent::DescribeDeployment => "DescribeDeployment",
            Intent::ListNodeNames => "ListNodeNames",
            Intent::GetResourceQuota => "GetResourceQuota",
            Intent::GetContainerPort => "GetContainerPort",
            Intent::GetReadinessProbePath => "GetReadinessProbePath",
            Intent::GetEnvironmentVariable => "GetEnvironmentVariable",
            Intent::GetVolumeMountPath => "GetVolumeMountPath",
            Intent::GetPodsAssociatedWithSecret => "GetPodsAssociatedWithSecret",
            Intent::GetServiceNamespace => "GetServiceNamespace",
            Intent::GetDeploymentStatus => "GetDeploymentStatus",
            Intent::GetServiceRoutePort => "GetServiceRoutePort",
            Intent::Unknown => "Unknown",
        }
    }

    /// Intents that resolve a component to a deployment via its label.
    pub fn is_component_scoped(self) -> bool {
        matches!(
            self,
            Intent::GetContainerPort
                | Intent::GetReadinessProbePath
                | Intent::GetEnvironmentVariable
                | Intent::GetVolumeMountPath
        )
    }

    /// Static schema entry for this intent.
    pub fn spec(self) -> IntentSpec {
        use NamespacePolicy::*;
        use ParamKey::*;

        let (description, required, optional, namespace): (
            &'static str,
            &'static [ParamKey],
            &'static [ParamKey],
            NamespacePolicy,
        ) = match self {
            Intent::ListNamespaces => ("List all namespaces in the cluster.", &[], &[], Ignored),
            Intent::ListPods => (
                "Count pods in a namespace, or across the whole cluster when namespace is \"all\".",
                &[],
                &[Namespace, Label],
                Defaulted,
            ),
            Intent::ListNodes => (
                "Count the nodes in the cluster and how many are ready.",
                &[],
                &[],
                Ignored,
            ),
            Intent::GetPodStatus => (
                "Report the phase and readiness of one pod.",
                &[PodName],
                &[Namespace],
                Defaulted,
            ),
            Intent::ListDeployments => (
                "List deployments in a namespace (or \"all\").",
                &[],
                &[Namespace, Label],
                Defaulted,
            ),
            Intent::ListServices => (
                "List services in a namespace (or \"all\").",
                &[],
                &[Namespace],
                Defaulted,
            ),
            Intent::GetPodLogs => (
                "Show the most recent log output of a pod.",
                &[PodName],
                &[Namespace],
                Defaulted,
            ),
            Intent::DescribeDeployment => (
                "Describe a deployment: replicas, images, selector, age.",
                &[DeploymentName],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::ListNodeNames => ("List the names of all nodes.", &[], &[], Ignored),
            Intent::GetResourceQuota => (
                "Show resource quotas (hard limits and usage) of a namespace.",
                &[],
                &[Namespace],
                Defaulted,
            ),
            Intent::GetContainerPort => (
                "Container port(s) exposed by a component.",
                &[Component],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::GetReadinessProbePath => (
                "HTTP readiness probe path of a component.",
                &[Component],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::GetEnvironmentVariable => (
                "Value of an environment variable of a component (or all variable names).",
                &[Component],
                &[EnvVar, Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::GetVolumeMountPath => (
                "Volume mount paths of a component.",
                &[Component],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::GetPodsAssociatedWithSecret => (
                "Pods that mount or reference a secret.",
                &[SecretName],
                &[],
                Ignored,
            ),
            Intent::GetServiceNamespace => (
                "Namespace(s) a service is deployed to.",
                &[ServiceName],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::GetDeploymentStatus => (
                "Latest status condition of a deployment.",
                &[DeploymentName],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::GetServiceRoutePort => (
                "Port a service routes traffic to.",
                &[ServiceName],
                &[Namespace],
                ClusterWideWhenAbsent,
            ),
            Intent::Unknown => ("The question could not be understood.", &[], &[], Ignored),
        };

        IntentSpec {
            intent: self,
            description,
            required,
            optional,
            namespace,
        }
    }
}

/// Required parameter keys of an intent.
pub fn required_params(intent: Intent) -> &'static [ParamKey] {
    intent.spec().required
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name is not a member of the closed intent set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent name: {0}")]
pub struct UnknownIntentName(pub String);

impl FromStr for Intent {
    type Err = UnknownIntentName;

    /// Exact, case-sensitive match against the closed set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| UnknownIntentName(s.to_string()))
    }
}

/// How an intent treats the `namespace` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespacePolicy {
    /// Absent namespace becomes [`DEFAULT_NAMESPACE`].
    Defaulted,
    /// Absent namespace means "search every namespace".
    ClusterWideWhenAbsent,
    /// Namespace is not consulted.
    Ignored,
}

/// Schema entry for one intent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IntentSpec {
    pub intent: Intent,
    pub description: &'static str,
    pub required: &'static [ParamKey],
    pub optional: &'static [ParamKey],
    pub namespace: NamespacePolicy,
}

// ── Parameters ──────────────────────────────────────────────────

/// Keys a [`ParameterBag`] may carry. Anything else is dropped at the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    Namespace,
    PodName,
    DeploymentName,
    ServiceName,
    Label,
    SecretName,
    Component,
    EnvVar,
}

impl ParamKey {
    pub const ALL: [ParamKey; 8] = [
        ParamKey::Namespace,
        ParamKey::PodName,
        ParamKey::DeploymentName,
        ParamKey::ServiceName,
        ParamKey::Label,
        ParamKey::SecretName,
        ParamKey::Component,
        ParamKey::EnvVar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamKey::Namespace => "namespace",
            ParamKey::PodName => "pod_name",
            ParamKey::DeploymentName => "deployment_name",
            ParamKey::ServiceName => "service_name",
            ParamKey::Label => "label",
            ParamKey::SecretName => "secret_name",
            ParamKey::Component => "component",
            ParamKey::EnvVar => "env_var",
        }
    }

    /// Human wording used in validation messages.
    pub fn describe(self) -> &'static str {
        match self {
            ParamKey::Namespace => "a namespace",
            ParamKey::PodName => "a pod name",
            ParamKey::DeploymentName => "a deployment name",
            ParamKey::ServiceName => "a service name",
            ParamKey::Label => "a label selector",
            ParamKey::SecretName => "a secret name",
            ParamKey::Component => "a component",
            ParamKey::EnvVar => "an environment variable name",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        ParamKey::ALL.into_iter().find(|key| key.as_str() == s)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter name → untrusted string value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag(BTreeMap<ParamKey, String>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: ParamKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: ParamKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn remove(&mut self, key: ParamKey) -> Option<String> {
        self.0.remove(&key)
    }

    pub fn get(&self, key: ParamKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Value of `key` if present and not blank.
    pub fn non_empty(&self, key: ParamKey) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Apply `f` to every value, dropping entries for which it returns `None`.
    pub fn filter_map_values(self, mut f: impl FnMut(ParamKey, String) -> Option<String>) -> Self {
        Self(
            self.0
                .into_iter()
                .filter_map(|(k, v)| f(k, v).map(|v| (k, v)))
                .collect(),
        )
    }
}

impl FromIterator<(ParamKey, String)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (ParamKey, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
