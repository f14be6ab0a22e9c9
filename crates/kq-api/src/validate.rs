//! Parameter validation and normalization.
//!
//! `normalize` repairs what a classifier typically gets wrong (whitespace,
//! case, vendor-prefixed component names, namespace sentinels, a service
//! name filed under `deployment_name`). `validate` then checks the
//! schema's required keys and the component vocabulary. Both are pure.

use std::sync::LazyLock;

use kq_protocol::{
    ALL_NAMESPACES, DEFAULT_NAMESPACE, Intent, NamespacePolicy, ParamKey, ParameterBag,
    is_known_component, normalize_component, vocabulary_list,
};
use regex::Regex;

/// Spellings that select the cluster-wide path.
const ALL_NAMESPACE_SENTINELS: &[&str] = &["all", "*", "all namespaces", "all-namespaces"];

/// DNS-1123 label: namespaces.
static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").unwrap());

/// DNS-1123 subdomain: pods, deployments, services, secrets.
static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap()
});
const MAX_SUBDOMAIN_LEN: usize = 253;

/// Why parameters were rejected. `Display` is the user-facing answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please specify {} to answer that question.", .key.describe())]
    MissingParam { intent: Intent, key: ParamKey },

    #[error("Please specify a component. Valid components are: {}.", vocabulary_list())]
    MissingComponent { intent: Intent },

    #[error("Unknown component '{given}'. Valid components are: {}.", vocabulary_list())]
    UnknownComponent { given: String },

    #[error("'{given}' is not valid as {}.", .key.describe())]
    InvalidName { key: ParamKey, given: String },
}

/// Check `params` against the schema of `intent`.
///
/// The component check normalizes internally, so it gives the same verdict
/// whether or not `normalize` ran first.
pub fn validate(intent: Intent, params: &ParameterBag) -> Result<(), ValidationError> {
    for &key in intent.spec().required {
        let Some(value) = params.non_empty(key) else {
            return Err(match key {
                ParamKey::Component => ValidationError::MissingComponent { intent },
                _ => ValidationError::MissingParam { intent, key },
            });
        };
        if key == ParamKey::Component && !is_known_component(&normalize_component(value)) {
            return Err(ValidationError::UnknownComponent {
                given: value.trim().to_string(),
            });
        }
    }

    let spec = intent.spec();
    for &key in spec.required.iter().chain(spec.optional) {
        if let Some(value) = params.non_empty(key)
            && !is_valid_name(key, value)
        {
            return Err(ValidationError::InvalidName {
                key,
                given: value.trim().to_string(),
            });
        }
    }
    Ok(())
}

/// Object names must be DNS-1123 names; other keys are not checked here.
fn is_valid_name(key: ParamKey, value: &str) -> bool {
    match key {
        ParamKey::Namespace => {
            let ns = normalize_namespace(value.trim());
            ns == ALL_NAMESPACES || DNS_LABEL.is_match(&ns)
        }
        ParamKey::PodName
        | ParamKey::DeploymentName
        | ParamKey::ServiceName
        | ParamKey::SecretName => {
            let name = value.trim().to_ascii_lowercase();
            name.len() <= MAX_SUBDOMAIN_LEN && DNS_SUBDOMAIN.is_match(&name)
        }
        ParamKey::Label | ParamKey::EnvVar | ParamKey::Component => true,
    }
}

/// Repair `params` for `intent`. Idempotent.
pub fn normalize(intent: Intent, params: ParameterBag) -> ParameterBag {
    let mut params = params.filter_map_values(|key, value| {
        let value = value.trim();
        let value = match key {
            ParamKey::Component => normalize_component(value),
            ParamKey::Namespace => normalize_namespace(value),
            ParamKey::PodName
            | ParamKey::DeploymentName
            | ParamKey::ServiceName
            | ParamKey::SecretName => value.to_ascii_lowercase(),
            ParamKey::Label | ParamKey::EnvVar => value.to_string(),
        };
        // A bare vendor prefix normalizes to nothing.
        (!value.is_empty()).then_some(value)
    });

    alias_name(intent, &mut params);

    match intent.spec().namespace {
        NamespacePolicy::Defaulted => {
            if params.get(ParamKey::Namespace).is_none() {
                params.insert(ParamKey::Namespace, DEFAULT_NAMESPACE);
            }
        }
        NamespacePolicy::ClusterWideWhenAbsent => {
            if params.get(ParamKey::Namespace) == Some(ALL_NAMESPACES) {
                params.remove(ParamKey::Namespace);
            }
        }
        NamespacePolicy::Ignored => {}
    }

    params
}

fn normalize_namespace(value: &str) -> String {
    let lower = value.to_ascii_lowercase();
    if ALL_NAMESPACE_SENTINELS.contains(&lower.as_str()) {
        ALL_NAMESPACES.to_string()
    } else {
        lower
    }
}

/// Service intents accept a name filed as `deployment_name` and vice versa.
fn alias_name(intent: Intent, params: &mut ParameterBag) {
    let (wanted, alias) = match intent {
        Intent::GetServiceNamespace | Intent::GetServiceRoutePort => {
            (ParamKey::ServiceName, ParamKey::DeploymentName)
        }
        Intent::DescribeDeployment | Intent::GetDeploymentStatus => {
            (ParamKey::DeploymentName, ParamKey::ServiceName)
        }
        _ => return,
    };
    if params.get(wanted).is_none()
        && let Some(value) = params.remove(alias)
    {
        params.insert(wanted, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kq_protocol::COMPONENT_VOCABULARY;

    fn bag(pairs: &[(ParamKey, &str)]) -> ParameterBag {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    // ── validate ─────────────────────────────────────────────────

    #[test]
    fn component_intents_require_known_component() {
        for intent in Intent::ALL.into_iter().filter(|i| i.is_component_scoped()) {
            let ok = bag(&[(ParamKey::Component, "core")]);
            assert_eq!(validate(intent, &ok), Ok(()));

            let err = validate(intent, &bag(&[(ParamKey::Component, "frobnicator")])).unwrap_err();
            let message = err.to_string();
            for component in COMPONENT_VOCABULARY {
                assert!(message.contains(component), "{message} lacks {component}");
            }

            let missing = validate(intent, &ParameterBag::new()).unwrap_err();
            assert_eq!(missing, ValidationError::MissingComponent { intent });
            assert!(missing.to_string().contains("core, database, jobservice"));
        }
    }

    #[test]
    fn unknown_component_message_lists_full_vocabulary() {
        let err = validate(
            Intent::GetContainerPort,
            &bag(&[(ParamKey::Component, "frobnicator")]),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown component 'frobnicator'. Valid components are: \
             core, database, jobservice, portal, redis, registry, trivy."
        );
    }

    #[test]
    fn prefixed_component_validates_without_normalize() {
        let params = bag(&[(ParamKey::Component, "Harbor-Core")]);
        assert_eq!(validate(Intent::GetReadinessProbePath, &params), Ok(()));
    }

    #[test]
    fn named_intents_require_their_name() {
        let cases = [
            (Intent::GetPodStatus, ParamKey::PodName),
            (Intent::GetPodLogs, ParamKey::PodName),
            (Intent::GetPodsAssociatedWithSecret, ParamKey::SecretName),
            (Intent::GetServiceNamespace, ParamKey::ServiceName),
            (Intent::GetServiceRoutePort, ParamKey::ServiceName),
            (Intent::DescribeDeployment, ParamKey::DeploymentName),
            (Intent::GetDeploymentStatus, ParamKey::DeploymentName),
        ];
        for (intent, key) in cases {
            let blank = bag(&[(key, "   ")]);
            assert_eq!(
                validate(intent, &blank),
                Err(ValidationError::MissingParam { intent, key })
            );
            assert_eq!(validate(intent, &bag(&[(key, "x")])), Ok(()));
        }
    }

    #[test]
    fn missing_param_message_names_the_key() {
        let err = validate(Intent::GetPodLogs, &ParameterBag::new()).unwrap_err();
        assert_eq!(err.to_string(), "Please specify a pod name to answer that question.");
    }

    #[test]
    fn object_names_must_be_dns_names() {
        let rejected = [
            (Intent::GetPodStatus, ParamKey::PodName, ".."),
            (Intent::GetPodLogs, ParamKey::PodName, "."),
            (Intent::GetPodLogs, ParamKey::PodName, "-web"),
            (Intent::GetDeploymentStatus, ParamKey::DeploymentName, "../secrets"),
            (Intent::GetServiceRoutePort, ParamKey::ServiceName, "harbor core"),
            (Intent::GetPodsAssociatedWithSecret, ParamKey::SecretName, "a..b"),
        ];
        for (intent, key, given) in rejected {
            assert_eq!(
                validate(intent, &bag(&[(key, given)])),
                Err(ValidationError::InvalidName {
                    key,
                    given: given.to_string()
                }),
                "{intent} accepted {given:?}"
            );
        }

        for (intent, key, given) in [
            (Intent::GetPodStatus, ParamKey::PodName, "harbor-core-0"),
            (Intent::GetServiceRoutePort, ParamKey::ServiceName, "Harbor-Core"),
            (Intent::GetPodsAssociatedWithSecret, ParamKey::SecretName, "tls.harbor"),
        ] {
            assert_eq!(validate(intent, &bag(&[(key, given)])), Ok(()));
        }
    }

    #[test]
    fn namespace_must_be_a_dns_label_or_sentinel() {
        for bad in ["..", ".", "kube.system", "a/b"] {
            let err = validate(Intent::ListPods, &bag(&[(ParamKey::Namespace, bad)])).unwrap_err();
            assert_eq!(err.to_string(), format!("'{bad}' is not valid as a namespace."));
        }
        for ok in ["harbor", "kube-system", "ALL", "*", "all namespaces"] {
            assert_eq!(
                validate(Intent::ListPods, &bag(&[(ParamKey::Namespace, ok)])),
                Ok(()),
                "{ok}"
            );
        }
    }

    #[test]
    fn unparameterized_intents_always_pass() {
        for intent in [
            Intent::ListNamespaces,
            Intent::ListPods,
            Intent::ListNodes,
            Intent::ListNodeNames,
            Intent::ListDeployments,
            Intent::ListServices,
            Intent::GetResourceQuota,
            Intent::Unknown,
        ] {
            assert_eq!(validate(intent, &ParameterBag::new()), Ok(()));
        }
    }

    // ── normalize ────────────────────────────────────────────────

    #[test]
    fn strips_vendor_prefix_and_case() {
        let params = normalize(
            Intent::GetContainerPort,
            bag(&[(ParamKey::Component, " Harbor-Core ")]),
        );
        assert_eq!(params.get(ParamKey::Component), Some("core"));
    }

    #[test]
    fn defaults_namespace_when_absent() {
        let params = normalize(Intent::ListPods, ParameterBag::new());
        assert_eq!(params.get(ParamKey::Namespace), Some(DEFAULT_NAMESPACE));

        let params = normalize(Intent::GetPodStatus, bag(&[(ParamKey::Namespace, "  ")]));
        assert_eq!(params.get(ParamKey::Namespace), Some(DEFAULT_NAMESPACE));
    }

    #[test]
    fn canonicalizes_all_namespace_sentinel() {
        for raw in ["all", "ALL", "*", " All "] {
            let params = normalize(Intent::ListPods, bag(&[(ParamKey::Namespace, raw)]));
            assert_eq!(params.get(ParamKey::Namespace), Some(ALL_NAMESPACES));
        }
    }

    #[test]
    fn cluster_wide_intents_drop_sentinel_and_keep_absence() {
        let params = normalize(
            Intent::GetDeploymentStatus,
            bag(&[
                (ParamKey::DeploymentName, "harbor-registry"),
                (ParamKey::Namespace, "*"),
            ]),
        );
        assert!(params.get(ParamKey::Namespace).is_none());

        let params = normalize(Intent::GetContainerPort, bag(&[(ParamKey::Component, "core")]));
        assert!(params.get(ParamKey::Namespace).is_none());
    }

    #[test]
    fn service_name_alias() {
        let params = normalize(
            Intent::GetServiceNamespace,
            bag(&[(ParamKey::DeploymentName, "harbor")]),
        );
        assert_eq!(params.get(ParamKey::ServiceName), Some("harbor"));
        assert!(params.get(ParamKey::DeploymentName).is_none());
        assert_eq!(validate(Intent::GetServiceNamespace, &params), Ok(()));
    }

    #[test]
    fn env_var_keeps_case() {
        let params = normalize(
            Intent::GetEnvironmentVariable,
            bag(&[(ParamKey::Component, "core"), (ParamKey::EnvVar, " CORE_URL ")]),
        );
        assert_eq!(params.get(ParamKey::EnvVar), Some("CORE_URL"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let inputs = [
            bag(&[(ParamKey::Component, "harbor-harbor-Core")]),
            bag(&[(ParamKey::Component, "harbor-")]),
            bag(&[(ParamKey::Namespace, " * "), (ParamKey::Label, "app=web")]),
            bag(&[(ParamKey::DeploymentName, "Harbor"), (ParamKey::PodName, " ")]),
            bag(&[(ParamKey::ServiceName, "Harbor-Redis"), (ParamKey::Namespace, "ALL")]),
            ParameterBag::new(),
        ];
        for intent in Intent::ALL {
            for params in &inputs {
                let once = normalize(intent, params.clone());
                let twice = normalize(intent, once.clone());
                assert_eq!(once, twice, "{intent} with {params:?}");
            }
        }
    }

    #[test]
    fn normalized_component_is_known_or_validation_fails() {
        for raw in ["core", "harbor-core", "HARBOR-REDIS", "frobnicator", "harbor-", "harbor-x"] {
            let params = normalize(
                Intent::GetVolumeMountPath,
                bag(&[(ParamKey::Component, raw)]),
            );
            match params.get(ParamKey::Component) {
                Some(c) if is_known_component(c) => {
                    assert_eq!(validate(Intent::GetVolumeMountPath, &params), Ok(()));
                }
                _ => assert!(validate(Intent::GetVolumeMountPath, &params).is_err()),
            }
        }
    }
}
