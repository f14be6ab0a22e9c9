//! Rule-based classifier: keyword and regex matching for common questions.
//!
//! Handles the well-known Harbor questions and the usual phrasings of every
//! intent at zero cost. Emits the same JSON proposal an LLM would, so its
//! output goes through the same adapter. Anything it cannot match is
//! `ClassifierError::NoMatch`, which lets `TieredClassifier` fall back.

use std::sync::LazyLock;

use async_trait::async_trait;
use kq_protocol::{ALL_NAMESPACES, Intent, ParamKey, ParameterBag};
use regex::Regex;

use super::{Classifier, ClassifierError, ClassifierReply, ClassifierResult};

static RE_HARBOR_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bharbor[- ](core|database|jobservice|portal|redis|registry|trivy)\b").unwrap()
});

static RE_COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(core|database|jobservice|portal|redis|registry|trivy)\b").unwrap()
});

static RE_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:component|for|of)\s+(?:the\s+)?['"]?([a-z0-9](?:[a-z0-9-]*[a-z0-9])?)"#)
        .unwrap()
});

static RE_NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bin\s+(?:the\s+)?['"]?([a-z0-9](?:[a-z0-9-]*[a-z0-9])?)['"]?\s+namespace\b|\bnamespace\s+['"]?([a-z0-9](?:[a-z0-9-]*[a-z0-9])?)"#,
    )
    .unwrap()
});

static RE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:label(?:ed|led)?|selector)\s+['"]?([a-z0-9./_-]+\s*!?==?\s*[a-z0-9._-]+)"#)
        .unwrap()
});

static POD_NAME: LazyLock<NamedObject> = LazyLock::new(|| NamedObject::new("pod"));
static DEPLOYMENT_NAME: LazyLock<NamedObject> = LazyLock::new(|| NamedObject::new("deployment"));
static SERVICE_NAME: LazyLock<NamedObject> = LazyLock::new(|| NamedObject::new("service"));
static SECRET_NAME: LazyLock<NamedObject> = LazyLock::new(|| NamedObject::new("secret"));

static RE_SECRET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([a-z0-9](?:[a-z0-9.-]*[a-z0-9])?-secret)\b").unwrap());

static RE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"`]([A-Za-z_][A-Za-z0-9_]*)['"`]"#).unwrap());

static RE_UPPER_SNAKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z0-9]*(?:_[A-Z0-9]+)+)\b").unwrap());

/// Name written after (`pod web-0`) or before (`web-0 pod`) a noun.
struct NamedObject {
    after: Regex,
    before: Regex,
}

impl NamedObject {
    fn new(noun: &str) -> Self {
        Self {
            after: Regex::new(&format!(
                r#"\b{noun}\s+(?:named\s+|called\s+)?['"]?([a-z0-9](?:[a-z0-9.-]*[a-z0-9])?)"#
            ))
            .unwrap(),
            before: Regex::new(&format!(
                r#"\b([a-z0-9](?:[a-z0-9.-]*[a-z0-9])?)['"]?\s+{noun}\b"#
            ))
            .unwrap(),
        }
    }

    /// First candidate that is not a stop word, preferring `noun NAME`.
    fn find(&self, lower: &str) -> Option<String> {
        first_name(&self.after, lower).or_else(|| first_name(&self.before, lower))
    }
}

/// Words that can sit next to a noun but are never object names.
const STOP_WORDS: &[&str] = &[
    "a", "all", "an", "and", "any", "are", "associated", "be", "by", "called", "cluster", "do",
    "does", "each", "every", "for", "from", "has", "have", "how", "in", "is", "it", "its", "log",
    "logs", "many", "mount", "my", "named", "namespace", "of", "on", "port", "reference", "route",
    "running", "status", "that", "the", "this", "to", "traffic", "use", "used", "uses", "using",
    "was", "what", "which", "will", "with",
];

const CLUSTER_WIDE_PHRASES: &[&str] = &[
    "all namespaces",
    "every namespace",
    "each namespace",
    "entire cluster",
    "whole cluster",
    "in the cluster",
    "across the cluster",
    "cluster-wide",
    "cluster wide",
];

/// Pattern-matching classifier for well-known question shapes.
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RuleBasedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for RuleBasedClassifier {
    async fn classify(&self, text: &str) -> ClassifierResult<ClassifierReply> {
        let (intent, params) = match_rules(text).ok_or(ClassifierError::NoMatch)?;
        let proposal = serde_json::json!({ "intent": intent, "parameters": params });
        Ok(ClassifierReply::new(proposal.to_string(), "local"))
    }

    fn tier_name(&self) -> &str {
        "local"
    }
}

/// Core pattern matching logic.
pub fn match_rules(text: &str) -> Option<(Intent, ParameterBag)> {
    let lower = text.to_lowercase();
    let lower = lower.trim();

    if let Some(hit) = match_well_known(lower) {
        return Some(hit);
    }

    // ── Secrets ─────────────────────────────────────────────────

    if lower.contains("secret") && lower.contains("pod") {
        let secret = RE_SECRET_SUFFIX
            .captures(lower)
            .map(|c| c[1].to_string())
            .or_else(|| SECRET_NAME.find(lower));
        return Some((
            Intent::GetPodsAssociatedWithSecret,
            bag([(ParamKey::SecretName, secret)]),
        ));
    }

    // ── Pod logs ────────────────────────────────────────────────

    if contains_word(lower, "logs") || contains_word(lower, "log") {
        return Some((
            Intent::GetPodLogs,
            bag([
                (ParamKey::PodName, find_pod(lower)),
                (ParamKey::Namespace, find_namespace(lower)),
            ]),
        ));
    }

    // ── Component-scoped lookups ────────────────────────────────

    if lower.contains("readiness") {
        return Some(component_intent(Intent::GetReadinessProbePath, lower));
    }

    if lower.contains("environment variable") || lower.contains("env var") {
        let (intent, mut params) = component_intent(Intent::GetEnvironmentVariable, lower);
        if let Some(var) = find_env_var(text) {
            params.insert(ParamKey::EnvVar, var);
        }
        return Some((intent, params));
    }

    if lower.contains("mount") {
        return Some(component_intent(Intent::GetVolumeMountPath, lower));
    }

    if lower.contains("container port") {
        return Some(component_intent(Intent::GetContainerPort, lower));
    }

    // ── Services ────────────────────────────────────────────────

    if lower.contains("service")
        && (lower.contains("route") || lower.contains("target port") || lower.contains("forward"))
    {
        return Some((
            Intent::GetServiceRoutePort,
            bag([(ParamKey::ServiceName, SERVICE_NAME.find(lower))]),
        ));
    }

    if (contains_word(lower, "port") || contains_word(lower, "ports"))
        && find_component(lower).is_some()
    {
        return Some(component_intent(Intent::GetContainerPort, lower));
    }

    if (lower.contains("which namespace") || lower.contains("what namespace"))
        && lower.contains("service")
    {
        return Some((
            Intent::GetServiceNamespace,
            bag([(ParamKey::ServiceName, SERVICE_NAME.find(lower))]),
        ));
    }

    // ── Quotas ──────────────────────────────────────────────────

    if lower.contains("quota") {
        return Some((
            Intent::GetResourceQuota,
            bag([(ParamKey::Namespace, find_namespace(lower))]),
        ));
    }

    // ── Status and description ──────────────────────────────────

    if lower.contains("describe") && lower.contains("deployment") {
        return Some((
            Intent::DescribeDeployment,
            bag([
                (ParamKey::DeploymentName, DEPLOYMENT_NAME.find(lower)),
                (ParamKey::Namespace, find_namespace(lower)),
            ]),
        ));
    }

    if lower.contains("status") {
        if contains_word(lower, "pod")
            && let Some(pod) = find_pod(lower)
        {
            return Some((
                Intent::GetPodStatus,
                bag([
                    (ParamKey::PodName, Some(pod)),
                    (ParamKey::Namespace, find_namespace(lower)),
                ]),
            ));
        }
        if let Some(deployment) = DEPLOYMENT_NAME.find(lower) {
            return Some((
                Intent::GetDeploymentStatus,
                bag([
                    (ParamKey::DeploymentName, Some(deployment)),
                    (ParamKey::Namespace, find_namespace(lower)),
                ]),
            ));
        }
    }

    // ── Listings ────────────────────────────────────────────────

    if lower.contains("node") {
        let intent = if lower.contains("name") {
            Intent::ListNodeNames
        } else {
            Intent::ListNodes
        };
        return Some((intent, ParameterBag::new()));
    }

    if lower.contains("namespaces")
        && !lower.contains("pod")
        && !lower.contains("deployment")
        && !lower.contains("service")
    {
        return Some((Intent::ListNamespaces, ParameterBag::new()));
    }

    if lower.contains("deployment") {
        return Some((
            Intent::ListDeployments,
            bag([
                (ParamKey::Namespace, find_namespace(lower)),
                (ParamKey::Label, find_label(lower)),
            ]),
        ));
    }

    if lower.contains("service") {
        return Some((
            Intent::ListServices,
            bag([(ParamKey::Namespace, find_namespace(lower))]),
        ));
    }

    if lower.contains("pod") {
        return Some((
            Intent::ListPods,
            bag([
                (ParamKey::Namespace, find_namespace(lower)),
                (ParamKey::Label, find_label(lower)),
            ]),
        ));
    }

    None
}

/// The fixed set of Harbor questions the service was first built around.
fn match_well_known(lower: &str) -> Option<(Intent, ParameterBag)> {
    let has = |a: &str, b: &str| lower.contains(a) && lower.contains(b);

    let hit = if has("which namespace", "harbor service") {
        (
            Intent::GetServiceNamespace,
            ParameterBag::new().with(ParamKey::ServiceName, "harbor"),
        )
    } else if has("how many pods", "cluster") {
        (
            Intent::ListPods,
            ParameterBag::new().with(ParamKey::Namespace, ALL_NAMESPACES),
        )
    } else if has("container port", "harbor-core") {
        (
            Intent::GetContainerPort,
            ParameterBag::new().with(ParamKey::Component, "harbor-core"),
        )
    } else if has("status of", "harbor registry") {
        (
            Intent::GetDeploymentStatus,
            ParameterBag::new().with(ParamKey::DeploymentName, "harbor-registry"),
        )
    } else if has("harbor redis service", "route traffic to") {
        (
            Intent::GetServiceRoutePort,
            ParameterBag::new().with(ParamKey::ServiceName, "harbor-redis"),
        )
    } else if has("readiness probe path", "harbor core") {
        (
            Intent::GetReadinessProbePath,
            ParameterBag::new().with(ParamKey::Component, "harbor-core"),
        )
    } else if has("pods are associated with", "harbor database secret") {
        (
            Intent::GetPodsAssociatedWithSecret,
            ParameterBag::new().with(ParamKey::SecretName, "harbor-database-secret"),
        )
    } else {
        return None;
    };
    Some(hit)
}

fn component_intent(intent: Intent, lower: &str) -> (Intent, ParameterBag) {
    (
        intent,
        bag([
            (ParamKey::Component, find_component(lower)),
            (ParamKey::Namespace, find_namespace(lower)),
        ]),
    )
}

fn bag<const N: usize>(entries: [(ParamKey, Option<String>); N]) -> ParameterBag {
    entries
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
}

fn contains_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w == word)
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// First non-stop-word capture of a name pattern.
fn first_name(re: &Regex, lower: &str) -> Option<String> {
    re.captures_iter(lower)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str())
        .find(|name| !is_stop_word(name))
        .map(str::to_string)
}

fn find_pod(lower: &str) -> Option<String> {
    POD_NAME.find(lower)
}

/// Component name: vocabulary words first, then whatever follows
/// "for"/"of"/"component" so unknown names still reach validation.
fn find_component(lower: &str) -> Option<String> {
    if let Some(c) = RE_HARBOR_COMPONENT.captures(lower) {
        return Some(format!("harbor-{}", &c[1]));
    }
    if let Some(c) = RE_COMPONENT.captures(lower) {
        return Some(c[1].to_string());
    }
    RE_TARGET
        .captures_iter(lower)
        .map(|c| c[1].to_string())
        .find(|name| !is_stop_word(name) && !is_field_word(name))
}

fn is_field_word(word: &str) -> bool {
    matches!(
        word,
        "container" | "readiness" | "probe" | "path" | "paths" | "environment" | "variable"
            | "variables" | "env" | "volume" | "volumes" | "ports" | "mounts"
    )
}

fn find_namespace(lower: &str) -> Option<String> {
    if CLUSTER_WIDE_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(ALL_NAMESPACES.to_string());
    }
    first_name(&RE_NAMESPACE, lower)
}

fn find_label(lower: &str) -> Option<String> {
    RE_LABEL
        .captures(lower)
        .map(|c| c[1].split_whitespace().collect::<String>())
}

/// Variable names keep their case, so this looks at the original text.
fn find_env_var(text: &str) -> Option<String> {
    RE_QUOTED
        .captures(text)
        .or_else(|| RE_UPPER_SNAKE.captures(text))
        .map(|c| c[1].to_string())
}
