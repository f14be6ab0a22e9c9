//! Pod handlers: counts, status, logs.

use kq_cluster::{ClusterReader, Pod, matches_selector};
use kq_protocol::{ParamKey, ParameterBag, ResourceKind};

use super::{DispatchError, DispatchResult, Scope, list_scope, required, there_are};

/// Maximum characters of log text returned in an answer.
pub const MAX_LOG_CHARS: usize = 1000;

/// Lines requested from the end of the log.
pub const LOG_TAIL_LINES: u32 = 100;

pub async fn list_pods(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let label = params.non_empty(ParamKey::Label);
    let scope = list_scope(params);
    let count = match scope {
        Scope::Namespace(ns) => reader.list_pods(ns, label).await?.len(),
        Scope::All => reader
            .list_all_pods()
            .await?
            .iter()
            .filter(|p| label.is_none_or(|sel| matches_selector(&p.metadata.labels, sel)))
            .count(),
    };

    let head = there_are(count, "pod", "pods");
    Ok(match label {
        Some(sel) => format!("{head} matching '{sel}' in {}.", scope.describe()),
        None => format!("{head} in {}.", scope.describe()),
    })
}

pub async fn pod_status(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let pod = find_pod(reader, params).await?;

    let phase = pod.status.phase.as_deref().unwrap_or("Unknown");
    let total = pod.spec.containers.len();
    let ready = pod
        .status
        .container_statuses
        .iter()
        .filter(|s| s.ready)
        .count();
    let restarts: i32 = pod
        .status
        .container_statuses
        .iter()
        .map(|s| s.restart_count)
        .sum();
    let plural = if restarts == 1 { "" } else { "s" };

    Ok(format!(
        "Pod '{}' in namespace '{}' is {phase} with {ready}/{total} containers ready and {restarts} restart{plural}.",
        pod.name(),
        pod.namespace()
    ))
}

pub async fn pod_logs(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let pod = find_pod(reader, params).await?;
    let logs = reader
        .pod_logs(pod.namespace(), pod.name(), Some(LOG_TAIL_LINES))
        .await?;

    if logs.trim().is_empty() {
        return Ok(format!("Pod '{}' has not written any logs.", pod.name()));
    }
    Ok(format!(
        "Recent logs for pod '{}':\n{}",
        pod.name(),
        truncate_logs(logs.trim_end())
    ))
}

/// Cut `text` to [`MAX_LOG_CHARS`] characters, marking the cut with `...`.
pub fn truncate_logs(text: &str) -> String {
    match text.char_indices().nth(MAX_LOG_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Named pod in the requested namespace, or the first match anywhere for
/// the `all` sentinel.
async fn find_pod(reader: &dyn ClusterReader, params: &ParameterBag) -> Result<Pod, DispatchError> {
    let name = required(params, ParamKey::PodName)?;

    match list_scope(params) {
        Scope::Namespace(ns) => Ok(reader.get_pod(ns, name).await?),
        Scope::All => reader
            .list_all_pods()
            .await?
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| DispatchError::NotFound {
                kind: ResourceKind::Pod,
                name: name.to_string(),
            }),
    }
}
