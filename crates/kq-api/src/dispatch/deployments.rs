//! Deployment handlers.

use kq_cluster::{ClusterReader, Deployment};
use kq_protocol::{ParamKey, ParameterBag, ResourceKind};

use super::{DispatchError, DispatchResult, Scope, list_scope, lookup_scope, required, there_are};

pub async fn list_deployments(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let scope = list_scope(params);
    let deployments = match scope {
        Scope::Namespace(ns) => reader.list_deployments(ns, None).await?,
        Scope::All => reader.list_all_deployments(None).await?,
    };

    let head = there_are(deployments.len(), "deployment", "deployments");
    if deployments.is_empty() {
        return Ok(format!("{head} in {}.", scope.describe()));
    }
    let names: Vec<String> = deployments
        .iter()
        .map(|d| match scope {
            Scope::All => format!("{} ({})", d.name(), d.namespace()),
            Scope::Namespace(_) => d.name().to_string(),
        })
        .collect();
    Ok(format!("{head} in {}: {}.", scope.describe(), names.join(", ")))
}

pub async fn deployment_status(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let deployment = find_deployment(reader, params).await?;
    let name = deployment.name();
    let (ready, desired) = replica_counts(&deployment);

    let Some(condition) = deployment.latest_condition() else {
        return Ok(format!(
            "Deployment '{name}' has not reported any status conditions yet ({ready}/{desired} replicas ready)."
        ));
    };

    let mut answer = format!(
        "The status of deployment '{name}' is '{}' ({ready}/{desired} replicas ready).",
        condition.type_
    );
    if condition.status != "True" {
        let detail = condition
            .message
            .as_deref()
            .or(condition.reason.as_deref())
            .unwrap_or("no reason given");
        answer.push_str(&format!(
            " The condition is currently {}: {detail}.",
            condition.status
        ));
    }
    Ok(answer)
}

pub async fn describe_deployment(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let d = find_deployment(reader, params).await?;
    let (ready, desired) = replica_counts(&d);
    let updated = d.status.updated_replicas.unwrap_or(0);
    let available = d.status.available_replicas.unwrap_or(0);

    let images: Vec<&str> = d
        .spec
        .template
        .spec
        .containers
        .iter()
        .filter_map(|c| c.image.as_deref())
        .collect();
    let selector: Vec<String> = d
        .spec
        .selector
        .match_labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    let created = d
        .metadata
        .creation_timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(format!(
        "Deployment '{}' in namespace '{}': {ready}/{desired} replicas ready, {updated} updated, \
         {available} available. Images: {}. Selector: {}. Created: {created}.",
        d.name(),
        d.namespace(),
        join_or_none(&images),
        join_or_none(&selector),
    ))
}

/// Named deployment in the given namespace, or the first match cluster-wide.
pub(crate) async fn find_deployment(
    reader: &dyn ClusterReader,
    params: &ParameterBag,
) -> Result<Deployment, DispatchError> {
    let name = required(params, ParamKey::DeploymentName)?;
    match lookup_scope(params) {
        Some(ns) => Ok(reader.get_deployment(ns, name).await?),
        None => reader
            .list_all_deployments(None)
            .await?
            .into_iter()
            .find(|d| d.name() == name)
            .ok_or_else(|| DispatchError::NotFound {
                kind: ResourceKind::Deployment,
                name: name.to_string(),
            }),
    }
}

/// (ready, desired). Desired falls back to the API default of one replica.
fn replica_counts(d: &Deployment) -> (i32, i32) {
    (
        d.status.ready_replicas.unwrap_or(0),
        d.spec.replicas.unwrap_or(1),
    )
}

fn join_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
