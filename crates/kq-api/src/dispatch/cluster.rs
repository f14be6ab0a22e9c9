//! Cluster-level handlers: namespaces, nodes, resource quotas.

use kq_cluster::{ClusterReader, ResourceQuota};
use kq_protocol::ParameterBag;

use super::{DispatchResult, Scope, list_scope, there_are};

pub async fn list_namespaces(reader: &dyn ClusterReader) -> DispatchResult {
    let namespaces = reader.list_namespaces().await?;
    let names: Vec<&str> = namespaces.iter().map(|n| n.metadata.name.as_str()).collect();
    let head = there_are(names.len(), "namespace", "namespaces");
    Ok(if names.is_empty() {
        format!("{head} in the cluster.")
    } else {
        format!("{head} in the cluster: {}.", names.join(", "))
    })
}

pub async fn list_nodes(reader: &dyn ClusterReader) -> DispatchResult {
    let nodes = reader.list_nodes().await?;
    let ready = nodes.iter().filter(|n| n.is_ready()).count();
    let head = there_are(nodes.len(), "node", "nodes");
    if nodes.is_empty() {
        return Ok(format!("{head} in the cluster."));
    }
    let verb = if ready == 1 { "is" } else { "are" };
    Ok(format!("{head} in the cluster, {ready} of which {verb} ready."))
}

pub async fn list_node_names(reader: &dyn ClusterReader) -> DispatchResult {
    let nodes = reader.list_nodes().await?;
    if nodes.is_empty() {
        return Ok("There are no nodes in the cluster.".to_string());
    }
    let names: Vec<&str> = nodes.iter().map(|n| n.metadata.name.as_str()).collect();
    Ok(format!("The nodes in the cluster are: {}.", names.join(", ")))
}

pub async fn resource_quota(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let scope = list_scope(params);
    let quotas = match scope {
        Scope::Namespace(ns) => reader.list_resource_quotas(ns).await?,
        Scope::All => {
            let mut all = Vec::new();
            for ns in reader.list_namespaces().await? {
                all.extend(reader.list_resource_quotas(&ns.metadata.name).await?);
            }
            all
        }
    };

    if quotas.is_empty() {
        return Ok(format!("There are no resource quotas in {}.", scope.describe()));
    }
    Ok(quotas.iter().map(describe_quota).collect::<Vec<_>>().join(" "))
}

fn describe_quota(quota: &ResourceQuota) -> String {
    let hard = if quota.status.hard.is_empty() {
        &quota.spec.hard
    } else {
        &quota.status.hard
    };
    let limits: Vec<String> = hard
        .iter()
        .map(|(resource, limit)| {
            let used = quota.status.used.get(resource).map_or("0", String::as_str);
            format!("{resource} {used} of {limit} used")
        })
        .collect();

    let name = &quota.metadata.name;
    let ns = quota.metadata.namespace();
    if limits.is_empty() {
        format!("Resource quota '{name}' in namespace '{ns}' sets no limits.")
    } else {
        format!(
            "Resource quota '{name}' in namespace '{ns}': {}.",
            limits.join(", ")
        )
    }
}
