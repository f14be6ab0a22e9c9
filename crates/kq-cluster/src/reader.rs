//! Read-only cluster access abstraction.
//!
//! `ClusterReader` is the only way the dispatcher touches the cluster. Two
//! impls:
//! - `HttpClusterReader` - talks to the API server's REST endpoints
//! - `MockClusterReader` - seeded in-memory data (in `mock.rs`)

use async_trait::async_trait;
use kq_protocol::COMPONENT_LABEL;

use crate::error::ClusterResult;
use crate::types::{Deployment, Namespace, Node, Pod, ResourceQuota, Service};

/// Typed read operations against the orchestrator.
///
/// Every method fails with `ClusterError::NotFound` when the addressed
/// object does not exist and with another variant for any other failure.
/// List operations on an empty scope return an empty `Vec`, not `NotFound`.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>>;

    /// Pods in one namespace, optionally filtered by a label selector.
    async fn list_pods(&self, namespace: &str, label_selector: Option<&str>)
    -> ClusterResult<Vec<Pod>>;

    /// Pods in every namespace.
    async fn list_all_pods(&self) -> ClusterResult<Vec<Pod>>;

    async fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod>;

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Deployment>>;

    async fn list_all_deployments(
        &self,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Deployment>>;

    async fn get_deployment(&self, namespace: &str, name: &str) -> ClusterResult<Deployment>;

    async fn list_services(&self, namespace: &str) -> ClusterResult<Vec<Service>>;

    async fn list_all_services(&self) -> ClusterResult<Vec<Service>>;

    async fn list_nodes(&self) -> ClusterResult<Vec<Node>>;

    async fn list_resource_quotas(&self, namespace: &str) -> ClusterResult<Vec<ResourceQuota>>;

    /// Log text of a pod's default container, optionally only the last lines.
    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        tail_lines: Option<u32>,
    ) -> ClusterResult<String>;

    /// Deployments labeled `component=<component>`, in one namespace or all.
    async fn find_component_deployments(
        &self,
        namespace: Option<&str>,
        component: &str,
    ) -> ClusterResult<Vec<Deployment>> {
        let selector = format!("{COMPONENT_LABEL}={component}");
        match namespace {
            Some(ns) => self.list_deployments(ns, Some(&selector)).await,
            None => self.list_all_deployments(Some(&selector)).await,
        }
    }
}
