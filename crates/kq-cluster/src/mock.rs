//! Mock cluster reader for testing.
//!
//! Serves seeded objects, records every call by operation name, and can be
//! told to fail (or stall) specific operations. All pipeline tests use this
//! instead of a live API server.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use kq_protocol::{COMPONENT_LABEL, ResourceKind};

use crate::error::{ClusterError, ClusterResult};
use crate::reader::ClusterReader;
use crate::types::{
    Container, Deployment, IntOrString, Namespace, Node, Pod, ResourceQuota, Service, Volume,
    matches_selector,
};

/// Seedable in-memory cluster.
#[derive(Default)]
pub struct MockClusterReader {
    namespaces: Vec<Namespace>,
    pods: Vec<Pod>,
    deployments: Vec<Deployment>,
    services: Vec<Service>,
    nodes: Vec<Node>,
    quotas: Vec<ResourceQuota>,
    logs: HashMap<(String, String), String>,
    /// Operation name → error returned instead of data.
    failures: HashMap<&'static str, ClusterError>,
    /// Artificial latency applied to every call.
    delay: Option<Duration>,
    /// Operation names in call order (for test assertions).
    calls: Mutex<Vec<String>>,
}

impl MockClusterReader {
    /// Create an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_namespace(&mut self, name: &str) {
        self.namespaces.push(Namespace::new(name));
    }

    /// Add a pod, registering its namespace if unseen.
    pub fn add_pod(&mut self, pod: Pod) {
        self.ensure_namespace(pod.namespace().to_string());
        self.pods.push(pod);
    }

    pub fn add_deployment(&mut self, deployment: Deployment) {
        self.ensure_namespace(deployment.namespace().to_string());
        self.deployments.push(deployment);
    }

    pub fn add_service(&mut self, service: Service) {
        self.ensure_namespace(service.namespace().to_string());
        self.services.push(service);
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn add_quota(&mut self, quota: ResourceQuota) {
        self.quotas.push(quota);
    }

    pub fn set_logs(&mut self, namespace: &str, pod: &str, text: impl Into<String>) {
        self.logs
            .insert((namespace.to_string(), pod.to_string()), text.into());
    }

    /// Make `operation` (a `ClusterReader` method name) return `error`.
    pub fn fail_on(&mut self, operation: &'static str, error: ClusterError) {
        self.failures.insert(operation, error);
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Operation names called so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn ensure_namespace(&mut self, name: String) {
        if !name.is_empty() && !self.namespaces.iter().any(|n| n.metadata.name == name) {
            self.namespaces.push(Namespace::new(&name));
        }
    }

    async fn enter(&self, operation: &'static str) -> ClusterResult<()> {
        self.calls.lock().unwrap().push(operation.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// A small Harbor installation spread over three namespaces.
    pub fn with_sample_cluster() -> Self {
        let mut m = Self::new();
        m.add_namespace("default");
        m.add_namespace("harbor");
        m.add_namespace("kube-system");

        m.add_node(Node::new("control-plane-1", true));
        m.add_node(Node::new("worker-1", true));
        m.add_node(Node::new("worker-2", false));

        let components: [(&str, Container); 7] = [
            (
                "core",
                Container::new("core")
                    .with_image("goharbor/harbor-core:v2.10.0")
                    .with_port(8080, "TCP")
                    .with_readiness_path("/api/v2.0/ping", 8080)
                    .with_env("CORE_URL", "http://harbor-core:80")
                    .with_env("PORTAL_URL", "http://harbor-portal")
                    .with_secret_env("POSTGRESQL_PASSWORD", "harbor-database-secret", "password")
                    .with_mount("config", "/etc/core/app.conf")
                    .with_mount("secret-key", "/etc/core/key"),
            ),
            (
                "database",
                Container::new("database")
                    .with_image("goharbor/harbor-db:v2.10.0")
                    .with_port(5432, "TCP")
                    .with_env_from_secret("harbor-database-secret")
                    .with_mount("database-data", "/var/lib/postgresql/data"),
            ),
            (
                "jobservice",
                Container::new("jobservice")
                    .with_image("goharbor/harbor-jobservice:v2.10.0")
                    .with_port(8080, "TCP")
                    .with_readiness_path("/api/v1/stats", 8080)
                    .with_env("REGISTRY_CONTROLLER_URL", "http://harbor-registry:8080"),
            ),
            (
                "portal",
                Container::new("portal")
                    .with_image("goharbor/harbor-portal:v2.10.0")
                    .with_port(8080, "TCP")
                    .with_readiness_path("/", 8080),
            ),
            (
                "redis",
                Container::new("redis")
                    .with_image("goharbor/redis-photon:v2.10.0")
                    .with_port(6379, "TCP")
                    .with_mount("data", "/var/lib/redis"),
            ),
            (
                "registry",
                Container::new("registry")
                    .with_image("goharbor/registry-photon:v2.10.0")
                    .with_port(5000, "TCP")
                    .with_port(5001, "TCP")
                    .with_readiness_path("/", 5000)
                    .with_mount("registry-data", "/storage"),
            ),
            (
                "trivy",
                Container::new("trivy")
                    .with_image("goharbor/trivy-adapter-photon:v2.10.0")
                    .with_port(8080, "TCP"),
            ),
        ];

        for (component, container) in components {
            let name = format!("harbor-{component}");
            m.add_deployment(
                Deployment::new("harbor", &name)
                    .with_label("app", "harbor")
                    .with_label(COMPONENT_LABEL, component)
                    .with_container(container.clone()),
            );

            let mut pod = Pod::new("harbor", &format!("{name}-0"))
                .with_label("app", "harbor")
                .with_label(COMPONENT_LABEL, component)
                .with_container(container);
            if component == "core" {
                pod = pod.with_volume(Volume::from_secret("secret-key", "harbor-core"));
            }
            m.add_pod(pod);
            m.set_logs(
                "harbor",
                &format!("{name}-0"),
                format!("{component} started\nlistening\n"),
            );
        }

        for (name, port, target) in [
            ("harbor", 80, IntOrString::Int(8080)),
            ("harbor-core", 80, IntOrString::Int(8080)),
            ("harbor-database", 5432, IntOrString::Int(5432)),
            ("harbor-redis", 6379, IntOrString::Int(6379)),
            ("harbor-registry", 5000, IntOrString::Int(5000)),
        ] {
            m.add_service(Service::new("harbor", name).with_port(port, target));
        }
        m.add_service(Service::new("default", "kubernetes").with_port(443, IntOrString::Int(6443)));

        m.add_pod(Pod::new("kube-system", "coredns-0").with_container(Container::new("coredns")));
        m.add_pod(Pod::new("kube-system", "coredns-1").with_container(Container::new("coredns")));
        m.add_pod(
            Pod::new("default", "nginx-0")
                .with_container(Container::new("nginx").with_image("nginx:1.27")),
        );

        m.add_quota(
            ResourceQuota::new("harbor", "harbor-quota")
                .with_limit("pods", "20", "7")
                .with_limit("requests.cpu", "4", "1500m"),
        );

        m
    }
}

#[async_trait]
impl ClusterReader for MockClusterReader {
    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>> {
        self.enter("list_namespaces").await?;
        Ok(self.namespaces.clone())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Pod>> {
        self.enter("list_pods").await?;
        Ok(self
            .pods
            .iter()
            .filter(|p| p.namespace() == namespace)
            .filter(|p| label_selector.is_none_or(|s| matches_selector(&p.metadata.labels, s)))
            .cloned()
            .collect())
    }

    async fn list_all_pods(&self) -> ClusterResult<Vec<Pod>> {
        self.enter("list_all_pods").await?;
        Ok(self.pods.clone())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod> {
        self.enter("get_pod").await?;
        self.pods
            .iter()
            .find(|p| p.namespace() == namespace && p.name() == name)
            .cloned()
            .ok_or_else(|| ClusterError::not_found(ResourceKind::Pod, name))
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Deployment>> {
        self.enter("list_deployments").await?;
        Ok(self
            .deployments
            .iter()
            .filter(|d| d.namespace() == namespace)
            .filter(|d| label_selector.is_none_or(|s| matches_selector(&d.metadata.labels, s)))
            .cloned()
            .collect())
    }

    async fn list_all_deployments(
        &self,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Deployment>> {
        self.enter("list_all_deployments").await?;
        Ok(self
            .deployments
            .iter()
            .filter(|d| label_selector.is_none_or(|s| matches_selector(&d.metadata.labels, s)))
            .cloned()
            .collect())
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> ClusterResult<Deployment> {
        self.enter("get_deployment").await?;
        self.deployments
            .iter()
            .find(|d| d.namespace() == namespace && d.name() == name)
            .cloned()
            .ok_or_else(|| ClusterError::not_found(ResourceKind::Deployment, name))
    }

    async fn list_services(&self, namespace: &str) -> ClusterResult<Vec<Service>> {
        self.enter("list_services").await?;
        Ok(self
            .services
            .iter()
            .filter(|s| s.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn list_all_services(&self) -> ClusterResult<Vec<Service>> {
        self.enter("list_all_services").await?;
        Ok(self.services.clone())
    }

    async fn list_nodes(&self) -> ClusterResult<Vec<Node>> {
        self.enter("list_nodes").await?;
        Ok(self.nodes.clone())
    }

    async fn list_resource_quotas(&self, namespace: &str) -> ClusterResult<Vec<ResourceQuota>> {
        self.enter("list_resource_quotas").await?;
        Ok(self
            .quotas
            .iter()
            .filter(|q| q.metadata.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        tail_lines: Option<u32>,
    ) -> ClusterResult<String> {
        self.enter("pod_logs").await?;
        if !self
            .pods
            .iter()
            .any(|p| p.namespace() == namespace && p.name() == name)
        {
            return Err(ClusterError::not_found(ResourceKind::Pod, name));
        }
        let text = self
            .logs
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(match tail_lines {
            Some(n) => {
                let lines: Vec<&str> = text.lines().collect();
                let start = lines.len().saturating_sub(n as usize);
                lines[start..].join("\n")
            }
            None => text,
        })
    }
}
