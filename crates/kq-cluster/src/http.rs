//! `ClusterReader` backed by the API server's REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use kq_protocol::ResourceKind;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::ClusterConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::reader::ClusterReader;
use crate::types::{Deployment, Namespace, Node, ObjectList, Pod, ResourceQuota, Service};

/// Longest error body excerpt kept in `ClusterError::Api`.
const MAX_ERROR_BODY: usize = 200;

/// Object a request addresses, used to build `NotFound` on 404.
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    kind: ResourceKind,
    name: &'a str,
}

/// HTTP client for the cluster API server.
pub struct HttpClusterReader {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
}

impl HttpClusterReader {
    /// Build a client from config without contacting the server.
    pub fn new(config: &ClusterConfig) -> ClusterResult<Self> {
        let server = config
            .api_server
            .as_deref()
            .ok_or_else(|| ClusterError::Config("no API server configured".into()))?;
        let base_url = Url::parse(server)
            .map_err(|e| ClusterError::Config(format!("invalid API server URL '{server}': {e}")))?;

        let token = match (&config.token, &config.token_path) {
            (Some(token), _) => Some(token.trim().to_string()),
            (None, Some(path)) => Some(
                std::fs::read_to_string(path)
                    .map_err(|e| ClusterError::Config(format!("cannot read token {path}: {e}")))?
                    .trim()
                    .to_string(),
            ),
            (None, None) => None,
        };

        let timeout = Duration::from_secs(config.timeout_secs);
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(path) = &config.ca_cert_path {
            let pem = std::fs::read(path)
                .map_err(|e| ClusterError::Config(format!("cannot read CA bundle {path}: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| ClusterError::Config(format!("invalid CA bundle {path}: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| ClusterError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            token,
            timeout,
        })
    }

    /// Build a client and verify the server answers `GET /version`.
    pub async fn connect(config: &ClusterConfig) -> ClusterResult<Self> {
        let reader = Self::new(config)?;
        let version: serde_json::Value = reader.get_json(&["version"], &[], None).await?;
        tracing::info!(
            server = %reader.base_url,
            git_version = version["gitVersion"].as_str().unwrap_or("unknown"),
            "connected to cluster API server"
        );
        Ok(reader)
    }

    /// `Url` drops `.` and `..` segments, which would silently address a
    /// different resource. Such names cannot exist, so they are not found.
    fn check_segments(segments: &[&str], target: Option<Target<'_>>) -> ClusterResult<()> {
        match segments
            .iter()
            .find(|s| matches!(**s, "" | "." | ".."))
        {
            None => Ok(()),
            Some(bad) => Err(match target {
                Some(t) if t.name == *bad => ClusterError::not_found(t.kind, t.name),
                _ => ClusterError::not_found(ResourceKind::Namespace, *bad),
            }),
        }
    }

    fn url(&self, segments: &[&str]) -> ClusterResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClusterError::Config(format!("API server URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        target: Option<Target<'_>>,
    ) -> ClusterResult<reqwest::Response> {
        Self::check_segments(segments, target)?;
        let url = self.url(segments)?;
        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY).collect();
        tracing::debug!(
            status = status.as_u16(),
            path = %segments.join("/"),
            "API server error"
        );

        Err(match (status, target) {
            (StatusCode::NOT_FOUND, Some(t)) => ClusterError::not_found(t.kind, t.name),
            (StatusCode::UNAUTHORIZED, _) => ClusterError::Unauthorized(message),
            (StatusCode::FORBIDDEN, _) => ClusterError::Forbidden(message),
            _ => ClusterError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        target: Option<Target<'_>>,
    ) -> ClusterResult<T> {
        self.send(segments, query, target)
            .await?
            .json::<T>()
            .await
            .map_err(|e| self.map_transport(e))
    }

    async fn list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<T>> {
        let query: Vec<(&str, String)> = label_selector
            .map(|s| vec![("labelSelector", s.to_string())])
            .unwrap_or_default();
        let list: ObjectList<T> = self.get_json(segments, &query, None).await?;
        Ok(list.items)
    }

    fn map_transport(&self, e: reqwest::Error) -> ClusterError {
        if e.is_timeout() {
            ClusterError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_decode() {
            ClusterError::Decode(e.to_string())
        } else {
            ClusterError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl ClusterReader for HttpClusterReader {
    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>> {
        self.list(&["api", "v1", "namespaces"], None).await
    }

    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Pod>> {
        self.list(&["api", "v1", "namespaces", namespace, "pods"], label_selector)
            .await
    }

    async fn list_all_pods(&self) -> ClusterResult<Vec<Pod>> {
        self.list(&["api", "v1", "pods"], None).await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> ClusterResult<Pod> {
        self.get_json(
            &["api", "v1", "namespaces", namespace, "pods", name],
            &[],
            Some(Target {
                kind: ResourceKind::Pod,
                name,
            }),
        )
        .await
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Deployment>> {
        self.list(
            &["apis", "apps", "v1", "namespaces", namespace, "deployments"],
            label_selector,
        )
        .await
    }

    async fn list_all_deployments(
        &self,
        label_selector: Option<&str>,
    ) -> ClusterResult<Vec<Deployment>> {
        self.list(&["apis", "apps", "v1", "deployments"], label_selector)
            .await
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> ClusterResult<Deployment> {
        self.get_json(
            &["apis", "apps", "v1", "namespaces", namespace, "deployments", name],
            &[],
            Some(Target {
                kind: ResourceKind::Deployment,
                name,
            }),
        )
        .await
    }

    async fn list_services(&self, namespace: &str) -> ClusterResult<Vec<Service>> {
        self.list(&["api", "v1", "namespaces", namespace, "services"], None)
            .await
    }

    async fn list_all_services(&self) -> ClusterResult<Vec<Service>> {
        self.list(&["api", "v1", "services"], None).await
    }

    async fn list_nodes(&self) -> ClusterResult<Vec<Node>> {
        self.list(&["api", "v1", "nodes"], None).await
    }

    async fn list_resource_quotas(&self, namespace: &str) -> ClusterResult<Vec<ResourceQuota>> {
        self.list(
            &["api", "v1", "namespaces", namespace, "resourcequotas"],
            None,
        )
        .await
    }

    async fn pod_logs(
        &self,
        namespace: &str,
        name: &str,
        tail_lines: Option<u32>,
    ) -> ClusterResult<String> {
        let query: Vec<(&str, String)> = tail_lines
            .map(|n| vec![("tailLines", n.to_string())])
            .unwrap_or_default();
        self.send(
            &["api", "v1", "namespaces", namespace, "pods", name, "log"],
            &query,
            Some(Target {
                kind: ResourceKind::Pod,
                name,
            }),
        )
        .await?
        .text()
        .await
        .map_err(|e| self.map_transport(e))
    }
}
