//! Cluster connection settings.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ClusterError, ClusterResult};

/// Service-account mount used when running inside the cluster.
pub const IN_CLUSTER_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const IN_CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Where cluster data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    /// Real API server over HTTPS.
    #[default]
    Live,
    /// Seeded in-memory cluster for local development.
    Sample,
}

impl FromStr for ClusterMode {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "sample" => Ok(Self::Sample),
            other => Err(ClusterError::Config(format!(
                "unknown cluster mode '{other}' (expected live or sample)"
            ))),
        }
    }
}

/// Connection settings for the cluster API server.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub mode: ClusterMode,
    /// API server base URL (e.g. "https://10.0.0.1:6443").
    #[serde(default)]
    pub api_server: Option<String>,
    /// Bearer token. Takes precedence over `token_path`.
    #[serde(default)]
    pub token: Option<String>,
    /// File holding the bearer token.
    #[serde(default)]
    pub token_path: Option<String>,
    /// PEM bundle used to verify the API server certificate.
    #[serde(default)]
    pub ca_cert_path: Option<String>,
    /// Skip TLS verification (development clusters only).
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            mode: ClusterMode::default(),
            api_server: None,
            token: None,
            token_path: None,
            ca_cert_path: None,
            accept_invalid_certs: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClusterConfig {
    /// Overlay `KUBE_*` variables from `var`, then fall back to in-cluster
    /// discovery when no API server is configured.
    pub fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> ClusterResult<()> {
        if let Some(mode) = var("KQ_CLUSTER_MODE") {
            self.mode = mode.parse()?;
        }
        if let Some(server) = var("KUBE_API_SERVER") {
            self.api_server = Some(server);
        }
        if let Some(token) = var("KUBE_TOKEN") {
            self.token = Some(token);
        }
        if let Some(ca) = var("KUBE_CA_CERT") {
            self.ca_cert_path = Some(ca);
        }

        if self.api_server.is_none()
            && let (Some(host), Some(port)) = (
                var("KUBERNETES_SERVICE_HOST"),
                var("KUBERNETES_SERVICE_PORT"),
            )
        {
            self.api_server = Some(format!("https://{}:{port}", join_host(&host)));
            self.token_path.get_or_insert_with(|| IN_CLUSTER_TOKEN_PATH.to_string());
            self.ca_cert_path.get_or_insert_with(|| IN_CLUSTER_CA_PATH.to_string());
        }
        Ok(())
    }
}

/// IPv6 literals need brackets before a port can follow.
fn join_host(host: &str) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClusterConfig::default();
        assert_eq!(config.mode, ClusterMode::Live);
        assert!(config.api_server.is_none());
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn explicit_env_overrides() {
        let mut config = ClusterConfig::default();
        config.apply_vars(vars(&[
            ("KUBE_API_SERVER", "https://k8s.example.com:6443"),
            ("KUBE_TOKEN", "abc"),
        ]))
        .unwrap();
        assert_eq!(
            config.api_server.as_deref(),
            Some("https://k8s.example.com:6443")
        );
        assert_eq!(config.token.as_deref(), Some("abc"));
    }

    #[test]
    fn in_cluster_discovery() {
        let mut config = ClusterConfig::default();
        config.apply_vars(vars(&[
            ("KUBERNETES_SERVICE_HOST", "10.96.0.1"),
            ("KUBERNETES_SERVICE_PORT", "443"),
        ]))
        .unwrap();
        assert_eq!(config.api_server.as_deref(), Some("https://10.96.0.1:443"));
        assert_eq!(config.token_path.as_deref(), Some(IN_CLUSTER_TOKEN_PATH));
        assert_eq!(config.ca_cert_path.as_deref(), Some(IN_CLUSTER_CA_PATH));
    }

    #[test]
    fn explicit_server_wins_over_in_cluster() {
        let mut config = ClusterConfig {
            api_server: Some("https://explicit:6443".into()),
            ..ClusterConfig::default()
        };
        config.apply_vars(vars(&[
            ("KUBERNETES_SERVICE_HOST", "10.96.0.1"),
            ("KUBERNETES_SERVICE_PORT", "443"),
        ]))
        .unwrap();
        assert_eq!(config.api_server.as_deref(), Some("https://explicit:6443"));
        assert!(config.token_path.is_none());
    }

    #[test]
    fn sample_mode_from_env() {
        let mut config = ClusterConfig::default();
        config.apply_vars(vars(&[("KQ_CLUSTER_MODE", "SAMPLE")])).unwrap();
        assert_eq!(config.mode, ClusterMode::Sample);
    }

    #[test]
    fn in_cluster_discovery_brackets_ipv6_host() {
        let mut config = ClusterConfig::default();
        config
            .apply_vars(vars(&[
                ("KUBERNETES_SERVICE_HOST", "fd00:10:96::1"),
                ("KUBERNETES_SERVICE_PORT", "443"),
            ]))
            .unwrap();
        assert_eq!(config.api_server.as_deref(), Some("https://[fd00:10:96::1]:443"));
        assert!(crate::HttpClusterReader::new(&ClusterConfig {
            token_path: None,
            ca_cert_path: None,
            ..config
        })
        .is_ok());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut config = ClusterConfig::default();
        let err = config
            .apply_vars(vars(&[("KQ_CLUSTER_MODE", "samples")]))
            .unwrap_err();
        assert!(matches!(err, ClusterError::Config(_)));
        assert!(err.to_string().contains("samples"));
        assert_eq!(config.mode, ClusterMode::Live);
    }

    #[test]
    fn deserialize_from_toml_table() {
        let config: ClusterConfig = toml::from_str(
            r#"
mode = "sample"
api_server = "https://127.0.0.1:6443"
accept_invalid_certs = true
"#,
        )
        .unwrap();
        assert_eq!(config.mode, ClusterMode::Sample);
        assert!(config.accept_invalid_certs);
        assert_eq!(config.timeout_secs, 10);
    }
}
