//! Harbor component handlers.
//!
//! A component resolves to the first deployment labelled
//! `component=<name>`; every answer reads that deployment's first
//! container. Missing configuration is a successful answer saying so.

use kq_cluster::{ClusterReader, Container, EnvVar};
use kq_protocol::{ParamKey, ParameterBag, ResourceKind, normalize_component};

use super::{DispatchError, DispatchResult, lookup_scope, required};

pub async fn container_port(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let (component, container) = resolve(reader, params).await?;
    let Some(container) = container else {
        return Ok(no_containers(&component));
    };

    let ports: Vec<String> = container.ports.iter().map(ToString::to_string).collect();
    Ok(match ports.as_slice() {
        [] => format!("No container ports are defined for '{component}'."),
        [port] => format!("The container port for '{component}' is {port}."),
        many => format!(
            "The container ports for '{component}' are {}.",
            many.join(", ")
        ),
    })
}

pub async fn readiness_probe_path(
    reader: &dyn ClusterReader,
    params: &ParameterBag,
) -> DispatchResult {
    let (component, container) = resolve(reader, params).await?;
    let Some(container) = container else {
        return Ok(no_containers(&component));
    };

    let Some(probe) = &container.readiness_probe else {
        return Ok(format!("No readiness probe is configured for '{component}'."));
    };
    Ok(match &probe.http_get {
        Some(http) => format!(
            "The readiness probe path for '{component}' is: {}.",
            http.path.as_deref().unwrap_or("/")
        ),
        None if probe.tcp_socket.is_some() => format!(
            "The readiness probe for '{component}' is a TCP check and has no HTTP path."
        ),
        None => format!(
            "The readiness probe for '{component}' runs a command and has no HTTP path."
        ),
    })
}

pub async fn environment_variable(
    reader: &dyn ClusterReader,
    params: &ParameterBag,
) -> DispatchResult {
    let (component, container) = resolve(reader, params).await?;
    let Some(container) = container else {
        return Ok(no_containers(&component));
    };

    let Some(wanted) = params.non_empty(ParamKey::EnvVar) else {
        if container.env.is_empty() {
            return Ok(format!("No environment variables are defined for '{component}'."));
        }
        let names: Vec<&str> = container.env.iter().map(|e| e.name.as_str()).collect();
        return Ok(format!(
            "The environment variables defined for '{component}' are: {}.",
            names.join(", ")
        ));
    };

    Ok(match container.env.iter().find(|e| e.name == wanted) {
        Some(var) => describe_env(&component, var),
        None => format!("The environment variable '{wanted}' is not defined for '{component}'."),
    })
}

pub async fn volume_mount_path(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let (component, container) = resolve(reader, params).await?;
    let Some(container) = container else {
        return Ok(no_containers(&component));
    };

    let mounts: Vec<String> = container
        .volume_mounts
        .iter()
        .map(|m| format!("{} (volume '{}')", m.mount_path, m.name))
        .collect();
    Ok(match mounts.as_slice() {
        [] => format!("No volume mounts are configured for '{component}'."),
        [mount] => format!("The volume mount path for '{component}' is: {mount}."),
        many => format!(
            "The volume mount paths for '{component}' are: {}.",
            many.join(", ")
        ),
    })
}

fn describe_env(component: &str, var: &EnvVar) -> String {
    let name = &var.name;
    if let Some(value) = &var.value {
        return format!("The value of the environment variable '{name}' for '{component}' is '{value}'.");
    }
    let source = var.value_from.as_ref();
    if let Some(secret) = source.and_then(|s| s.secret_key_ref.as_ref()) {
        return format!(
            "The environment variable '{name}' for '{component}' is read from key '{}' of secret '{}'.",
            secret.key, secret.name
        );
    }
    if let Some(config_map) = source.and_then(|s| s.config_map_key_ref.as_ref()) {
        return format!(
            "The environment variable '{name}' for '{component}' is read from key '{}' of config map '{}'.",
            config_map.key, config_map.name
        );
    }
    format!("The environment variable '{name}' for '{component}' is set without a value.")
}

fn no_containers(component: &str) -> String {
    format!("No containers are defined for '{component}'.")
}

/// Canonical component name plus the first container of its deployment.
async fn resolve(
    reader: &dyn ClusterReader,
    params: &ParameterBag,
) -> Result<(String, Option<Container>), DispatchError> {
    let component = normalize_component(required(params, ParamKey::Component)?);
    let deployment = reader
        .find_component_deployments(lookup_scope(params), &component)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DispatchError::NotFound {
            kind: ResourceKind::Component,
            name: component.clone(),
        })?;
    let container = deployment.first_container().cloned();
    Ok((component, container))
}
