//! Service handlers.

use std::collections::BTreeSet;

use kq_cluster::{ClusterReader, IntOrString, Service};
use kq_protocol::{ParamKey, ParameterBag, ResourceKind};

use super::{DispatchError, DispatchResult, Scope, list_scope, lookup_scope, required, there_are};

pub async fn list_services(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let scope = list_scope(params);
    let services = match scope {
        Scope::Namespace(ns) => reader.list_services(ns).await?,
        Scope::All => reader.list_all_services().await?,
    };

    let head = there_are(services.len(), "service", "services");
    if services.is_empty() {
        return Ok(format!("{head} in {}.", scope.describe()));
    }
    let names: Vec<String> = services
        .iter()
        .map(|s| match scope {
            Scope::All => format!("{} ({})", s.name(), s.namespace()),
            Scope::Namespace(_) => s.name().to_string(),
        })
        .collect();
    Ok(format!("{head} in {}: {}.", scope.describe(), names.join(", ")))
}

pub async fn service_namespace(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let name = required(params, ParamKey::ServiceName)?;
    let services = find_services(reader, params, name).await?;

    let namespaces: BTreeSet<&str> = services.iter().map(Service::namespace).collect();
    let namespaces: Vec<&str> = namespaces.into_iter().collect();
    Ok(match namespaces.as_slice() {
        [only] => format!("The service '{name}' is deployed in the '{only}' namespace."),
        many => format!(
            "The service '{name}' is deployed in the following namespaces: {}.",
            many.join(", ")
        ),
    })
}

pub async fn service_route_port(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let name = required(params, ParamKey::ServiceName)?;
    let services = find_services(reader, params, name).await?;

    let Some(port) = services.first().and_then(|s| s.spec.ports.first()) else {
        return Ok(format!("No ports are defined for the service '{name}'."));
    };
    // An unset targetPort defaults to the service port.
    let target = port
        .target_port
        .clone()
        .unwrap_or(IntOrString::Int(port.port));
    Ok(format!(
        "The service '{name}' routes traffic on port {} to target port {target}.",
        port.port
    ))
}

/// Every service called `name`, in the given namespace or anywhere.
async fn find_services(
    reader: &dyn ClusterReader,
    params: &ParameterBag,
    name: &str,
) -> Result<Vec<Service>, DispatchError> {
    let candidates = match lookup_scope(params) {
        Some(ns) => reader.list_services(ns).await?,
        None => reader.list_all_services().await?,
    };
    let matching: Vec<Service> = candidates.into_iter().filter(|s| s.name() == name).collect();
    if matching.is_empty() {
        return Err(DispatchError::NotFound {
            kind: ResourceKind::Service,
            name: name.to_string(),
        });
    }
    Ok(matching)
}
