//! Pods associated with a secret.
//!
//! Authoritative references are secret volumes, `secretKeyRef` env vars
//! and `envFrom.secretRef` sources across regular and init containers.
//! Only when none match does the name heuristic run: a container defining
//! an env var named like the secret (`my-secret` → `MY_SECRET`). Heuristic
//! results are labelled as such in the answer.

use std::collections::BTreeSet;

use kq_cluster::{ClusterReader, Pod};
use kq_protocol::{ParamKey, ParameterBag};

use super::{DispatchResult, required};

pub async fn pods_for_secret(reader: &dyn ClusterReader, params: &ParameterBag) -> DispatchResult {
    let secret = required(params, ParamKey::SecretName)?;
    let pods = reader.list_all_pods().await?;

    let direct = pod_set(pods.iter().filter(|p| references_secret(p, secret)));
    if !direct.is_empty() {
        let list = format_pods(&direct);
        return Ok(if direct.len() == 1 {
            format!("The pod associated with the secret '{secret}' is {list}.")
        } else {
            format!("The pods associated with the secret '{secret}' are: {list}.")
        });
    }

    let env_name = heuristic_env_name(secret);
    let guessed = pod_set(pods.iter().filter(|p| {
        p.all_containers()
            .any(|c| c.env.iter().any(|e| e.name == env_name))
    }));
    if guessed.is_empty() {
        return Ok(format!("No pods are associated with the secret '{secret}'."));
    }
    Ok(format!(
        "No pods reference the secret '{secret}' directly. Based only on an environment \
         variable named {env_name}, these pods may use it: {}.",
        format_pods(&guessed)
    ))
}

/// True when the pod mounts or reads `secret` by reference.
pub fn references_secret(pod: &Pod, secret: &str) -> bool {
    let volume = pod.spec.volumes.iter().any(|v| {
        v.secret
            .as_ref()
            .and_then(|s| s.secret_name.as_deref())
            == Some(secret)
    });
    volume
        || pod.all_containers().any(|c| {
            c.env.iter().any(|e| {
                e.value_from
                    .as_ref()
                    .and_then(|f| f.secret_key_ref.as_ref())
                    .is_some_and(|r| r.name == secret)
            }) || c
                .env_from
                .iter()
                .any(|f| f.secret_ref.as_ref().is_some_and(|r| r.name == secret))
        })
}

/// `harbor-db.creds` → `HARBOR_DB_CREDS`.
fn heuristic_env_name(secret: &str) -> String {
    secret
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Deduplicated `(namespace, name)` pairs, ordered.
fn pod_set<'a>(pods: impl Iterator<Item = &'a Pod>) -> BTreeSet<(&'a str, &'a str)> {
    pods.map(|p| (p.namespace(), p.name())).collect()
}

fn format_pods(pods: &BTreeSet<(&str, &str)>) -> String {
    pods.iter()
        .map(|(ns, name)| format!("{name} (namespace {ns})"))
        .collect::<Vec<_>>()
        .join(", ")
}
