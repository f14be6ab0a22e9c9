//! Intent schema introspection.

use axum::Json;
use kq_protocol::{COMPONENT_VOCABULARY, Intent, IntentSpec};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IntentCatalog {
    pub intents: Vec<IntentSpec>,
    pub components: &'static [&'static str],
}

/// GET /api/v1/intents - the closed intent set and component vocabulary.
pub async fn list_intents() -> Json<IntentCatalog> {
    Json(IntentCatalog {
        intents: Intent::ALL.into_iter().map(Intent::spec).collect(),
        components: COMPONENT_VOCABULARY,
    })
}
