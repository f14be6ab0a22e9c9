//! Tiered classifier: local first, cloud on any local failure.
//!
//! The tier that actually produced the proposal is carried in
//! `ClassifierReply.tier`.

use async_trait::async_trait;

use super::{Classifier, ClassifierReply, ClassifierResult};

/// Composite classifier that tries local rules first, then a cloud model.
pub struct TieredClassifier {
    local: Box<dyn Classifier>,
    cloud: Box<dyn Classifier>,
}

impl TieredClassifier {
    pub fn new(local: Box<dyn Classifier>, cloud: Box<dyn Classifier>) -> Self {
        Self { local, cloud }
    }
}

#[async_trait]
impl Classifier for TieredClassifier {
    async fn classify(&self, text: &str) -> ClassifierResult<ClassifierReply> {
        match self.local.classify(text).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                tracing::debug!(
                    reason = e.reason_code(),
                    cloud = self.cloud.tier_name(),
                    "local classification missed, falling back to cloud"
                );
                self.cloud.classify(text).await
            }
        }
    }

    fn tier_name(&self) -> &str {
        "tiered"
    }
}
