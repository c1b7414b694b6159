use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryVerdict {
    pub suitable: bool,
    pub reason: String,
}

/// Second opinion consulted only for channels the rules accepted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecondaryClassifier: Send + Sync {
    async fn analyze(
        &self,
        title: &str,
        description: &str,
        video_titles: &[String],
        topic: &str,
    ) -> anyhow::Result<SecondaryVerdict>;
}
