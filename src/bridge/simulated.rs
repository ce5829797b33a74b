//! In-process bridge that simulates backend latency and responses

use std::sync::Arc;
use std::time::Duration;

use super::{Outcome, PersistenceBridge};
use crate::core::config::BridgeConfig;
use crate::core::tree::{self, TreeNode};

/// Bridge that answers locally after a configurable delay
#[derive(Debug, Clone, Default)]
pub struct SimulatedBridge {
    config: BridgeConfig,
}

impl SimulatedBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    async fn pause(millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

impl PersistenceBridge for SimulatedBridge {
    async fn save(&self, file_id: &str, content: &str) -> anyhow::Result<Outcome> {
        Self::pause(self.config.save_delay_ms).await;

        if file_id.is_empty() {
            return Ok(Outcome::failure(
                "Failed to save file. Invalid parameters. (Simulated)",
            ));
        }

        tracing::info!("Simulating save for {} ({} bytes)", file_id, content.len());
        Ok(Outcome::success("File saved successfully! (Simulated)"))
    }

    async fn export_document(&self, path: &str) -> anyhow::Result<Outcome> {
        Self::pause(self.config.export_delay_ms).await;

        if path.is_empty() {
            return Ok(Outcome::failure(
                "File path is missing for PDF export. (Simulated)",
            ));
        }

        Ok(Outcome::success(format!(
            "PDF export initiated for \"{}\". Check your downloads. (Simulated)",
            path
        )))
    }

    async fn publish_all(&self, forest: &[Arc<TreeNode>]) -> anyhow::Result<Outcome> {
        Self::pause(self.config.publish_delay_ms).await;

        if self.config.fail_publish {
            return Ok(Outcome::failure(
                "Failed to publish site. An unexpected error occurred. (Simulated)",
            ));
        }

        let documents = tree::descendants(forest)
            .filter(|node| node.as_file().is_some())
            .count();
        tracing::info!("Simulating publish of {} documents", documents);
        Ok(Outcome::success("Site published successfully! (Simulated)"))
    }
}
