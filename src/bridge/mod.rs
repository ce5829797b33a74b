//! Persistence bridge: the external system that saves, exports and publishes
//!
//! Implementations report expected failures as an [`Outcome`] with
//! `success == false`. An `Err` is a transport fault; callers pass every call
//! through [`guard`] so that it is turned into a failed outcome instead of
//! escaping.

pub mod simulated;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::tree::TreeNode;

/// Message reported when a bridge call fails outside its outcome
pub const TRANSPORT_FAULT_MESSAGE: &str = "An unexpected error occurred while contacting the server.";

/// Result of a persistence call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Backend operations the editor depends on
#[allow(async_fn_in_trait)]
pub trait PersistenceBridge: Send + Sync {
    /// Persist the content of one file
    async fn save(&self, file_id: &str, content: &str) -> anyhow::Result<Outcome>;

    /// Export one document, addressed by its display path
    async fn export_document(&self, path: &str) -> anyhow::Result<Outcome>;

    /// Publish the whole forest
    async fn publish_all(&self, forest: &[Arc<TreeNode>]) -> anyhow::Result<Outcome>;
}

/// Await a bridge call and fold a transport fault into a failed outcome
pub async fn guard<F>(operation: &str, call: F) -> Outcome
where
    F: Future<Output = anyhow::Result<Outcome>>,
{
    match call.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("{} failed in transport: {:#}", operation, e);
            Outcome::failure(TRANSPORT_FAULT_MESSAGE)
        }
    }
}
