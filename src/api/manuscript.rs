//! Manuscript block operations

use serde::Serialize;

use crate::api::client::{Ack, ApiClient};
use crate::core::models::ManuscriptBlock;
use crate::error::Result;

/// Partial block update; absent fields are left untouched by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Serialize)]
struct BlockOrderBody<'a> {
    block_ids: &'a [String],
}

/// Manuscript operations handler
pub struct ManuscriptHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> ManuscriptHandler<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn base(project_id: &str) -> String {
        format!("/projects/{}/manuscript", project_id)
    }

    pub async fn blocks(&self, project_id: &str) -> Result<Vec<ManuscriptBlock>> {
        self.client
            .get(&format!("{}/blocks", Self::base(project_id)), Some(project_id))
            .await
    }

    /// Rebuild the manuscript from the scenario's plot points
    pub async fn import(&self, project_id: &str) -> Result<Vec<ManuscriptBlock>> {
        self.client
            .post(
                &format!("{}/import", Self::base(project_id)),
                Some(project_id),
                &serde_json::json!({}),
            )
            .await
    }

    /// Remove every block
    pub async fn clear(&self, project_id: &str) -> Result<Ack> {
        self.client
            .delete(&format!("{}/blocks", Self::base(project_id)), Some(project_id))
            .await
    }

    pub async fn update_block(
        &self,
        project_id: &str,
        block_id: &str,
        update: &BlockUpdate,
    ) -> Result<ManuscriptBlock> {
        self.client
            .put(
                &format!("{}/blocks/{}", Self::base(project_id), block_id),
                Some(project_id),
                update,
            )
            .await
    }

    pub async fn reorder(&self, project_id: &str, block_ids: &[String]) -> Result<Ack> {
        self.client
            .put(
                &format!("{}/blocks/order", Self::base(project_id)),
                Some(project_id),
                &BlockOrderBody { block_ids },
            )
            .await
    }
}
