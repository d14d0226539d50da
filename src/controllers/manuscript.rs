//! Manuscript import, clear and block editing

use crate::api::{ApiClient, BlockUpdate, ManuscriptHandler};
use crate::controllers::{ensure_valid, Done};
use crate::core::limits::{BLOCK_CONTENT_MAX, BLOCK_TITLE_MAX};
use crate::error::Result;
use crate::view::validation::{max_length, FieldRule};

pub struct ManuscriptController<'a> {
    client: &'a ApiClient,
    project_id: &'a str,
}

impl<'a> ManuscriptController<'a> {
    pub fn new(client: &'a ApiClient, project_id: &'a str) -> Self {
        Self { client, project_id }
    }

    fn handler(&self) -> ManuscriptHandler<'a> {
        ManuscriptHandler::new(self.client)
    }

    /// Rebuild the manuscript from the scenario's plot points
    pub async fn import(&self) -> Result<Done> {
        let blocks = self.handler().import(self.project_id).await?;
        Ok(Done::project(format!("Imported {} blocks", blocks.len())))
    }

    pub async fn clear(&self) -> Result<Done> {
        self.handler().clear(self.project_id).await?;
        Ok(Done::project("Manuscript cleared"))
    }

    pub async fn save_block(&self, block_id: &str, title: &str, content: &str) -> Result<Done> {
        ensure_valid(&[
            FieldRule::new("Title", title, max_length(BLOCK_TITLE_MAX)).required(),
            FieldRule::new("Text", content, max_length(BLOCK_CONTENT_MAX)),
        ])?;

        let update = BlockUpdate {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        };
        let block = self
            .handler()
            .update_block(self.project_id, block_id, &update)
            .await?;
        Ok(Done::project(format!("Saved \"{}\"", block.title)))
    }
}
