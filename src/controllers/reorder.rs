//! Drag-and-drop persistence
//!
//! The view has already moved the node; these calls push the order read
//! back from the tree to the server. The UI reloads the project afterwards
//! so the server's dense ordering replaces the local guess.

use crate::api::{ApiClient, CharacterHandler, ManuscriptHandler, WorldviewHandler};
use crate::controllers::Done;
use crate::error::Result;

pub struct ReorderController<'a> {
    client: &'a ApiClient,
    project_id: &'a str,
}

impl<'a> ReorderController<'a> {
    pub fn new(client: &'a ApiClient, project_id: &'a str) -> Self {
        Self { client, project_id }
    }

    pub async fn reorder_cards(&self, group_id: &str, card_ids: &[String]) -> Result<Done> {
        CharacterHandler::new(self.client)
            .reorder_cards(self.project_id, group_id, card_ids)
            .await?;
        Ok(Done::project("Order saved"))
    }

    /// Move a card to another group, then store the target group's order
    pub async fn move_card(
        &self,
        card_id: &str,
        source_group_id: &str,
        target_group_id: &str,
        card_ids: &[String],
    ) -> Result<Done> {
        let handler = CharacterHandler::new(self.client);
        handler
            .move_card(self.project_id, card_id, source_group_id, target_group_id)
            .await?;
        handler
            .reorder_cards(self.project_id, target_group_id, card_ids)
            .await?;
        Ok(Done::project("Character moved"))
    }

    pub async fn reorder_worldview_cards(&self, group_id: &str, card_ids: &[String]) -> Result<Done> {
        WorldviewHandler::new(self.client)
            .reorder_cards(self.project_id, group_id, card_ids)
            .await?;
        Ok(Done::project("Order saved"))
    }

    pub async fn move_worldview_card(
        &self,
        card_id: &str,
        source_group_id: &str,
        target_group_id: &str,
        card_ids: &[String],
    ) -> Result<Done> {
        let handler = WorldviewHandler::new(self.client);
        handler
            .move_card(self.project_id, card_id, source_group_id, target_group_id)
            .await?;
        handler
            .reorder_cards(self.project_id, target_group_id, card_ids)
            .await?;
        Ok(Done::project("Setting card moved"))
    }

    pub async fn reorder_blocks(&self, block_ids: &[String]) -> Result<Done> {
        ManuscriptHandler::new(self.client)
            .reorder(self.project_id, block_ids)
            .await?;
        Ok(Done::project("Order saved"))
    }
}
