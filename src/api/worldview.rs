//! Worldview settings, groups and cards

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::characters::{AiCardEdits, CardOrderBody, MoveBody, WorldviewLevel};
use crate::api::client::{Ack, ApiClient};
use crate::core::models::{Worldview, WorldviewCard, WorldviewGroup};
use crate::error::Result;

/// Parameters for an AI edit of a worldview card
#[derive(Debug, Clone, Serialize)]
pub struct WorldviewAiEditParams {
    pub prompt_text: String,
    pub model_name: String,
    pub selected_card_ids: Vec<String>,
    pub worldview_level: WorldviewLevel,
    pub edit_related_cards: bool,
}

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CardBody<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SavedCard {
    card: WorldviewCard,
}

/// Worldview operations handler
pub struct WorldviewHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> WorldviewHandler<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Save the main worldview settings
    pub async fn save(&self, project_id: &str, worldview: &Worldview) -> Result<Ack> {
        self.client
            .put(
                &format!("/projects/{}/worldview", project_id),
                Some(project_id),
                worldview,
            )
            .await
    }

    pub async fn create_group(&self, project_id: &str, name: &str) -> Result<WorldviewGroup> {
        self.client
            .post(
                &format!("/projects/{}/worldview_groups", project_id),
                Some(project_id),
                &NameBody { name },
            )
            .await
    }

    pub async fn delete_group(&self, project_id: &str, group_id: &str) -> Result<Ack> {
        self.client
            .delete(
                &format!("/projects/{}/worldview_groups/{}", project_id, group_id),
                Some(project_id),
            )
            .await
    }

    pub async fn create_card(
        &self,
        project_id: &str,
        group_id: &str,
        title: &str,
        content: &str,
    ) -> Result<WorldviewCard> {
        let saved: SavedCard = self
            .client
            .post(
                &format!("/projects/{}/worldview_groups/{}/cards", project_id, group_id),
                Some(project_id),
                &CardBody { title, content },
            )
            .await?;
        Ok(saved.card)
    }

    pub async fn update_card(
        &self,
        project_id: &str,
        card_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Ack> {
        self.client
            .put(
                &format!("/projects/{}/worldview_cards/{}", project_id, card_id),
                Some(project_id),
                &CardBody { title, content },
            )
            .await
    }

    pub async fn delete_card(&self, project_id: &str, card_id: &str) -> Result<Ack> {
        self.client
            .delete(
                &format!("/projects/{}/worldview_cards/{}", project_id, card_id),
                Some(project_id),
            )
            .await
    }

    pub async fn move_card(
        &self,
        project_id: &str,
        card_id: &str,
        source_group_id: &str,
        target_group_id: &str,
    ) -> Result<Ack> {
        self.client
            .put(
                &format!("/projects/{}/worldview_cards/{}/move", project_id, card_id),
                Some(project_id),
                &MoveBody {
                    source_group_id,
                    target_group_id,
                },
            )
            .await
    }

    pub async fn reorder_cards(
        &self,
        project_id: &str,
        group_id: &str,
        card_ids: &[String],
    ) -> Result<Ack> {
        self.client
            .put(
                &format!(
                    "/projects/{}/worldview_groups/{}/cards/order",
                    project_id, group_id
                ),
                Some(project_id),
                &CardOrderBody { card_ids },
            )
            .await
    }

    /// Ask the AI to rewrite a worldview card
    pub async fn edit_with_ai(
        &self,
        project_id: &str,
        card_id: &str,
        params: &WorldviewAiEditParams,
    ) -> Result<AiCardEdits> {
        self.client
            .put(
                &format!("/projects/{}/worldview_cards/{}/edit-with-ai", project_id, card_id),
                Some(project_id),
                params,
            )
            .await
    }

    /// Apply one card from an AI proposal
    pub async fn apply_ai_card(&self, project_id: &str, card: &Value) -> Result<Ack> {
        let field = |name: &str| card.get(name).and_then(Value::as_str).unwrap_or_default();
        self.update_card(project_id, field("id"), field("title"), field("content"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{MockTransport, RawResponse};
    use crate::core::session::SessionStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_save_puts_logline_genre_rules() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1/worldview"
                    && req.body
                        == Some(json!({
                            "logline": "A city that forgets",
                            "genre": "fantasy",
                            "rules": ["No magic after dusk"]
                        }))
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!({"message": "saved"}))) }));

        let client = ApiClient::with_transport(Arc::new(mock), SessionStore::new());
        let worldview = Worldview {
            logline: "A city that forgets".into(),
            genre: "fantasy".into(),
            rules: vec!["No magic after dusk".into()],
        };
        let ack = WorldviewHandler::new(&client)
            .save("p1", &worldview)
            .await
            .unwrap();
        assert_eq!(ack.message.as_deref(), Some("saved"));
    }

    #[tokio::test]
    async fn test_apply_ai_card_uses_proposed_fields() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1/worldview_cards/wv-1"
                    && req.body == Some(json!({"title": "Tides", "content": "Twice a day"}))
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!({}))) }));

        let client = ApiClient::with_transport(Arc::new(mock), SessionStore::new());
        WorldviewHandler::new(&client)
            .apply_ai_card(
                "p1",
                &json!({"id": "wv-1", "title": "Tides", "content": "Twice a day"}),
            )
            .await
            .unwrap();
    }
}
