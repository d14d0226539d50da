//! Character group and card operations

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::client::{Ack, ApiClient};
use crate::core::models::{join_tags, Card, CardDraft, Group};
use crate::error::Result;

/// How much of the worldview the AI should see when editing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldviewLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl WorldviewLevel {
    pub fn all() -> [WorldviewLevel; 4] {
        [
            WorldviewLevel::None,
            WorldviewLevel::Low,
            WorldviewLevel::Medium,
            WorldviewLevel::High,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorldviewLevel::None => "none",
            WorldviewLevel::Low => "low",
            WorldviewLevel::Medium => "medium",
            WorldviewLevel::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|l| l.as_str() == s)
    }
}

/// Parameters for an AI edit of a character card
#[derive(Debug, Clone, Serialize)]
pub struct CardAiEditParams {
    pub prompt_text: String,
    pub model_name: String,
    /// Other cards given to the model as context
    pub selected_card_ids: Vec<String>,
    pub worldview_level: WorldviewLevel,
    pub edit_related_characters: bool,
}

/// Cards rewritten by the AI; nothing is saved until they are applied
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiCardEdits {
    #[serde(default)]
    pub updated_cards: Vec<Value>,
}

/// Body of the card creation route.
///
/// The server keeps `goal`, `personality` and `abilities` as single strings
/// on insert while `quote` stays a list.
#[derive(Debug, Serialize)]
struct NewCardBody<'a> {
    name: &'a str,
    description: &'a str,
    goal: String,
    personality: String,
    abilities: String,
    quote: &'a [String],
    introduction_story: &'a str,
}

impl<'a> From<&'a CardDraft> for NewCardBody<'a> {
    fn from(draft: &'a CardDraft) -> Self {
        Self {
            name: &draft.name,
            description: &draft.description,
            goal: join_tags(&draft.goal),
            personality: join_tags(&draft.personality),
            abilities: join_tags(&draft.abilities),
            quote: &draft.quote,
            introduction_story: &draft.introduction_story,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateCardBody<'a> {
    id: &'a str,
    #[serde(flatten)]
    draft: &'a CardDraft,
}

#[derive(Debug, Deserialize)]
struct SavedCard {
    card: Card,
}

#[derive(Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct HighlightBody<'a> {
    field_name: &'a str,
    text_content: &'a str,
}

#[derive(Deserialize)]
struct Highlighted {
    highlighted_text: String,
}

#[derive(Serialize)]
pub(crate) struct MoveBody<'a> {
    pub source_group_id: &'a str,
    pub target_group_id: &'a str,
}

#[derive(Serialize)]
pub(crate) struct CardOrderBody<'a> {
    pub card_ids: &'a [String],
}

/// Character operations handler
pub struct CharacterHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> CharacterHandler<'a> {
    /// Create a new handler
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create_group(&self, project_id: &str, name: &str) -> Result<Group> {
        self.client
            .post(
                &format!("/projects/{}/groups", project_id),
                Some(project_id),
                &NameBody { name },
            )
            .await
    }

    pub async fn delete_group(&self, project_id: &str, group_id: &str) -> Result<Ack> {
        self.client
            .delete(
                &format!("/projects/{}/groups/{}", project_id, group_id),
                Some(project_id),
            )
            .await
    }

    /// Save a new card into a group
    pub async fn create_card(
        &self,
        project_id: &str,
        group_id: &str,
        draft: &CardDraft,
    ) -> Result<Card> {
        let saved: SavedCard = self
            .client
            .post(
                &format!("/projects/{}/groups/{}/cards", project_id, group_id),
                Some(project_id),
                &NewCardBody::from(draft),
            )
            .await?;
        Ok(saved.card)
    }

    /// Overwrite the editable fields of a card
    pub async fn update_card(&self, project_id: &str, card_id: &str, draft: &CardDraft) -> Result<Ack> {
        self.client
            .put(
                &format!("/projects/{}/cards/{}", project_id, card_id),
                Some(project_id),
                &UpdateCardBody { id: card_id, draft },
            )
            .await
    }

    /// Apply a raw card object (as proposed by an AI edit)
    pub async fn update_card_raw(&self, project_id: &str, card: &Value) -> Result<Ack> {
        let card_id = card.get("id").and_then(Value::as_str).unwrap_or_default();
        self.client
            .put(
                &format!("/projects/{}/cards/{}", project_id, card_id),
                Some(project_id),
                card,
            )
            .await
    }

    pub async fn delete_card(&self, project_id: &str, group_id: &str, card_id: &str) -> Result<Ack> {
        self.client
            .delete(
                &format!("/projects/{}/groups/{}/cards/{}", project_id, group_id, card_id),
                Some(project_id),
            )
            .await
    }

    /// Move a card to another group
    pub async fn move_card(
        &self,
        project_id: &str,
        card_id: &str,
        source_group_id: &str,
        target_group_id: &str,
    ) -> Result<Ack> {
        self.client
            .put(
                &format!("/projects/{}/cards/{}/move", project_id, card_id),
                Some(project_id),
                &MoveBody {
                    source_group_id,
                    target_group_id,
                },
            )
            .await
    }

    /// Replace the order of cards within a group
    pub async fn reorder_cards(
        &self,
        project_id: &str,
        group_id: &str,
        card_ids: &[String],
    ) -> Result<Ack> {
        self.client
            .put(
                &format!("/projects/{}/groups/{}/cards/order", project_id, group_id),
                Some(project_id),
                &CardOrderBody { card_ids },
            )
            .await
    }

    /// Tag character names in one of a card's text fields
    ///
    /// The answer is HTML: the card's own name in `<span class="protagonist">`,
    /// every other character in `<strong>`.
    pub async fn highlight_names(
        &self,
        project_id: &str,
        card_id: &str,
        field_name: &str,
        text: &str,
    ) -> Result<String> {
        let highlighted: Highlighted = self
            .client
            .post(
                &format!("/projects/{}/cards/{}/highlight-names", project_id, card_id),
                Some(project_id),
                &HighlightBody {
                    field_name,
                    text_content: text,
                },
            )
            .await?;
        Ok(highlighted.highlighted_text)
    }

    /// Ask the AI to rewrite a card
    pub async fn edit_with_ai(
        &self,
        project_id: &str,
        card_id: &str,
        params: &CardAiEditParams,
    ) -> Result<AiCardEdits> {
        self.client
            .put(
                &format!("/projects/{}/cards/{}/edit-with-ai", project_id, card_id),
                Some(project_id),
                params,
            )
            .await
    }
}
