//! Character groups, cards and AI generation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::{
    ApiClient, CardAiEditParams, CharacterHandler, CharacterRequest, GenerateHandler,
    WorldviewLevel,
};
use crate::controllers::{ensure_valid, Done, Refresh, Scope};
use crate::core::models::{join_tags, CardDraft};
use crate::error::{LoomError, Result};
use crate::core::limits::{DESCRIPTION_MAX, MAX_TAGS, NAME_MAX, PROMPT_MAX, TAG_MAX};
use crate::view::validation::{max_length, tag_list, FieldRule};

/// Card detail area the marked-up introduction is written into
pub const HIGHLIGHT_FIELD: &str = "f-highlighted";
/// Card field sent for name highlighting
const HIGHLIGHT_SOURCE: &str = "introduction_story";

static PROTAGONIST_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<span\s+class="protagonist"\s*>(.*?)</span>"#)
        .expect("Invalid regex pattern for protagonist tag")
});
static OTHER_NAME_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<strong\s*>(.*?)</strong>").expect("Invalid regex pattern for name tag")
});
static ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("Invalid regex pattern for tags"));

pub struct CharacterController<'a> {
    client: &'a ApiClient,
    scope: &'a Scope,
}

impl<'a> CharacterController<'a> {
    pub fn new(client: &'a ApiClient, scope: &'a Scope) -> Self {
        Self { client, scope }
    }

    fn handler(&self) -> CharacterHandler<'a> {
        CharacterHandler::new(self.client)
    }

    pub async fn create_group(&self, name: &str) -> Result<Done> {
        let name = name.trim();
        ensure_valid(&[FieldRule::new("Group name", name, max_length(NAME_MAX)).required()])?;

        self.handler().create_group(&self.scope.project_id, name).await?;
        Ok(Done::project(format!("Group \"{}\" created", name)))
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<Done> {
        self.handler()
            .delete_group(&self.scope.project_id, group_id)
            .await?;
        Ok(Done::project("Group deleted"))
    }

    /// Create a card when `card_id` is `None`, otherwise update it
    pub async fn save_card(&self, group_id: &str, card_id: Option<&str>, draft: &CardDraft) -> Result<Done> {
        validate_draft(draft)?;

        let project_id = &self.scope.project_id;
        match card_id {
            Some(card_id) => {
                self.handler().update_card(project_id, card_id, draft).await?;
                Ok(Done::project(format!("Saved \"{}\"", draft.name)))
            }
            None => {
                let card = self.handler().create_card(project_id, group_id, draft).await?;
                Ok(Done::project(format!("Created \"{}\"", card.name)))
            }
        }
    }

    pub async fn delete_card(&self, group_id: &str, card_id: &str) -> Result<Done> {
        self.handler()
            .delete_card(&self.scope.project_id, group_id, card_id)
            .await?;
        Ok(Done::project("Character deleted"))
    }

    /// Validate generation input and build the request for this project
    ///
    /// Fails before anything is generated when there is no group to save into.
    pub fn generation_request(&self, keywords: &str) -> Result<CharacterRequest> {
        let keywords = keywords.trim();
        ensure_valid(&[FieldRule::new("Keywords", keywords, max_length(PROMPT_MAX)).required()])?;
        self.landing_group()?;
        Ok(character_request(self.scope, keywords))
    }

    fn landing_group(&self) -> Result<&'a str> {
        self.scope
            .landing_group_id
            .as_deref()
            .ok_or_else(|| LoomError::InvalidInput("Create a group first.".to_string()))
    }

    /// Generate a character and save it into the landing group
    pub async fn generate(&self, keywords: &str) -> Result<Done> {
        let request = self.generation_request(keywords)?;
        let draft = GenerateHandler::new(self.client)
            .character(&self.scope.project_id, &request)
            .await?;
        self.save_generated(&draft).await
    }

    /// Save a generated draft into the landing group
    pub async fn save_generated(&self, draft: &CardDraft) -> Result<Done> {
        let group_id = self.landing_group()?;
        self.save_card(group_id, None, draft).await
    }

    /// Mark character names in a card's introduction
    ///
    /// The result goes into the detail view; the card itself is unchanged.
    pub async fn highlight_names(&self, card_id: &str, text: &str) -> Result<Done> {
        if text.trim().is_empty() {
            return Err(LoomError::InvalidInput(
                "This character has no introduction to highlight.".to_string(),
            ));
        }
        let html = self
            .handler()
            .highlight_names(&self.scope.project_id, card_id, HIGHLIGHT_SOURCE, text)
            .await?;
        Ok(Done::new("Names highlighted", Refresh::Nothing)
            .with_fill(HIGHLIGHT_FIELD, mark_names(&html))
            .keeping_modal())
    }

    /// Ask the AI to rewrite a card and apply every card it proposes
    pub async fn edit_with_ai(
        &self,
        card_id: &str,
        prompt: &str,
        worldview_level: WorldviewLevel,
        edit_related: bool,
    ) -> Result<Done> {
        let prompt = prompt.trim();
        ensure_valid(&[FieldRule::new("Prompt", prompt, max_length(PROMPT_MAX)).required()])?;

        let params = CardAiEditParams {
            prompt_text: prompt.to_string(),
            model_name: self.scope.model.api_name().to_string(),
            selected_card_ids: self
                .scope
                .card_ids
                .iter()
                .filter(|id| id.as_str() != card_id)
                .cloned()
                .collect(),
            worldview_level,
            edit_related_characters: edit_related,
        };

        let project_id = &self.scope.project_id;
        let edits = self.handler().edit_with_ai(project_id, card_id, &params).await?;
        for card in &edits.updated_cards {
            self.handler().update_card_raw(project_id, card).await?;
        }
        tracing::debug!("Applied {} AI card edits", edits.updated_cards.len());

        Ok(Done::project(match edits.updated_cards.len() {
            0 => "The AI proposed no changes".to_string(),
            1 => "Applied the AI edit".to_string(),
            n => format!("Applied AI edits to {} characters", n),
        }))
    }
}

/// Generation request carrying the project's cast and worldview as context
pub fn character_request(scope: &Scope, keywords: &str) -> CharacterRequest {
    let worldview_context = Some(scope.worldview_text.clone()).filter(|t| !t.is_empty());
    CharacterRequest {
        keywords: keywords.trim().to_string(),
        character_ids: scope.card_ids.clone(),
        worldview_card_ids: scope.worldview_card_ids.clone(),
        worldview_level: if worldview_context.is_some() {
            WorldviewLevel::Medium
        } else {
            WorldviewLevel::None
        },
        worldview_context,
        model_name: Some(scope.model.api_name().to_string()),
    }
}

/// Turn highlight markup into terminal text: `«name»` for the card's own
/// name, `*name*` for other characters. Any other tag is dropped.
pub fn mark_names(html: &str) -> String {
    let text = PROTAGONIST_TAG.replace_all(html, "«$1»");
    let text = OTHER_NAME_TAG.replace_all(&text, "*$1*");
    let text = ANY_TAG.replace_all(&text, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn validate_draft(draft: &CardDraft) -> Result<()> {
    let tags = |field: &str, values: &[String]| {
        FieldRule::new(field, join_tags(values), tag_list(MAX_TAGS, TAG_MAX))
    };
    ensure_valid(&[
        FieldRule::new("Name", draft.name.trim(), max_length(NAME_MAX)).required(),
        FieldRule::new("Description", draft.description.as_str(), max_length(DESCRIPTION_MAX)),
        tags("Goals", &draft.goal),
        tags("Personality", &draft.personality),
        tags("Abilities", &draft.abilities),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{MockTransport, RawResponse};
    use crate::controllers::testing::client_with;
    use crate::core::config::AiModel;
    use serde_json::json;

    fn scope() -> Scope {
        Scope {
            project_id: "p1".into(),
            model: AiModel::Flash,
            card_ids: vec!["c1".into(), "c2".into()],
            landing_group_id: Some("g0".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_server() {
        let client = client_with(MockTransport::new());
        let scope = scope();
        let err = CharacterController::new(&client, &scope)
            .save_card("g1", None, &CardDraft::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Name: This field is required.");
    }

    #[tokio::test]
    async fn test_save_card_without_id_creates() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.method == reqwest::Method::POST && req.path == "/projects/p1/groups/g1/cards")
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(200, &json!({"message": "ok", "card": {"id": "c9", "name": "Bren"}})))
                })
            });

        let client = client_with(mock);
        let scope = scope();
        let done = CharacterController::new(&client, &scope)
            .save_card(
                "g1",
                None,
                &CardDraft {
                    name: "Bren".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(done.message, "Created \"Bren\"");
    }

    #[tokio::test]
    async fn test_ai_edit_applies_each_proposed_card() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                let body = req.body.as_ref().unwrap();
                req.path == "/projects/p1/cards/c1/edit-with-ai"
                    && body["model_name"] == "gemini-2.5-flash"
                    && body["selected_card_ids"] == json!(["c2"])
                    && body["worldview_level"] == "high"
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({"updated_cards": [
                            {"id": "c1", "name": "Aria", "goal": ["fly"]},
                            {"id": "c2", "name": "Bren"}
                        ]}),
                    ))
                })
            });
        mock.expect_send()
            .withf(|req| req.method == reqwest::Method::PUT && req.path == "/projects/p1/cards/c1")
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!({}))) }));
        mock.expect_send()
            .withf(|req| req.method == reqwest::Method::PUT && req.path == "/projects/p1/cards/c2")
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!({}))) }));

        let client = client_with(mock);
        let scope = scope();
        let done = CharacterController::new(&client, &scope)
            .edit_with_ai("c1", "Make them rivals", WorldviewLevel::High, true)
            .await
            .unwrap();
        assert_eq!(done.message, "Applied AI edits to 2 characters");
    }

    #[tokio::test]
    async fn test_generate_saves_into_landing_group() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.path == "/projects/p1/generate/character")
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({"name": "Cass", "description": "A diver", "goal": "find the bell"}),
                    ))
                })
            });
        mock.expect_send()
            .withf(|req| req.path == "/projects/p1/groups/g0/cards")
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(200, &json!({"message": "ok", "card": {"id": "c3", "name": "Cass"}})))
                })
            });

        let client = client_with(mock);
        let scope = scope();
        let done = CharacterController::new(&client, &scope)
            .generate("pearl diver")
            .await
            .unwrap();
        assert_eq!(done.message, "Created \"Cass\"");
    }

    #[test]
    fn test_mark_names_replaces_tags() {
        let html = "<span class=\"protagonist\">Aria는</span> <strong>Bren</strong>과 \
                    <em>함께</em> 떠났다 &amp; 돌아왔다.";
        assert_eq!(mark_names(html), "«Aria는» *Bren*과 함께 떠났다 & 돌아왔다.");
    }

    #[tokio::test]
    async fn test_highlight_names_fills_detail_area() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1/cards/c1/highlight-names"
                    && req.body.as_ref().unwrap()["field_name"] == "introduction_story"
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({"highlighted_text": "<span class=\"protagonist\">Aria</span> met <strong>Bren</strong>."}),
                    ))
                })
            });

        let client = client_with(mock);
        let scope = scope();
        let done = CharacterController::new(&client, &scope)
            .highlight_names("c1", "Aria met Bren.")
            .await
            .unwrap();
        assert!(done.keep_modal);
        assert_eq!(done.fills[0].field_id, HIGHLIGHT_FIELD);
        assert_eq!(done.fills[0].value, "«Aria» met *Bren*.");
    }

    #[tokio::test]
    async fn test_highlight_needs_text() {
        let client = client_with(MockTransport::new());
        let scope = scope();
        let err = CharacterController::new(&client, &scope)
            .highlight_names("c1", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, LoomError::InvalidInput(_)));
    }

    #[test]
    fn test_request_without_worldview_uses_level_none() {
        let request = character_request(&scope(), " rogue ");
        assert_eq!(request.keywords, "rogue");
        assert_eq!(request.worldview_level, WorldviewLevel::None);
        assert!(request.worldview_context.is_none());
        assert_eq!(request.model_name.as_deref(), Some("gemini-2.5-flash"));
    }

    #[tokio::test]
    async fn test_generation_needs_a_group() {
        let client = client_with(MockTransport::new());
        let scope = Scope {
            landing_group_id: None,
            ..scope()
        };
        let err = CharacterController::new(&client, &scope)
            .generation_request("rogue")
            .unwrap_err();
        assert_eq!(err.to_string(), "Create a group first.");
    }
}
