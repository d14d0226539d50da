//! Worldview settings, setting cards and AI generation

use crate::api::{ApiClient, GenerateHandler, WorldviewAiEditParams, WorldviewHandler, WorldviewLevel};
use crate::controllers::{ensure_valid, Done, Refresh, Scope};
use crate::core::models::Worldview;
use crate::error::Result;
use crate::core::limits::{GENRE_MAX, LOGLINE_MAX, NAME_MAX, PROMPT_MAX, RULE_MAX};
use crate::view::validation::{max_length, FieldRule};

/// Form field the generated worldview text is put into
pub const LOGLINE_FIELD: &str = "wv-logline";
pub const CONTENT_MAX: usize = 5000;

pub struct WorldviewController<'a> {
    client: &'a ApiClient,
    scope: &'a Scope,
}

impl<'a> WorldviewController<'a> {
    pub fn new(client: &'a ApiClient, scope: &'a Scope) -> Self {
        Self { client, scope }
    }

    fn handler(&self) -> WorldviewHandler<'a> {
        WorldviewHandler::new(self.client)
    }

    pub async fn save(&self, worldview: &Worldview) -> Result<Done> {
        let mut rules = vec![
            FieldRule::new("Logline", worldview.logline.as_str(), max_length(LOGLINE_MAX)).required(),
            FieldRule::new("Genre", worldview.genre.as_str(), max_length(GENRE_MAX)),
        ];
        rules.extend(
            worldview
                .rules
                .iter()
                .enumerate()
                .map(|(i, rule)| FieldRule::new(format!("Rule {}", i + 1), rule.as_str(), max_length(RULE_MAX))),
        );
        ensure_valid(&rules)?;

        self.handler().save(&self.scope.project_id, worldview).await?;
        Ok(Done::project("Worldview saved"))
    }

    /// Generate worldview text and put it into the logline field
    ///
    /// Nothing is saved; the user reviews the text and saves the form.
    pub async fn generate(&self, keywords: &str, edit_existing: bool) -> Result<Done> {
        let keywords = keywords.trim();
        ensure_valid(&[FieldRule::new("Keywords", keywords, max_length(PROMPT_MAX)).required()])?;

        let generator = GenerateHandler::new(self.client);
        let model = self.scope.model.api_name();
        let text = if edit_existing {
            generator
                .edit_worldview(keywords, &self.scope.worldview_text, model)
                .await?
        } else {
            generator.new_worldview(keywords, model).await?
        };

        Ok(Done::new("Worldview generated. Review it and save.", Refresh::Nothing)
            .with_fill(LOGLINE_FIELD, text))
    }

    pub async fn create_group(&self, name: &str) -> Result<Done> {
        let name = name.trim();
        ensure_valid(&[FieldRule::new("Group name", name, max_length(NAME_MAX)).required()])?;

        self.handler().create_group(&self.scope.project_id, name).await?;
        Ok(Done::project(format!("Setting group \"{}\" created", name)))
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<Done> {
        self.handler()
            .delete_group(&self.scope.project_id, group_id)
            .await?;
        Ok(Done::project("Setting group deleted"))
    }

    /// Create a card when `card_id` is `None`, otherwise update it
    pub async fn save_card(
        &self,
        group_id: &str,
        card_id: Option<&str>,
        title: &str,
        content: &str,
    ) -> Result<Done> {
        ensure_valid(&[
            FieldRule::new("Title", title, max_length(NAME_MAX)).required(),
            FieldRule::new("Content", content, max_length(CONTENT_MAX)),
        ])?;

        let project_id = &self.scope.project_id;
        match card_id {
            Some(card_id) => {
                self.handler()
                    .update_card(project_id, card_id, title, content)
                    .await?;
            }
            None => {
                self.handler()
                    .create_card(project_id, group_id, title, content)
                    .await?;
            }
        }
        Ok(Done::project(format!("Saved \"{}\"", title)))
    }

    pub async fn delete_card(&self, card_id: &str) -> Result<Done> {
        self.handler()
            .delete_card(&self.scope.project_id, card_id)
            .await?;
        Ok(Done::project("Setting card deleted"))
    }

    /// Ask the AI to rewrite a setting card and apply what it proposes
    pub async fn edit_with_ai(&self, card_id: &str, prompt: &str) -> Result<Done> {
        let prompt = prompt.trim();
        ensure_valid(&[FieldRule::new("Prompt", prompt, max_length(PROMPT_MAX)).required()])?;

        let params = WorldviewAiEditParams {
            prompt_text: prompt.to_string(),
            model_name: self.scope.model.api_name().to_string(),
            selected_card_ids: self
                .scope
                .worldview_card_ids
                .iter()
                .filter(|id| id.as_str() != card_id)
                .cloned()
                .collect(),
            worldview_level: WorldviewLevel::Medium,
            edit_related_cards: false,
        };

        let project_id = &self.scope.project_id;
        let edits = self.handler().edit_with_ai(project_id, card_id, &params).await?;
        for card in &edits.updated_cards {
            self.handler().apply_ai_card(project_id, card).await?;
        }
        Ok(Done::project(if edits.updated_cards.is_empty() {
            "The AI proposed no changes"
        } else {
            "Applied the AI edit"
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{MockTransport, RawResponse};
    use crate::controllers::testing::client_with;
    use serde_json::json;

    fn scope() -> Scope {
        Scope {
            project_id: "p1".into(),
            worldview_text: "Drifting islands".into(),
            worldview_card_ids: vec!["w1".into(), "w2".into()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_requires_logline() {
        let client = client_with(MockTransport::new());
        let scope = scope();
        let err = WorldviewController::new(&client, &scope)
            .save(&Worldview::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Logline: This field is required.");
    }

    #[tokio::test]
    async fn test_refine_sends_existing_text_and_fills_logline() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/generate/worldview/edit"
                    && req.body.as_ref().unwrap()["existing_content"] == "Drifting islands"
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(200, &json!({"worldview_text": "Drifting islands, now with storms"})))
                })
            });

        let client = client_with(mock);
        let scope = scope();
        let done = WorldviewController::new(&client, &scope)
            .generate("storms", true)
            .await
            .unwrap();

        assert_eq!(done.refresh, Refresh::Nothing);
        assert!(!done.keep_modal);
        let fill = &done.fills[0];
        assert_eq!(fill.field_id, LOGLINE_FIELD);
        assert_eq!(fill.value, "Drifting islands, now with storms");
    }

    #[tokio::test]
    async fn test_ai_edit_applies_title_and_content() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1/worldview_cards/w1/edit-with-ai"
                    && req.body.as_ref().unwrap()["selected_card_ids"] == json!(["w2"])
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({"updated_cards": [{"id": "w1", "title": "Harbor", "content": "Now flooded"}]}),
                    ))
                })
            });
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1/worldview_cards/w1"
                    && req.body == Some(json!({"title": "Harbor", "content": "Now flooded"}))
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!({}))) }));

        let client = client_with(mock);
        let scope = scope();
        let done = WorldviewController::new(&client, &scope)
            .edit_with_ai("w1", "flood it")
            .await
            .unwrap();
        assert_eq!(done.message, "Applied the AI edit");
    }
}
