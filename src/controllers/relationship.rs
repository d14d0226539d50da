//! Character relationships and AI suggestions

use crate::api::{ApiClient, NewRelationship, RelationshipHandler, SuggestParams};
use crate::controllers::{ensure_valid, Done, Refresh, Scope};
use crate::core::limits::{DESCRIPTION_MAX, NAME_MAX, PROMPT_MAX, TENDENCY_MAX, TENDENCY_MIN};
use crate::error::{LoomError, Result};
use crate::view::validation::{int_range, max_length, FieldRule};

/// Relationship form fields a suggestion is written into
pub const TYPE_FIELD: &str = "f-type";
pub const DESCRIPTION_FIELD: &str = "f-description";

pub struct RelationshipController<'a> {
    client: &'a ApiClient,
    scope: &'a Scope,
}

impl<'a> RelationshipController<'a> {
    pub fn new(client: &'a ApiClient, scope: &'a Scope) -> Self {
        Self { client, scope }
    }

    fn handler(&self) -> RelationshipHandler<'a> {
        RelationshipHandler::new(self.client)
    }

    /// Both ends must be distinct characters of the open project
    fn check_pair(&self, source: &str, target: &str) -> Result<()> {
        let known = |id: &str| self.scope.card_ids.iter().any(|c| c == id);
        if !known(source) || !known(target) {
            return Err(LoomError::InvalidInput(
                "Choose two existing characters.".to_string(),
            ));
        }
        if source == target {
            return Err(LoomError::InvalidInput(
                "A character cannot have a relationship with itself.".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a relationship when `relationship_id` is `None`, otherwise
    /// update its type and description (the ends never change)
    pub async fn save(
        &self,
        relationship_id: Option<&str>,
        source: &str,
        target: &str,
        kind: &str,
        description: &str,
    ) -> Result<Done> {
        let kind = kind.trim();
        let description = description.trim();
        ensure_valid(&[
            FieldRule::new("Type", kind, max_length(NAME_MAX)).required(),
            FieldRule::new("Description", description, max_length(DESCRIPTION_MAX)),
        ])?;
        let description = (!description.is_empty()).then_some(description);

        let project_id = &self.scope.project_id;
        match relationship_id {
            Some(id) => {
                self.handler()
                    .update(project_id, id, kind, description)
                    .await?;
                Ok(Done::project("Relationship saved"))
            }
            None => {
                self.check_pair(source, target)?;
                let created = self
                    .handler()
                    .create(
                        project_id,
                        &NewRelationship {
                            source_character_id: source.to_string(),
                            target_character_id: target.to_string(),
                            kind: kind.to_string(),
                            description: description.map(str::to_string),
                        },
                    )
                    .await?;
                Ok(Done::project(format!("Relationship \"{}\" created", created.kind)))
            }
        }
    }

    pub async fn delete(&self, relationship_id: &str) -> Result<Done> {
        self.handler()
            .delete(&self.scope.project_id, relationship_id)
            .await?;
        Ok(Done::project("Relationship deleted"))
    }

    /// Ask the AI for a relationship and write it into the open form
    ///
    /// An empty tendency means neutral. Nothing is saved.
    pub async fn suggest(&self, source: &str, target: &str, tendency: &str, keyword: &str) -> Result<Done> {
        let tendency = match tendency.trim() {
            "" => "0",
            value => value,
        };
        let keyword = keyword.trim();
        ensure_valid(&[
            FieldRule::new("Tendency", tendency, int_range(TENDENCY_MIN, TENDENCY_MAX)),
            FieldRule::new("Keyword", keyword, max_length(PROMPT_MAX)),
        ])?;
        self.check_pair(source, target)?;

        let tendency: i64 = tendency
            .parse()
            .map_err(|_| LoomError::InvalidInput("Tendency: Enter a whole number.".to_string()))?;
        let params = SuggestParams {
            source_character_id: source.to_string(),
            target_character_id: target.to_string(),
            tendency,
            keyword: (!keyword.is_empty()).then(|| keyword.to_string()),
        };

        let suggestion = self
            .handler()
            .suggest(&self.scope.project_id, &params)
            .await?;
        tracing::debug!("Relationship suggestion: {}", suggestion.kind);

        Ok(Done::new("Suggestion ready. Review it and save.", Refresh::Nothing)
            .with_fill(TYPE_FIELD, suggestion.kind)
            .with_fill(DESCRIPTION_FIELD, suggestion.description)
            .keeping_modal())
    }
}
