//! Feature controllers
//!
//! This module provides:
//! - One controller per workspace feature, each validating input and then
//!   calling the API client
//! - [`Done`], the outcome the UI turns into a toast and a refresh
//! - [`run`], which routes a remote [`Intent`] to its controller
//!
//! Controllers borrow the client the same way the API handlers do and hold
//! no state of their own, so the UI builds them inside the task that runs
//! the request.

pub mod character;
pub mod manuscript;
pub mod project;
pub mod relationship;
pub mod reorder;
pub mod scenario;
pub mod worldview;

pub use character::CharacterController;
pub use manuscript::ManuscriptController;
pub use project::ProjectController;
pub use relationship::RelationshipController;
pub use reorder::ReorderController;
pub use scenario::ScenarioController;
pub use worldview::WorldviewController;

use crate::api::ApiClient;
use crate::core::config::AiModel;
use crate::core::models::{Project, Worldview, UNCATEGORIZED_GROUP};
use crate::error::{LoomError, Result};
use crate::view::intent::Intent;
use crate::view::validation::{validate_form, FieldRule};

/// What the UI should reload after a successful call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Nothing,
    Projects,
    Project,
}

/// A value to put into a form field once the call returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    pub field_id: String,
    pub value: String,
}

/// Successful outcome of a controller call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Done {
    pub message: String,
    pub refresh: Refresh,
    /// Applied in order; the first filled field takes focus
    pub fills: Vec<Fill>,
    /// Leave the open modal up (its fields are being filled)
    pub keep_modal: bool,
}

impl Done {
    pub fn new(message: impl Into<String>, refresh: Refresh) -> Self {
        Self {
            message: message.into(),
            refresh,
            fills: Vec::new(),
            keep_modal: false,
        }
    }

    /// Reload the open project afterwards
    pub fn project(message: impl Into<String>) -> Self {
        Self::new(message, Refresh::Project)
    }

    pub fn with_fill(mut self, field_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.fills.push(Fill {
            field_id: field_id.into(),
            value: value.into(),
        });
        self
    }

    pub fn keeping_modal(mut self) -> Self {
        self.keep_modal = true;
        self
    }
}

/// Reject a submission whose fields do not validate
pub(crate) fn ensure_valid(rules: &[FieldRule]) -> Result<()> {
    match validate_form(rules).first_error() {
        Some(message) => Err(LoomError::InvalidInput(message)),
        None => Ok(()),
    }
}

/// Project context a controller call runs in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub project_id: String,
    pub model: AiModel,
    /// Every character card, handed to the AI as context
    pub card_ids: Vec<String>,
    pub worldview_card_ids: Vec<String>,
    /// Main worldview as prose
    pub worldview_text: String,
    /// Where generated characters are saved
    pub landing_group_id: Option<String>,
}

impl Scope {
    pub fn new(project_id: impl Into<String>, model: AiModel) -> Self {
        Self {
            project_id: project_id.into(),
            model,
            ..Default::default()
        }
    }

    pub fn from_project(project: &Project, model: AiModel) -> Self {
        let landing_group_id = project
            .groups
            .iter()
            .find(|g| g.name == UNCATEGORIZED_GROUP)
            .or_else(|| project.groups.first())
            .map(|g| g.id.clone());

        Self {
            project_id: project.id.clone(),
            model,
            card_ids: project.all_cards().map(|c| c.id.clone()).collect(),
            worldview_card_ids: project
                .worldview_groups
                .iter()
                .flat_map(|g| g.worldview_cards.iter().map(|c| c.id.clone()))
                .collect(),
            worldview_text: worldview_text(&project.worldview),
            landing_group_id,
        }
    }
}

/// Flatten the worldview into the text the generators take as context
pub fn worldview_text(worldview: &Worldview) -> String {
    let mut parts = Vec::new();
    if !worldview.logline.trim().is_empty() {
        parts.push(worldview.logline.trim().to_string());
    }
    if !worldview.genre.trim().is_empty() {
        parts.push(format!("Genre: {}", worldview.genre.trim()));
    }
    if !worldview.rules.is_empty() {
        let rules: Vec<String> = worldview.rules.iter().map(|r| format!("- {}", r)).collect();
        parts.push(format!("Rules:\n{}", rules.join("\n")));
    }
    parts.join("\n\n")
}

/// Run a remote intent against its controller
///
/// Loading intents (`OpenProject`, `UnlockProject`, `Refresh`) and streamed
/// character generation have dedicated flows in the UI and are rejected here.
pub async fn run(client: &ApiClient, scope: &Scope, intent: Intent) -> Result<Done> {
    let project_id = scope.project_id.as_str();
    match intent {
        // Projects
        Intent::CreateProject { name, password } => {
            ProjectController::new(client)
                .create(&name, password.as_deref())
                .await
        }
        Intent::RenameProject { project_id, name } => {
            ProjectController::new(client).rename(&project_id, &name).await
        }
        Intent::DeleteProject { project_id } => {
            ProjectController::new(client).delete(&project_id).await
        }

        // Characters
        Intent::CreateGroup { name } => {
            CharacterController::new(client, scope)
                .create_group(&name)
                .await
        }
        Intent::DeleteGroup { group_id } => {
            CharacterController::new(client, scope)
                .delete_group(&group_id)
                .await
        }
        Intent::SaveCard {
            group_id,
            card_id,
            draft,
        } => {
            CharacterController::new(client, scope)
                .save_card(&group_id, card_id.as_deref(), &draft)
                .await
        }
        Intent::DeleteCard { group_id, card_id } => {
            CharacterController::new(client, scope)
                .delete_card(&group_id, &card_id)
                .await
        }
        Intent::GenerateCharacter { keywords } => {
            CharacterController::new(client, scope)
                .generate(&keywords)
                .await
        }
        Intent::AiEditCard {
            card_id,
            prompt,
            worldview_level,
            edit_related,
        } => {
            CharacterController::new(client, scope)
                .edit_with_ai(&card_id, &prompt, worldview_level, edit_related)
                .await
        }
        Intent::HighlightNames { card_id, text } => {
            CharacterController::new(client, scope)
                .highlight_names(&card_id, &text)
                .await
        }

        // Relationships
        Intent::SaveRelationship {
            relationship_id,
            source_character_id,
            target_character_id,
            kind,
            description,
        } => {
            RelationshipController::new(client, scope)
                .save(
                    relationship_id.as_deref(),
                    &source_character_id,
                    &target_character_id,
                    &kind,
                    &description,
                )
                .await
        }
        Intent::DeleteRelationship { relationship_id } => {
            RelationshipController::new(client, scope)
                .delete(&relationship_id)
                .await
        }
        Intent::SuggestRelationship {
            source_character_id,
            target_character_id,
            tendency,
            keyword,
        } => {
            RelationshipController::new(client, scope)
                .suggest(&source_character_id, &target_character_id, &tendency, &keyword)
                .await
        }

        // Worldview
        Intent::SaveWorldview(worldview) => {
            WorldviewController::new(client, scope).save(&worldview).await
        }
        Intent::GenerateWorldview {
            keywords,
            edit_existing,
        } => {
            WorldviewController::new(client, scope)
                .generate(&keywords, edit_existing)
                .await
        }
        Intent::CreateWorldviewGroup { name } => {
            WorldviewController::new(client, scope)
                .create_group(&name)
                .await
        }
        Intent::DeleteWorldviewGroup { group_id } => {
            WorldviewController::new(client, scope)
                .delete_group(&group_id)
                .await
        }
        Intent::SaveWorldviewCard {
            group_id,
            card_id,
            title,
            content,
        } => {
            WorldviewController::new(client, scope)
                .save_card(&group_id, card_id.as_deref(), &title, &content)
                .await
        }
        Intent::DeleteWorldviewCard { card_id } => {
            WorldviewController::new(client, scope)
                .delete_card(&card_id)
                .await
        }
        Intent::AiEditWorldviewCard { card_id, prompt } => {
            WorldviewController::new(client, scope)
                .edit_with_ai(&card_id, &prompt)
                .await
        }

        // Drag and drop
        Intent::ReorderCards { group_id, card_ids } => {
            ReorderController::new(client, project_id)
                .reorder_cards(&group_id, &card_ids)
                .await
        }
        Intent::MoveCard {
            card_id,
            source_group_id,
            target_group_id,
            card_ids,
        } => {
            ReorderController::new(client, project_id)
                .move_card(&card_id, &source_group_id, &target_group_id, &card_ids)
                .await
        }
        Intent::ReorderWorldviewCards { group_id, card_ids } => {
            ReorderController::new(client, project_id)
                .reorder_worldview_cards(&group_id, &card_ids)
                .await
        }
        Intent::MoveWorldviewCard {
            card_id,
            source_group_id,
            target_group_id,
            card_ids,
        } => {
            ReorderController::new(client, project_id)
                .move_worldview_card(&card_id, &source_group_id, &target_group_id, &card_ids)
                .await
        }
        Intent::ReorderBlocks { block_ids } => {
            ReorderController::new(client, project_id)
                .reorder_blocks(&block_ids)
                .await
        }

        // Scenario
        Intent::SaveScenario {
            scenario_id,
            update,
        } => {
            ScenarioController::new(client, scope)
                .save(&scenario_id, &update)
                .await
        }
        Intent::GenerateDraft {
            scenario_id,
            plot_point_count,
        } => {
            ScenarioController::new(client, scope)
                .generate_draft(&scenario_id, &plot_point_count)
                .await
        }
        Intent::SavePlotPoint {
            scenario_id,
            plot_point_id,
            title,
            content,
        } => {
            ScenarioController::new(client, scope)
                .save_plot_point(&scenario_id, plot_point_id.as_deref(), &title, &content)
                .await
        }
        Intent::DeletePlotPoint { plot_point_id } => {
            ScenarioController::new(client, scope)
                .delete_plot_point(&plot_point_id)
                .await
        }
        Intent::AiEditPlotPoint {
            plot_point_id,
            prompt,
        } => {
            ScenarioController::new(client, scope)
                .edit_plot_point_with_ai(&plot_point_id, &prompt)
                .await
        }
        Intent::GenerateScene { plot_point_id } => {
            ScenarioController::new(client, scope)
                .generate_scene(&plot_point_id)
                .await
        }

        // Manuscript
        Intent::ImportManuscript => ManuscriptController::new(client, project_id).import().await,
        Intent::ClearManuscript => ManuscriptController::new(client, project_id).clear().await,
        Intent::SaveBlock {
            block_id,
            title,
            content,
        } => {
            ManuscriptController::new(client, project_id)
                .save_block(&block_id, &title, &content)
                .await
        }

        other => Err(LoomError::Custom(format!(
            "{:?} is not handled by a controller",
            other
        ))),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::api::client::MockTransport;
    use crate::api::ApiClient;
    use crate::core::session::SessionStore;

    pub fn client_with(mock: MockTransport) -> ApiClient {
        ApiClient::with_transport(Arc::new(mock), SessionStore::new())
    }
}
