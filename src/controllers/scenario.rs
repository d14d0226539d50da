//! Scenario form, plot points and AI drafting

use crate::api::{ApiClient, DraftParams, PlotPointAiEditParams, ScenarioHandler, ScenarioUpdate};
use crate::controllers::{ensure_valid, Done, Scope};
use crate::core::models::join_tags;
use crate::error::{LoomError, Result};
use crate::core::limits::{NAME_MAX, PLOT_POINTS_MAX, PROMPT_MAX, THEMES_MAX, TITLE_MAX};
use crate::view::validation::{int_range, max_length, tag_list, FieldRule};

pub const TEXT_MAX: usize = 5000;

pub struct ScenarioController<'a> {
    client: &'a ApiClient,
    scope: &'a Scope,
}

impl<'a> ScenarioController<'a> {
    pub fn new(client: &'a ApiClient, scope: &'a Scope) -> Self {
        Self { client, scope }
    }

    fn handler(&self) -> ScenarioHandler<'a> {
        ScenarioHandler::new(self.client)
    }

    pub async fn save(&self, scenario_id: &str, update: &ScenarioUpdate) -> Result<Done> {
        ensure_valid(&[
            FieldRule::new("Title", update.title.as_str(), max_length(TITLE_MAX)).required(),
            FieldRule::new("Summary", update.summary.as_str(), max_length(TEXT_MAX)),
            FieldRule::new("Synopsis", update.synopsis.as_str(), max_length(TEXT_MAX)),
            FieldRule::new("Themes", join_tags(&update.themes), tag_list(THEMES_MAX, 30)),
        ])?;

        self.handler()
            .update(&self.scope.project_id, scenario_id, update)
            .await?;
        Ok(Done::project("Scenario saved"))
    }

    /// Replace the plot with a generated draft of `count` plot points
    pub async fn generate_draft(&self, scenario_id: &str, count: &str) -> Result<Done> {
        ensure_valid(&[FieldRule::new("Plot points", count, int_range(1, PLOT_POINTS_MAX)).required()])?;
        let plot_point_count: u32 = count
            .trim()
            .parse()
            .map_err(|_| LoomError::InvalidInput("Plot points: Enter a whole number.".to_string()))?;

        let params = DraftParams {
            character_ids: self.scope.card_ids.clone(),
            plot_point_count,
            model_name: self.scope.model.api_name().to_string(),
        };
        let scenario = self
            .handler()
            .generate_draft(&self.scope.project_id, scenario_id, &params)
            .await?;
        Ok(Done::project(format!(
            "Drafted {} plot points",
            scenario.plot_points.len()
        )))
    }

    /// Create a plot point when `plot_point_id` is `None`, otherwise update it
    pub async fn save_plot_point(
        &self,
        scenario_id: &str,
        plot_point_id: Option<&str>,
        title: &str,
        content: &str,
    ) -> Result<Done> {
        ensure_valid(&[
            FieldRule::new("Title", title, max_length(NAME_MAX)).required(),
            FieldRule::new("Content", content, max_length(TEXT_MAX)),
        ])?;

        let project_id = &self.scope.project_id;
        match plot_point_id {
            Some(id) => {
                self.handler()
                    .update_plot_point(project_id, id, title, content)
                    .await?
            }
            None => {
                self.handler()
                    .create_plot_point(project_id, scenario_id, title, content)
                    .await?
            }
        };
        Ok(Done::project(format!("Saved \"{}\"", title)))
    }

    pub async fn delete_plot_point(&self, plot_point_id: &str) -> Result<Done> {
        self.handler()
            .delete_plot_point(&self.scope.project_id, plot_point_id)
            .await?;
        Ok(Done::project("Plot point deleted"))
    }

    pub async fn edit_plot_point_with_ai(&self, plot_point_id: &str, prompt: &str) -> Result<Done> {
        let prompt = prompt.trim();
        ensure_valid(&[FieldRule::new("Prompt", prompt, max_length(PROMPT_MAX)).required()])?;

        let params = PlotPointAiEditParams {
            user_prompt: prompt.to_string(),
            character_ids: self.scope.card_ids.clone(),
            model_name: self.scope.model.api_name().to_string(),
        };
        let point = self
            .handler()
            .edit_plot_point_with_ai(&self.scope.project_id, plot_point_id, &params)
            .await?;
        Ok(Done::project(format!("Rewrote \"{}\"", point.title)))
    }

    pub async fn generate_scene(&self, plot_point_id: &str) -> Result<Done> {
        let point = self
            .handler()
            .generate_scene(
                &self.scope.project_id,
                plot_point_id,
                self.scope.model.api_name(),
            )
            .await?;
        Ok(Done::project(format!("Scene drafted for \"{}\"", point.title)))
    }
}
