//! Scenario and plot point operations

use serde::Serialize;

use crate::api::client::{Ack, ApiClient};
use crate::core::models::{PlotPoint, Scenario};
use crate::error::Result;

/// Default number of plot points requested from the draft generator
pub const DEFAULT_PLOT_POINT_COUNT: u32 = 10;

/// Editable scenario fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioUpdate {
    pub title: String,
    pub summary: String,
    pub synopsis: String,
    pub themes: Vec<String>,
}

/// Parameters for the scenario draft generator
#[derive(Debug, Clone, Serialize)]
pub struct DraftParams {
    pub character_ids: Vec<String>,
    pub plot_point_count: u32,
    pub model_name: String,
}

/// Parameters for an AI edit of a plot point
#[derive(Debug, Clone, Serialize)]
pub struct PlotPointAiEditParams {
    pub user_prompt: String,
    pub character_ids: Vec<String>,
    pub model_name: String,
}

#[derive(Serialize)]
struct PlotPointBody<'a> {
    title: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ModelBody<'a> {
    model_name: &'a str,
}

/// Scenario operations handler
pub struct ScenarioHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> ScenarioHandler<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn plot_point_path(project_id: &str, plot_point_id: &str) -> String {
        format!("/projects/{}/scenarios/plot_points/{}", project_id, plot_point_id)
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<Scenario>> {
        self.client
            .get(&format!("/projects/{}/scenarios", project_id), Some(project_id))
            .await
    }

    pub async fn update(
        &self,
        project_id: &str,
        scenario_id: &str,
        update: &ScenarioUpdate,
    ) -> Result<Scenario> {
        self.client
            .put(
                &format!("/projects/{}/scenarios/{}", project_id, scenario_id),
                Some(project_id),
                update,
            )
            .await
    }

    /// Replace the plot with an AI-generated draft
    pub async fn generate_draft(
        &self,
        project_id: &str,
        scenario_id: &str,
        params: &DraftParams,
    ) -> Result<Scenario> {
        self.client
            .post(
                &format!("/projects/{}/scenarios/{}/generate-draft", project_id, scenario_id),
                Some(project_id),
                params,
            )
            .await
    }

    pub async fn create_plot_point(
        &self,
        project_id: &str,
        scenario_id: &str,
        title: &str,
        content: &str,
    ) -> Result<PlotPoint> {
        self.client
            .post(
                &format!("/projects/{}/scenarios/{}/plot_points", project_id, scenario_id),
                Some(project_id),
                &PlotPointBody { title, content },
            )
            .await
    }

    pub async fn update_plot_point(
        &self,
        project_id: &str,
        plot_point_id: &str,
        title: &str,
        content: &str,
    ) -> Result<PlotPoint> {
        self.client
            .put(
                &Self::plot_point_path(project_id, plot_point_id),
                Some(project_id),
                &PlotPointBody { title, content },
            )
            .await
    }

    pub async fn delete_plot_point(&self, project_id: &str, plot_point_id: &str) -> Result<Ack> {
        self.client
            .delete(&Self::plot_point_path(project_id, plot_point_id), Some(project_id))
            .await
    }

    pub async fn edit_plot_point_with_ai(
        &self,
        project_id: &str,
        plot_point_id: &str,
        params: &PlotPointAiEditParams,
    ) -> Result<PlotPoint> {
        self.client
            .put(
                &format!("{}/edit-with-ai", Self::plot_point_path(project_id, plot_point_id)),
                Some(project_id),
                params,
            )
            .await
    }

    /// Write a scene draft for a plot point
    pub async fn generate_scene(
        &self,
        project_id: &str,
        plot_point_id: &str,
        model_name: &str,
    ) -> Result<PlotPoint> {
        self.client
            .post(
                &format!("{}/generate-scene", Self::plot_point_path(project_id, plot_point_id)),
                Some(project_id),
                &ModelBody { model_name },
            )
            .await
    }
}
