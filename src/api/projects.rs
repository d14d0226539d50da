//! Project operations

use serde::Serialize;

use crate::api::client::{Ack, ApiClient};
use crate::core::models::{Project, ProjectList, ProjectSummary};
use crate::error::Result;

/// Parameters for creating a project
#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectParams {
    pub name: String,
    /// Optional password protecting the project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    name: &'a str,
}

/// Project operations handler
pub struct ProjectHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> ProjectHandler<'a> {
    /// Create a new handler
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// List every project on the server
    pub async fn list(&self) -> Result<Vec<ProjectSummary>> {
        let list: ProjectList = self.client.get("/projects", None).await?;
        Ok(list.projects)
    }

    /// Fetch a project with its groups and worldview
    pub async fn get(&self, project_id: &str) -> Result<Project> {
        self.client
            .get(&format!("/projects/{}", project_id), Some(project_id))
            .await
    }

    /// Create a project
    pub async fn create(&self, params: &CreateProjectParams) -> Result<ProjectSummary> {
        self.client.post("/projects", None, params).await
    }

    /// Rename a project
    pub async fn rename(&self, project_id: &str, name: &str) -> Result<ProjectSummary> {
        self.client
            .put(
                &format!("/projects/{}", project_id),
                Some(project_id),
                &RenameBody { name },
            )
            .await
    }

    /// Delete a project
    pub async fn delete(&self, project_id: &str) -> Result<Ack> {
        self.client
            .delete(&format!("/projects/{}", project_id), Some(project_id))
            .await
    }
}
