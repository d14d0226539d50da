//! Project list, unlock and loading

use crate::api::{ApiClient, CreateProjectParams, ManuscriptHandler, ProjectHandler, ScenarioHandler};
use crate::controllers::{ensure_valid, Done, Refresh};
use crate::core::models::{ProjectBundle, ProjectSummary};
use crate::error::{LoomError, Result};
use crate::core::limits::NAME_MAX;
use crate::view::validation::{max_length, required, FieldRule};

pub struct ProjectController<'a> {
    client: &'a ApiClient,
}

impl<'a> ProjectController<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<ProjectSummary>> {
        ProjectHandler::new(self.client).list().await
    }

    /// Fetch the project, its scenarios and its manuscript together
    pub async fn load_bundle(&self, project_id: &str) -> Result<ProjectBundle> {
        let projects = ProjectHandler::new(self.client);
        let scenarios = ScenarioHandler::new(self.client);
        let manuscript = ManuscriptHandler::new(self.client);

        let (project, scenarios, manuscript) = tokio::try_join!(
            projects.get(project_id),
            scenarios.list(project_id),
            manuscript.blocks(project_id),
        )?;
        tracing::debug!(
            "Loaded project {} ({} scenarios, {} blocks)",
            project_id,
            scenarios.len(),
            manuscript.len()
        );

        Ok(ProjectBundle {
            project,
            scenarios,
            manuscript,
        })
    }

    /// Open a project, asking for its password first when it is locked
    pub async fn open(&self, project_id: &str, protected: bool) -> Result<ProjectBundle> {
        if protected && !self.client.session().has_password(project_id) {
            return Err(LoomError::PasswordRequired(project_id.to_string()));
        }
        self.load_bundle(project_id).await
    }

    /// Cache `password` and load the project with it
    ///
    /// The password is forgotten again when the server refuses it.
    pub async fn unlock(&self, project_id: &str, password: &str) -> Result<ProjectBundle> {
        ensure_valid(&[FieldRule::new("Password", password, required()).required()])?;

        let session = self.client.session();
        session.set_password(project_id, password);
        match self.load_bundle(project_id).await {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                session.forget(project_id);
                Err(e)
            }
        }
    }

    pub async fn create(&self, name: &str, password: Option<&str>) -> Result<Done> {
        let name = name.trim();
        ensure_valid(&[FieldRule::new("Name", name, max_length(NAME_MAX)).required()])?;

        let params = CreateProjectParams {
            name: name.to_string(),
            password: password.filter(|p| !p.is_empty()).map(str::to_string),
        };
        let project = ProjectHandler::new(self.client).create(&params).await?;
        if let Some(password) = params.password.as_deref() {
            self.client.session().set_password(&project.id, password);
        }
        Ok(Done::new(format!("Created \"{}\"", project.name), Refresh::Projects))
    }

    pub async fn rename(&self, project_id: &str, name: &str) -> Result<Done> {
        let name = name.trim();
        ensure_valid(&[FieldRule::new("Name", name, max_length(NAME_MAX)).required()])?;

        ProjectHandler::new(self.client).rename(project_id, name).await?;
        Ok(Done::new(format!("Renamed to \"{}\"", name), Refresh::Projects))
    }

    pub async fn delete(&self, project_id: &str) -> Result<Done> {
        ProjectHandler::new(self.client).delete(project_id).await?;
        self.client.session().forget(project_id);
        Ok(Done::new("Project deleted", Refresh::Projects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{MockTransport, RawResponse, PASSWORD_HEADER};
    use crate::controllers::testing::client_with;
    use serde_json::json;

    fn bundle_mock(mock: &mut MockTransport, project_status: u16) {
        mock.expect_send()
            .withf(|req| req.path == "/projects/p1")
            .returning(move |_| {
                Box::pin(async move {
                    Ok(if project_status == 200 {
                        RawResponse::json(200, &json!({"id": "p1", "name": "Saga", "is_password_protected": true}))
                    } else {
                        RawResponse::json(project_status, &json!({"detail": "Wrong password"}))
                    })
                })
            });
        mock.expect_send()
            .withf(|req| req.path == "/projects/p1/scenarios")
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!([]))) }));
        mock.expect_send()
            .withf(|req| req.path == "/projects/p1/manuscript/blocks")
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!([]))) }));
    }

    #[tokio::test]
    async fn test_open_locked_project_without_password() {
        let client = client_with(MockTransport::new());
        let err = ProjectController::new(&client).open("p1", true).await.unwrap_err();
        assert!(matches!(err, LoomError::PasswordRequired(id) if id == "p1"));
    }

    #[tokio::test]
    async fn test_unlock_sends_password_and_keeps_it() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.path == "/projects/p1" && req.header(PASSWORD_HEADER) == Some("hunter2"))
            .times(1)
            .returning(|_| {
                Box::pin(async { Ok(RawResponse::json(200, &json!({"id": "p1", "name": "Saga"}))) })
            });
        mock.expect_send()
            .withf(|req| req.path != "/projects/p1")
            .returning(|_| Box::pin(async { Ok(RawResponse::json(200, &json!([]))) }));

        let client = client_with(mock);
        let bundle = ProjectController::new(&client)
            .unlock("p1", "hunter2")
            .await
            .unwrap();

        assert_eq!(bundle.project.name, "Saga");
        assert!(client.session().has_password("p1"));
    }

    #[tokio::test]
    async fn test_rejected_password_is_forgotten() {
        let mut mock = MockTransport::new();
        bundle_mock(&mut mock, 403);

        let client = client_with(mock);
        let err = ProjectController::new(&client)
            .unlock("p1", "wrong")
            .await
            .unwrap_err();

        assert!(err.is_auth_failure());
        assert_eq!(err.to_string(), "Wrong password");
        assert!(!client.session().has_password("p1"));
    }

    #[tokio::test]
    async fn test_blank_password_is_rejected_before_any_request() {
        let client = client_with(MockTransport::new());
        let err = ProjectController::new(&client)
            .unlock("p1", "   ")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Password: This field is required.");
    }

    #[tokio::test]
    async fn test_create_caches_password_for_new_project() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects"
                    && req.body == Some(json!({"name": "Saga", "password": "pw"}))
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({"id": "p9", "name": "Saga", "is_password_protected": true}),
                    ))
                })
            });

        let client = client_with(mock);
        let done = ProjectController::new(&client)
            .create("  Saga ", Some("pw"))
            .await
            .unwrap();

        assert_eq!(done.refresh, Refresh::Projects);
        assert!(client.session().has_password("p9"));
    }

    #[tokio::test]
    async fn test_load_bundle_fetches_all_sections() {
        let mut mock = MockTransport::new();
        bundle_mock(&mut mock, 200);

        let client = client_with(mock);
        let bundle = ProjectController::new(&client).load_bundle("p1").await.unwrap();
        assert_eq!(bundle.project.id, "p1");
        assert!(bundle.scenarios.is_empty());
    }
}
