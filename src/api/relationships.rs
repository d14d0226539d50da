//! Character relationships

use serde::{Deserialize, Serialize};

use crate::api::client::{Ack, ApiClient};
use crate::core::models::Relationship;
use crate::error::Result;

/// Fields of a new relationship
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewRelationship {
    pub source_character_id: String,
    pub target_character_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

/// Only the label and description of a relationship can change
#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    description: Option<&'a str>,
}

/// Input for an AI relationship suggestion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestParams {
    pub source_character_id: String,
    pub target_character_id: String,
    /// -2 (very hostile) to 2 (very friendly)
    pub tendency: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

/// What the AI proposes; nothing is saved until the user submits it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// Relationship operations handler
pub struct RelationshipHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> RelationshipHandler<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, project_id: &str, relationship: &NewRelationship) -> Result<Relationship> {
        self.client
            .post(
                &format!("/projects/{}/relationships", project_id),
                Some(project_id),
                relationship,
            )
            .await
    }

    pub async fn update(
        &self,
        project_id: &str,
        relationship_id: &str,
        kind: &str,
        description: Option<&str>,
    ) -> Result<Relationship> {
        self.client
            .put(
                &format!("/projects/{}/relationships/{}", project_id, relationship_id),
                Some(project_id),
                &UpdateBody { kind, description },
            )
            .await
    }

    pub async fn delete(&self, project_id: &str, relationship_id: &str) -> Result<Ack> {
        self.client
            .delete(
                &format!("/projects/{}/relationships/{}", project_id, relationship_id),
                Some(project_id),
            )
            .await
    }

    /// Ask the AI how the source character sees the target
    pub async fn suggest(&self, project_id: &str, params: &SuggestParams) -> Result<Suggestion> {
        self.client
            .post(
                &format!("/projects/{}/relationships/suggest", project_id),
                Some(project_id),
                params,
            )
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

    fn client(mock: MockTransport) -> ApiClient {
        ApiClient::with_transport(Arc::new(mock), SessionStore::new())
    }

    #[tokio::test]
    async fn test_create_sends_type_field() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == reqwest::Method::POST
                    && req.path == "/projects/p1/relationships"
                    && req.body
                        == Some(json!({
                            "source_character_id": "c1",
                            "target_character_id": "c2",
                            "type": "rival",
                            "description": null
                        }))
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({
                            "id": "rel-1", "project_id": "p1",
                            "source_character_id": "c1", "target_character_id": "c2",
                            "type": "rival", "description": null
                        }),
                    ))
                })
            });

        let created = RelationshipHandler::new(&client(mock))
            .create(
                "p1",
                &NewRelationship {
                    source_character_id: "c1".into(),
                    target_character_id: "c2".into(),
                    kind: "rival".into(),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(created.id, "rel-1");
        assert_eq!(created.kind, "rival");
    }

    #[tokio::test]
    async fn test_update_sends_only_type_and_description() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.method == reqwest::Method::PUT
                    && req.path == "/projects/p1/relationships/rel-1"
                    && req.body == Some(json!({"type": "ally", "description": "Old friends"}))
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({
                            "id": "rel-1", "source_character_id": "c1",
                            "target_character_id": "c2", "type": "ally",
                            "description": "Old friends"
                        }),
                    ))
                })
            });

        let updated = RelationshipHandler::new(&client(mock))
            .update("p1", "rel-1", "ally", Some("Old friends"))
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Old friends"));
    }

    #[tokio::test]
    async fn test_suggest_omits_missing_keyword() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| {
                req.path == "/projects/p1/relationships/suggest"
                    && req.body
                        == Some(json!({
                            "source_character_id": "c1",
                            "target_character_id": "c2",
                            "tendency": -1
                        }))
            })
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(
                        200,
                        &json!({"type": "wary rival", "description": "They compete for the same map."}),
                    ))
                })
            });

        let suggestion = RelationshipHandler::new(&client(mock))
            .suggest(
                "p1",
                &SuggestParams {
                    source_character_id: "c1".into(),
                    target_character_id: "c2".into(),
                    tendency: -1,
                    keyword: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(suggestion.kind, "wary rival");
    }

    #[tokio::test]
    async fn test_delete_missing_relationship_surfaces_detail() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.method == reqwest::Method::DELETE)
            .times(1)
            .returning(|_| {
                Box::pin(async { Ok(RawResponse::json(404, &json!({"detail": "Relationship not found"}))) })
            });

        let err = RelationshipHandler::new(&client(mock))
            .delete("p1", "rel-9")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Relationship not found");
    }
}
