//! AI generation endpoints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::characters::WorldviewLevel;
use crate::api::client::ApiClient;
use crate::api::stream::StreamHandler;
use crate::core::models::CardDraft;
use crate::error::{LoomError, Result};

/// Parameters for character generation (plain and streamed)
#[derive(Debug, Clone, Default, Serialize)]
pub struct CharacterRequest {
    pub keywords: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub character_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub worldview_card_ids: Vec<String>,
    /// Main worldview text the character should fit into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worldview_context: Option<String>,
    pub worldview_level: WorldviewLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[derive(Serialize)]
struct NewWorldviewBody<'a> {
    keywords: &'a str,
    model_name: &'a str,
}

#[derive(Serialize)]
struct EditWorldviewBody<'a> {
    keywords: &'a str,
    existing_content: &'a str,
    model_name: &'a str,
}

#[derive(Deserialize)]
struct WorldviewText {
    worldview_text: String,
}

/// Generation operations handler
pub struct GenerateHandler<'a> {
    client: &'a ApiClient,
}

impl<'a> GenerateHandler<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Draft a worldview from keywords
    pub async fn new_worldview(&self, keywords: &str, model_name: &str) -> Result<String> {
        let text: WorldviewText = self
            .client
            .post(
                "/generate/worldview/new",
                None,
                &NewWorldviewBody {
                    keywords,
                    model_name,
                },
            )
            .await?;
        Ok(text.worldview_text)
    }

    /// Rework an existing worldview text
    pub async fn edit_worldview(
        &self,
        keywords: &str,
        existing_content: &str,
        model_name: &str,
    ) -> Result<String> {
        let text: WorldviewText = self
            .client
            .post(
                "/generate/worldview/edit",
                None,
                &EditWorldviewBody {
                    keywords,
                    existing_content,
                    model_name,
                },
            )
            .await?;
        Ok(text.worldview_text)
    }

    /// Generate a character card (not saved until the user picks a group)
    pub async fn character(&self, project_id: &str, request: &CharacterRequest) -> Result<CardDraft> {
        self.client
            .post(
                &format!("/projects/{}/generate/character", project_id),
                Some(project_id),
                request,
            )
            .await
    }

    /// Generate a character, receiving partial results as they arrive
    pub async fn character_stream<H: StreamHandler>(
        &self,
        project_id: &str,
        request: &CharacterRequest,
        handler: &mut H,
    ) {
        self.client
            .post_stream(
                &format!("/projects/{}/generate/character/stream", project_id),
                Some(project_id),
                request,
                handler,
            )
            .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streamed drafts
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a [`CardDraft`] out of streamed chunks
///
/// Chunks come in three shapes: `{"field": .., "value": ..}` pairs, partial
/// card objects whose keys are merged, and `{"text": ..}` fragments of the
/// model's raw JSON answer. Text fragments are only parsed when no structured
/// chunk arrived.
#[derive(Debug, Default)]
pub struct DraftAssembler {
    fields: Map<String, Value>,
    text: String,
}

impl DraftAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk and return the line to show for it
    pub fn push(&mut self, chunk: &Value) -> String {
        match chunk {
            Value::Object(obj) => {
                if let (Some(Value::String(field)), Some(value)) = (obj.get("field"), obj.get("value")) {
                    self.fields.insert(field.clone(), value.clone());
                    return format!("{}: {}", field, display_value(value));
                }
                if let Some(Value::String(text)) = obj.get("text") {
                    self.text.push_str(text);
                    return text.clone();
                }
                for (key, value) in obj {
                    self.fields.insert(key.clone(), value.clone());
                }
                chunk.to_string()
            }
            Value::String(text) => {
                self.text.push_str(text);
                text.clone()
            }
            other => other.to_string(),
        }
    }

    /// The assembled draft; fails when nothing named a character
    pub fn finish(self) -> Result<CardDraft> {
        let fields = if self.fields.is_empty() {
            parse_text_answer(&self.text).unwrap_or_default()
        } else {
            self.fields
        };
        let draft: CardDraft = serde_json::from_value(Value::Object(fields))
            .map_err(|e| LoomError::Stream(format!("incomplete character: {}", e)))?;
        if draft.name.trim().is_empty() {
            return Err(LoomError::Stream("the generator returned no character".to_string()));
        }
        Ok(draft)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// The model wraps its JSON answer in a code fence more often than not
fn parse_text_answer(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::{MockTransport, RawResponse, StreamResponse};
    use crate::api::stream::StreamCallbacks;
    use crate::core::session::SessionStore;
    use crate::error::LoomError;
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn client_with(mock: MockTransport) -> ApiClient {
        ApiClient::with_transport(Arc::new(mock), SessionStore::new())
    }

    #[tokio::test]
    async fn test_new_worldview_returns_text() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.path == "/generate/worldview/new")
            .returning(|_| {
                Box::pin(async {
                    Ok(RawResponse::json(200, &json!({"worldview_text": "Islands drift."})))
                })
            });

        let text = GenerateHandler::new(&client_with(mock))
            .new_worldview("floating islands", "gemini-2.5-flash-lite")
            .await
            .unwrap();
        assert_eq!(text, "Islands drift.");
    }

    #[tokio::test]
    async fn test_generated_character_accepts_string_tags() {
        let mut mock = MockTransport::new();
        mock.expect_send().returning(|_| {
            Box::pin(async {
                Ok(RawResponse::json(
                    200,
                    &json!({
                        "name": "Bren",
                        "description": "A smuggler",
                        "goal": "pay the debt, leave port",
                        "personality": "wry",
                        "abilities": "lockpicking",
                        "quote": ["Not my cargo."],
                        "introduction_story": "..."
                    }),
                ))
            })
        });

        let draft = GenerateHandler::new(&client_with(mock))
            .character(
                "p1",
                &CharacterRequest {
                    keywords: "smuggler".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(draft.goal, vec!["pay the debt", "leave port"]);
    }

    #[tokio::test]
    async fn test_stream_delivers_chunks_then_completes() {
        let mut mock = MockTransport::new();
        mock.expect_open_stream()
            .withf(|req| req.path == "/projects/p1/generate/character/stream")
            .times(1)
            .returning(|_| {
                Box::pin(async {
                    let parts: Vec<crate::error::Result<Vec<u8>>> = vec![
                        Ok(b"data: {\"field\": \"name\", \"value\": \"Bren\"}\n".to_vec()),
                        Ok(b"data: {\"field\": \"goal\"".to_vec()),
                        Ok(b", \"value\": \"leave port\"}\ndata: [DONE]\n".to_vec()),
                    ];
                    Ok(StreamResponse {
                        status: 200,
                        status_text: "OK".into(),
                        body: futures::stream::iter(parts).boxed(),
                    })
                })
            });

        let mut chunks: Vec<Value> = Vec::new();
        let mut completed = 0;
        let mut errors = 0;
        {
            let mut handler = StreamCallbacks {
                on_chunk: |v: Value| chunks.push(v),
                on_complete: || completed += 1,
                on_error: |_e: LoomError| errors += 1,
            };
            GenerateHandler::new(&client_with(mock))
                .character_stream(
                    "p1",
                    &CharacterRequest {
                        keywords: "smuggler".into(),
                        ..Default::default()
                    },
                    &mut handler,
                )
                .await;
        }

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1]["value"], "leave port");
        assert_eq!(completed, 1);
        assert_eq!(errors, 0);
    }

    #[tokio::test]
    async fn test_stream_error_status_calls_on_error_only() {
        let mut mock = MockTransport::new();
        mock.expect_open_stream().returning(|_| {
            Box::pin(async {
                let parts: Vec<crate::error::Result<Vec<u8>>> =
                    vec![Ok(br#"{"detail": "GOOGLE_API_KEY missing"}"#.to_vec())];
                Ok(StreamResponse {
                    status: 500,
                    status_text: "Internal Server Error".into(),
                    body: futures::stream::iter(parts).boxed(),
                })
            })
        });

        let mut completed = 0;
        let mut messages = Vec::new();
        {
            let mut handler = StreamCallbacks {
                on_chunk: |_v: Value| {},
                on_complete: || completed += 1,
                on_error: |e: LoomError| messages.push(e.to_string()),
            };
            GenerateHandler::new(&client_with(mock))
                .character_stream("p1", &CharacterRequest::default(), &mut handler)
                .await;
        }

        assert_eq!(completed, 0);
        assert_eq!(messages, vec!["GOOGLE_API_KEY missing"]);
    }

    #[tokio::test]
    async fn test_stream_transport_failure_calls_on_error() {
        let mut mock = MockTransport::new();
        mock.expect_open_stream()
            .returning(|_| Box::pin(async { Err(LoomError::Custom("refused".into())) }));

        let mut completed = 0;
        let mut errors = 0;
        {
            let mut handler = StreamCallbacks {
                on_chunk: |_v: Value| {},
                on_complete: || completed += 1,
                on_error: |_e: LoomError| errors += 1,
            };
            GenerateHandler::new(&client_with(mock))
                .character_stream("p1", &CharacterRequest::default(), &mut handler)
                .await;
        }

        assert_eq!((completed, errors), (0, 1));
    }

    #[test]
    fn test_assembler_merges_field_chunks() {
        let mut assembler = DraftAssembler::new();
        let line = assembler.push(&json!({"field": "name", "value": "Bren"}));
        assert_eq!(line, "name: Bren");
        assembler.push(&json!({"field": "goal", "value": ["pay the debt", "leave port"]}));

        let draft = assembler.finish().unwrap();
        assert_eq!(draft.name, "Bren");
        assert_eq!(draft.goal, vec!["pay the debt", "leave port"]);
    }

    #[test]
    fn test_assembler_parses_fenced_text_answer() {
        let mut assembler = DraftAssembler::new();
        assembler.push(&json!({"text": "```json\n{\"name\": \"Cass\", "}));
        assembler.push(&json!({"text": "\"personality\": \"calm, stubborn\"}\n```"}));

        let draft = assembler.finish().unwrap();
        assert_eq!(draft.name, "Cass");
        assert_eq!(draft.personality, vec!["calm", "stubborn"]);
    }

    #[test]
    fn test_assembler_without_name_fails() {
        let mut assembler = DraftAssembler::new();
        assembler.push(&json!({"field": "description", "value": "A diver"}));
        assert!(matches!(assembler.finish(), Err(LoomError::Stream(_))));
    }
}
