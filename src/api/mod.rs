//! Storyloom backend integration
//!
//! This module provides:
//! - The HTTP client and its transport seam
//! - Response normalization
//! - The `data:` line stream parser
//! - One handler per backend resource

pub mod characters;
pub mod client;
pub mod generate;
pub mod manuscript;
pub mod projects;
pub mod relationships;
pub mod scenarios;
pub mod stream;
pub mod worldview;

pub use characters::{AiCardEdits, CardAiEditParams, CharacterHandler, WorldviewLevel};
pub use client::{Ack, ApiClient, ApiRequest, HttpTransport, RawResponse, Transport};
pub use generate::{CharacterRequest, DraftAssembler, GenerateHandler};
pub use manuscript::{BlockUpdate, ManuscriptHandler};
pub use projects::{CreateProjectParams, ProjectHandler};
pub use relationships::{NewRelationship, RelationshipHandler, SuggestParams, Suggestion};
pub use scenarios::{DraftParams, PlotPointAiEditParams, ScenarioHandler, ScenarioUpdate};
pub use stream::{StreamCallbacks, StreamHandler};
pub use worldview::{WorldviewAiEditParams, WorldviewHandler};
