//! Records mirrored from the server
//!
//! The client never owns these; it holds the last snapshot the server sent.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// Name of the server-managed group new cards fall back to
pub const UNCATEGORIZED_GROUP: &str = "미분류";

/// Splits comma separated tag input, accepting ASCII and full-width commas
static TAG_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[,，]\s*").expect("Invalid regex pattern for tag separator"));

/// Split free text into trimmed, non-empty tags
pub fn split_tags(input: &str) -> Vec<String> {
    TAG_SEPARATOR
        .split(input.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join tags back into the text shown in an input field
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

/// The server stores tag fields either as JSON lists or as plain strings
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(items)) => items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Raw::Text(text)) => split_tags(&text),
        None => Vec::new(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Projects
// ─────────────────────────────────────────────────────────────────────────────

/// Entry in the project list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_password_protected: bool,
}

/// Full project snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_password_protected: bool,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub worldview: Worldview,
    #[serde(default)]
    pub worldview_groups: Vec<WorldviewGroup>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Project {
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            is_password_protected: self.is_password_protected,
        }
    }

    pub fn group(&self, group_id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Find a character card and the group holding it
    pub fn find_card(&self, card_id: &str) -> Option<(&Group, &Card)> {
        self.groups
            .iter()
            .find_map(|g| g.cards.iter().find(|c| c.id == card_id).map(|c| (g, c)))
    }

    pub fn worldview_group(&self, group_id: &str) -> Option<&WorldviewGroup> {
        self.worldview_groups.iter().find(|g| g.id == group_id)
    }

    pub fn find_worldview_card(&self, card_id: &str) -> Option<(&WorldviewGroup, &WorldviewCard)> {
        self.worldview_groups.iter().find_map(|g| {
            g.worldview_cards
                .iter()
                .find(|c| c.id == card_id)
                .map(|c| (g, c))
        })
    }

    /// Every character card across groups, in display order
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.groups.iter().flat_map(|g| g.cards.iter())
    }

    pub fn relationship(&self, relationship_id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == relationship_id)
    }

    /// Display name of a character, falling back to its id
    pub fn character_name<'a>(&'a self, card_id: &'a str) -> &'a str {
        self.find_card(card_id)
            .map(|(_, card)| card.name.as_str())
            .unwrap_or(card_id)
    }
}

/// Response envelope of `GET /projects`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectList {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Characters
// ─────────────────────────────────────────────────────────────────────────────

/// Named bucket of ordered character cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

/// A character card
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub goal: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub personality: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub abilities: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub quote: Vec<String>,
    #[serde(default)]
    pub introduction_story: Option<String>,
    #[serde(default)]
    pub ordering: Option<i64>,
}

/// Editable fields of a character card, as sent to the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_list")]
    pub goal: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub personality: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub abilities: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub quote: Vec<String>,
    #[serde(default)]
    pub introduction_story: String,
}

impl From<&Card> for CardDraft {
    fn from(card: &Card) -> Self {
        Self {
            name: card.name.clone(),
            description: card.description.clone().unwrap_or_default(),
            goal: card.goal.clone(),
            personality: card.personality.clone(),
            abilities: card.abilities.clone(),
            quote: card.quote.clone(),
            introduction_story: card.introduction_story.clone().unwrap_or_default(),
        }
    }
}

/// How one character sees another. Directed: the reverse link is a
/// separate relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source_character_id: String,
    pub target_character_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Relationship {
    /// Whether `card_id` is either end of the link
    pub fn involves(&self, card_id: &str) -> bool {
        self.source_character_id == card_id || self.target_character_id == card_id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worldview
// ─────────────────────────────────────────────────────────────────────────────

/// Main worldview settings of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Worldview {
    #[serde(default)]
    pub logline: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldviewGroup {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "cards")]
    pub worldview_cards: Vec<WorldviewCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldviewCard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub ordering: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub themes: Vec<String>,
    #[serde(default)]
    pub plot_points: Vec<PlotPoint>,
}

impl Scenario {
    /// Plot points sorted by their server ordering
    pub fn ordered_plot_points(&self) -> Vec<&PlotPoint> {
        let mut points: Vec<&PlotPoint> = self.plot_points.iter().collect();
        points.sort_by_key(|p| p.ordering);
        points
    }

    pub fn plot_point(&self, plot_point_id: &str) -> Option<&PlotPoint> {
        self.plot_points.iter().find(|p| p.id == plot_point_id)
    }
}

/// An ordered narrative beat within a scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub scene_draft: Option<String>,
    #[serde(default)]
    pub ordering: i64,
}

impl PlotPoint {
    pub fn has_scene_draft(&self) -> bool {
        self.scene_draft
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Manuscript
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of prose with its own ordering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManuscriptBlock {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub ordering: i64,
    #[serde(default)]
    pub char_count: Option<usize>,
    #[serde(default)]
    pub word_count: Option<usize>,
}

impl ManuscriptBlock {
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Character count reported by the server, or derived from the content
    pub fn chars(&self) -> usize {
        self.char_count.unwrap_or_else(|| count_chars(self.text()))
    }

    /// Word count reported by the server, or derived from the content
    pub fn words(&self) -> usize {
        self.word_count.unwrap_or_else(|| count_words(self.text()))
    }
}

pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Everything the workspace shows for one project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectBundle {
    pub project: Project,
    pub scenarios: Vec<Scenario>,
    pub manuscript: Vec<ManuscriptBlock>,
}
