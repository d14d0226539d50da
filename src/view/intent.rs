//! What a user interaction asks the application to do
//!
//! View handlers never call the API themselves; they emit intents which the
//! app hands to the matching controller.

use crate::api::characters::WorldviewLevel;
use crate::api::scenarios::ScenarioUpdate;
use crate::core::models::{CardDraft, Worldview};
use crate::view::validation::ValidationResult;

/// Workspace tabs of an open project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Characters,
    Worldview,
    Scenario,
    Manuscript,
}

impl Tab {
    pub fn all() -> [Tab; 4] {
        [Tab::Characters, Tab::Worldview, Tab::Scenario, Tab::Manuscript]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Characters => "Characters",
            Tab::Worldview => "Worldview",
            Tab::Scenario => "Scenario",
            Tab::Manuscript => "Manuscript",
        }
    }

    /// Id of the container node the tab renders into
    pub fn container_id(&self) -> &'static str {
        match self {
            Tab::Characters => "tab-characters",
            Tab::Worldview => "tab-worldview",
            Tab::Scenario => "tab-scenario",
            Tab::Manuscript => "tab-manuscript",
        }
    }

    /// Tab for a `1`-`4` shortcut
    pub fn from_digit(c: char) -> Option<Tab> {
        match c {
            '1' => Some(Tab::Characters),
            '2' => Some(Tab::Worldview),
            '3' => Some(Tab::Scenario),
            '4' => Some(Tab::Manuscript),
            _ => None,
        }
    }
}

/// Dialogs that can be opened over the current screen
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    CreateProject,
    UnlockProject { project_id: String, name: String },
    RenameProject { project_id: String, name: String },
    CreateGroup,
    CardDetail { card_id: String },
    EditCard { group_id: String, card_id: Option<String> },
    GenerateCharacter,
    AiEditCard { card_id: String },
    EditRelationship { relationship_id: Option<String> },
    CreateWorldviewGroup,
    WorldviewCardDetail { card_id: String },
    EditWorldviewCard { group_id: String, card_id: Option<String> },
    AiEditWorldviewCard { card_id: String },
    GenerateWorldview,
    GenerateDraft,
    EditPlotPoint { plot_point_id: Option<String> },
    AiEditPlotPoint { plot_point_id: String },
    Confirm { message: String, action: Box<Intent> },
}

/// A user request produced by a view handler
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    // Navigation
    OpenProject { project_id: String, protected: bool },
    BackToProjects,
    SwitchTab(Tab),
    OpenModal(Modal),
    CloseModal,
    Refresh,
    CycleModel,
    AddRuleField,
    FieldValidated { field_id: String, result: ValidationResult },

    // Projects
    CreateProject { name: String, password: Option<String> },
    UnlockProject { project_id: String, password: String },
    RenameProject { project_id: String, name: String },
    DeleteProject { project_id: String },

    // Characters
    CreateGroup { name: String },
    DeleteGroup { group_id: String },
    SaveCard { group_id: String, card_id: Option<String>, draft: CardDraft },
    DeleteCard { group_id: String, card_id: String },
    ReorderCards { group_id: String, card_ids: Vec<String> },
    MoveCard {
        card_id: String,
        source_group_id: String,
        target_group_id: String,
        card_ids: Vec<String>,
    },
    GenerateCharacter { keywords: String },
    AiEditCard {
        card_id: String,
        prompt: String,
        worldview_level: WorldviewLevel,
        edit_related: bool,
    },
    /// Mark character names in a card's introduction
    HighlightNames { card_id: String, text: String },

    // Relationships
    SaveRelationship {
        relationship_id: Option<String>,
        source_character_id: String,
        target_character_id: String,
        kind: String,
        description: String,
    },
    DeleteRelationship { relationship_id: String },
    SuggestRelationship {
        source_character_id: String,
        target_character_id: String,
        tendency: String,
        keyword: String,
    },

    // Worldview
    SaveWorldview(Worldview),
    GenerateWorldview { keywords: String, edit_existing: bool },
    CreateWorldviewGroup { name: String },
    DeleteWorldviewGroup { group_id: String },
    SaveWorldviewCard {
        group_id: String,
        card_id: Option<String>,
        title: String,
        content: String,
    },
    DeleteWorldviewCard { card_id: String },
    ReorderWorldviewCards { group_id: String, card_ids: Vec<String> },
    MoveWorldviewCard {
        card_id: String,
        source_group_id: String,
        target_group_id: String,
        card_ids: Vec<String>,
    },
    AiEditWorldviewCard { card_id: String, prompt: String },

    // Scenario
    SaveScenario { scenario_id: String, update: ScenarioUpdate },
    GenerateDraft { scenario_id: String, plot_point_count: String },
    SavePlotPoint {
        scenario_id: String,
        plot_point_id: Option<String>,
        title: String,
        content: String,
    },
    DeletePlotPoint { plot_point_id: String },
    AiEditPlotPoint { plot_point_id: String, prompt: String },
    GenerateScene { plot_point_id: String },

    // Manuscript
    ImportManuscript,
    ClearManuscript,
    SelectBlock { block_id: String },
    SaveBlock { block_id: String, title: String, content: String },
    ReorderBlocks { block_ids: Vec<String> },
}

impl Intent {
    /// Whether handling the intent calls the server
    pub fn is_remote(&self) -> bool {
        !matches!(
            self,
            Intent::BackToProjects
                | Intent::SwitchTab(_)
                | Intent::OpenModal(_)
                | Intent::CloseModal
                | Intent::CycleModel
                | Intent::AddRuleField
                | Intent::FieldValidated { .. }
                | Intent::SelectBlock { .. }
        )
    }

    /// Drag-and-drop persistence; the dragged view has already moved
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            Intent::ReorderCards { .. }
                | Intent::MoveCard { .. }
                | Intent::ReorderWorldviewCards { .. }
                | Intent::MoveWorldviewCard { .. }
                | Intent::ReorderBlocks { .. }
        )
    }
}
