//! Field length limits shared by the forms and the controllers

pub const NAME_MAX: usize = 100;
pub const PROMPT_MAX: usize = 2000;
pub const DESCRIPTION_MAX: usize = 2000;

/// Tag fields (goals, personality, abilities)
pub const MAX_TAGS: usize = 20;
pub const TAG_MAX: usize = 100;

pub const LOGLINE_MAX: usize = 5000;
pub const RULE_MAX: usize = 300;
pub const GENRE_MAX: usize = 50;

pub const TITLE_MAX: usize = 100;
pub const THEMES_MAX: usize = 10;
pub const PLOT_POINTS_MAX: i64 = 50;

pub const BLOCK_TITLE_MAX: usize = 200;
pub const BLOCK_CONTENT_MAX: usize = 100_000;

/// Relationship tendency runs from very hostile to very friendly
pub const TENDENCY_MIN: i64 = -2;
pub const TENDENCY_MAX: i64 = 2;
