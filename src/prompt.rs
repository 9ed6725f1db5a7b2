use tera::{Context, Tera};

use crate::error::AppError;

/// Template name for user-story generation
pub const USER_STORY_TEMPLATE: &str = "user_story.md";

/// Prompt template source, compiled into the binary
const USER_STORY_SOURCE: &str = include_str!("../templates/user_story.md");

/// Renders provider prompts from embedded Tera templates.
///
/// Templates are registered once at startup; a template that fails to parse
/// stops the service from starting. Markdown templates are not autoescaped.
pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_template(USER_STORY_TEMPLATE, USER_STORY_SOURCE)?;
        Ok(Self { tera })
    }

    /// Build the user-story prompt for a feature description
    pub fn user_story(&self, feature: &str) -> Result<String, AppError> {
        let mut context = Context::new();
        context.insert("feature", feature);
        Ok(self.tera.render(USER_STORY_TEMPLATE, &context)?)
    }
}
