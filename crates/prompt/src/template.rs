//! Prompt templates with named placeholders.
//!
//! Placeholders use Handlebars syntax (`{{question}}`). Rendering is strict:
//! every placeholder the template declares must be bound, and bound values are
//! inserted verbatim (no HTML escaping, no truncation).

use askbase_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Variables bound into a template, keyed by placeholder name.
pub type Bindings = HashMap<String, String>;

/// A named template body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    name: String,
    body: String,
}

impl PromptTemplate {
    /// Create a template, checking that the body parses.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> AppResult<Self> {
        let template = Self {
            name: name.into(),
            body: body.into(),
        };
        // Surface syntax errors when the template is loaded, not when it is first used.
        template.registry()?;
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Placeholder names declared by the template, in first-seen order.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut rest = self.body.as_str();

        while let Some(start) = rest.find("{{") {
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                break;
            };

            let expr = after_open[..end]
                .trim_start_matches('{')
                .trim_start_matches('~')
                .trim_end_matches('~')
                .trim();

            if is_identifier(expr) && !names.iter().any(|n| n == expr) {
                names.push(expr.to_string());
            }

            rest = &after_open[end + 2..];
        }

        names
    }

    /// Placeholder names that `bindings` does not cover.
    pub fn missing_bindings(&self, bindings: &Bindings) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter(|name| !bindings.contains_key(name))
            .collect()
    }

    /// Render the template.
    ///
    /// # Errors
    /// `AppError::Prompt` if a placeholder has no binding or rendering fails.
    pub fn render(&self, bindings: &Bindings) -> AppResult<String> {
        let missing = self.missing_bindings(bindings);
        if !missing.is_empty() {
            return Err(AppError::Prompt(format!(
                "Template '{}' is missing bindings for: {}",
                self.name,
                missing.join(", ")
            )));
        }

        self.registry()?
            .render(&self.name, bindings)
            .map_err(|e| {
                AppError::Prompt(format!("Failed to render template '{}': {}", self.name, e))
            })
    }

    fn registry(&self) -> AppResult<Handlebars<'static>> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Prompts are plain text
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(&self.name, &self.body)
            .map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to register template '{}': {}",
                    self.name, e
                ))
            })?;
        Ok(handlebars)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && s != "else"
}
