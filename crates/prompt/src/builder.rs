//! Chat-prompt builder.

use crate::template::{Bindings, PromptTemplate};
use crate::types::{BuiltPrompt, BuiltPromptMetadata};
use askbase_core::AppResult;

/// Render `template` and assemble the system/user/assistant triple.
///
/// Empty system messages and seeds are treated as absent.
///
/// # Example
/// ```
/// use askbase_prompt::{build_chat_prompt, PromptTemplate};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let template = PromptTemplate::new("answer", "Q: {{question}}")?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is Rust?".to_string());
///
/// let built = build_chat_prompt(&template, vars, Some("Be brief."), None)?;
/// assert_eq!(built.user, "Q: What is Rust?");
/// # Ok(())
/// # }
/// ```
pub fn build_chat_prompt(
    template: &PromptTemplate,
    variables: Bindings,
    system: Option<&str>,
    assistant_seed: Option<&str>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!(template = template.name(), "Building prompt");

    let user = template.render(&variables)?;

    Ok(BuiltPrompt {
        system: non_empty(system),
        user,
        assistant_seed: non_empty(assistant_seed),
        metadata: BuiltPromptMetadata {
            template_name: template.name().to_string(),
            resolved_variables: variables,
        },
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
