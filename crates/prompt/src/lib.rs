//! Prompt templates and settings for Askbase.
//!
//! Loads `prompt_template.yaml`, renders templates strictly and builds the
//! system/user/assistant messages each pipeline stage sends.

pub mod builder;
pub mod loader;
pub mod template;
pub mod types;

pub use builder::build_chat_prompt;
pub use loader::load_prompt_settings;
pub use template::{Bindings, PromptTemplate};
pub use types::{
    AnswerPrompt, BuiltPrompt, BuiltPromptMetadata, ExpansionPrompt, FilterPrompt, KeywordPrompt,
    PromptSettings,
};
