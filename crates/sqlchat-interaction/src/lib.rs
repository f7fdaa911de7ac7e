//! Completion service clients.

pub mod openai;

pub use openai::OpenAiCompletion;
