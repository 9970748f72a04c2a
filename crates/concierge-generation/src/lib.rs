//! Concierge generation crate - the text-generation adapter.
//!
//! Wraps an OpenAI-compatible chat-completions backend behind the
//! `TextGenerator` capability, with the instruction template and the
//! test doubles used by the pipeline.

pub mod generator;
pub mod openai;
pub mod prompt;

pub use generator::{EchoGenerator, FailingGenerator, GenerationError, TextGenerator};
pub use openai::OpenAiGenerator;
