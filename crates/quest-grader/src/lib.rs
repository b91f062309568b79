//! Generative-AI voice grading for Solo Quest.
//!
//! A child reports quest completion by voice; this crate sends the
//! recording to a generative model with the guild-master appraisal prompt
//! and returns a typed [`quest_types::GradedReport`]. The crate covers:
//!
//! - enum-dispatch HTTP backends (Gemini, `OpenAI`-compatible)
//! - prompt template loading and rendering via `minijinja`
//! - layered JSON recovery parsing of model output
//! - environment-driven configuration
//!
//! The [`Grader`] type implements [`quest_core::ports::VoiceGrader`];
//! everything above this crate stays vendor-agnostic.

pub mod backend;
pub mod config;
pub mod error;
pub mod parse;
pub mod prompt;

pub use backend::{Grader, GraderBackend};
pub use config::{BackendType, GraderConfig};
pub use error::GraderError;
pub use parse::parse_graded_report;
pub use prompt::{PromptEngine, RenderedPrompt};
