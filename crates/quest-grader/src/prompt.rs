//! Appraisal prompt loading and rendering via `minijinja`.
//!
//! Templates are loaded from the filesystem (default: `templates/`
//! directory) so the guild-master persona and grading rubric can be tuned
//! without recompiling. The rendered prompt instructs the model to return
//! strict JSON with `transcript`, `rank`, and `comment` fields.

use minijinja::{Environment, context};

use crate::error::GraderError;

/// Manages appraisal prompt loading and rendering.
///
/// Wraps a `minijinja` [`Environment`] with the appraisal templates
/// pre-loaded. Templates can be edited on disk and will be picked up on
/// the next call to [`PromptEngine::new`].
pub struct PromptEngine {
    env: Environment<'static>,
}

/// The complete rendered prompt ready to send to a grading backend.
#[derive(Debug, Clone)]
pub struct RenderedPrompt {
    /// System message establishing the guild-master persona.
    pub system: String,
    /// User message carrying the quest context and grading rubric.
    pub user: String,
}

impl PromptEngine {
    /// Create a new prompt engine loading templates from the given directory.
    ///
    /// The directory must contain `appraisal_system.j2` and
    /// `appraisal_user.j2`.
    pub fn new(templates_dir: &str) -> Result<Self, GraderError> {
        let mut env = Environment::new();

        let system_tpl = load_template(templates_dir, "appraisal_system.j2")?;
        let user_tpl = load_template(templates_dir, "appraisal_user.j2")?;

        env.add_template_owned("appraisal_system", system_tpl)
            .map_err(|e| GraderError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("appraisal_user", user_tpl)
            .map_err(|e| GraderError::Template(format!("failed to add user template: {e}")))?;

        Ok(Self { env })
    }

    /// Render the appraisal prompt for one voice report.
    ///
    /// `is_retry` switches the inaudible-handling instruction: on a first
    /// attempt an unintelligible recording asks the child to repeat
    /// (`RETRY`), on the retry it settles for rank C.
    pub fn render(&self, quest_title: &str, is_retry: bool) -> Result<RenderedPrompt, GraderError> {
        let ctx = context! { quest_title, is_retry };

        let system = self
            .env
            .get_template("appraisal_system")
            .map_err(|e| GraderError::Template(format!("missing system template: {e}")))?
            .render(&ctx)
            .map_err(|e| GraderError::Template(format!("system render failed: {e}")))?;

        let user = self
            .env
            .get_template("appraisal_user")
            .map_err(|e| GraderError::Template(format!("missing user template: {e}")))?
            .render(&ctx)
            .map_err(|e| GraderError::Template(format!("user render failed: {e}")))?;

        Ok(RenderedPrompt { system, user })
    }
}

/// Read a template file from disk.
fn load_template(dir: &str, filename: &str) -> Result<String, GraderError> {
    let path = format!("{dir}/{filename}");
    std::fs::read_to_string(&path)
        .map_err(|e| GraderError::Template(format!("failed to read {path}: {e}")))
}
