pub use minijinja::{context, Environment, Value};
use std::sync::Arc;

pub trait ProvidesTemplateEngine {
    fn template_engine(&self) -> &Arc<TemplateEngine>;
}

/// Templates compiled into the binary and shared across requests.
#[derive(Clone)]
pub struct TemplateEngine {
    env: Arc<Environment<'static>>,
}

impl TemplateEngine {
    /// Builds an environment from `(name, source)` pairs; a template that fails
    /// to parse is reported here rather than on first render.
    pub fn from_sources(sources: &[(&'static str, &'static str)]) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in sources {
            env.add_template(name, source)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    pub fn render(&self, name: &str, ctx: &Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}
