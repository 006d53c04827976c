use std::sync::Arc;

use common::utils::template_engine::{ProvidesTemplateEngine, TemplateEngine};
use tracing::debug;

const TEMPLATES: [(&str, &str); 3] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("status.html", include_str!("../templates/status.html")),
];

#[derive(Clone)]
pub struct HtmlState {
    pub templates: Arc<TemplateEngine>,
}

impl HtmlState {
    pub fn new() -> Result<Self, minijinja::Error> {
        let templates = Arc::new(TemplateEngine::from_sources(&TEMPLATES)?);
        debug!("Template engine configured for html_router.");
        Ok(Self { templates })
    }
}

impl ProvidesTemplateEngine for HtmlState {
    fn template_engine(&self) -> &Arc<TemplateEngine> {
        &self.templates
    }
}
