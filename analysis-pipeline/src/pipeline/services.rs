use std::sync::Arc;

use crate::{fetcher::RepositoryFetcher, packager::Packager, summarizer::Summarizer};

/// External collaborators the stages call into.
#[derive(Clone)]
pub struct AnalysisServices {
    pub fetcher: Arc<dyn RepositoryFetcher>,
    pub summarizer: Arc<dyn Summarizer>,
    pub packager: Packager,
}

impl AnalysisServices {
    pub fn new(
        fetcher: Arc<dyn RepositoryFetcher>,
        summarizer: Arc<dyn Summarizer>,
        packager: Packager,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            packager,
        }
    }
}
