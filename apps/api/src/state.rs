use std::sync::Arc;

use crate::documents::DocumentStore;
use crate::workflow::LetterWorkflow;

/// Shared application state injected into route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentStore>,
    pub workflow: Arc<LetterWorkflow>,
}
