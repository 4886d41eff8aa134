//! Application state for the web layer.

use std::sync::Arc;

use crate::engine::Engine;
use crate::schedule::InMemoryRepository;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The planning engine, shared across request handlers.
    pub engine: Arc<Engine<InMemoryRepository>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(engine: Engine<InMemoryRepository>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
