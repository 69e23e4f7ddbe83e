//! Handler types and dependencies

use std::sync::Arc;

use crate::core::config::Config;
use crate::download::pipeline::Pipeline;
use crate::download::serializer::ConversationSerializer;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub serializer: Arc<ConversationSerializer>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(config: Arc<Config>, pipeline: Arc<Pipeline>, serializer: Arc<ConversationSerializer>) -> Self {
        Self {
            config,
            pipeline,
            serializer,
        }
    }
}
