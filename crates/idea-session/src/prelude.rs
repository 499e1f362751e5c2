//! Common imports for typical client usage.
pub use crate::{
    ClientConfig, ClientOptions, FinishedIdea, GenerationRequest, IdeaError, Progress,
    SessionClient,
};
