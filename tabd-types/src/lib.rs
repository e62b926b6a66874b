pub mod error;
pub mod protocol;
pub mod suggestion;

pub use crate::error::EngineError;
pub use crate::protocol::{CompleteRequest, CompleteResponse, RequestKind, Shell};
pub use crate::suggestion::{Suggestion, SuggestionKind};
