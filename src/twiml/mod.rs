//! Voice markup model and XML rendering for the carrier's instruction format.

mod response;
mod verb;

pub use response::{VoiceResponse, CONTENT_TYPE};
pub use verb::{Gather, InputMode, Say, Verb};
