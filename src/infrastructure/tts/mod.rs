//! Speech synthesis adapters

pub mod mary;
pub mod ssml;

pub use mary::{MaryTtsClient, MaryTtsConfig};
