//! Trait seams between the engine and its collaborators.

mod language_model;
mod observer;

pub use language_model::{ILanguageModel, StructuredRequest};
pub use observer::{ISnapshotObserver, NullObserver};
