//! Collaborators that take a finished log off the crawler's hands

pub mod errors;
pub mod object_store;
pub mod trigger;

pub use errors::ReportError;
pub use object_store::{FsObjectStore, ObjectStore, object_key, record};
pub use trigger::{Trigger, TriggerPayload};
