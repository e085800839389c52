//! Errors raised by illegal crawl state transitions

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A navigation attempt was registered while another was still open
    #[error("navigation attempt to {new_url} registered while attempt to {open_url} is still open")]
    AttemptAlreadyActive { open_url: String, new_url: String },
}
