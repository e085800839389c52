//! Error types for the signal channel

/// Error types for signal channel operations
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignalError {
    /// The channel was shut down; the signal was discarded
    #[error("Signal channel shutdown")]
    Shutdown,

    /// The orchestrator dropped its receiver
    #[error("Signal receiver dropped")]
    ReceiverGone,
}
