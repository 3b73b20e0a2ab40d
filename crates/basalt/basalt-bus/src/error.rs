use std::io;

/// Errors surfaced by the broadcast bus.
///
/// The first three are programmer errors caught synchronously before any
/// counter or data-region byte is touched. `Backing` only occurs when
/// creating or opening the memory-mapped backing file.
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("data capacity must be a power of two of at least {min} bytes, got {capacity}")]
    InvalidCapacity { capacity: usize, min: usize },

    #[error("message type id must be positive, got {0}")]
    InvalidMsgTypeId(i32),

    #[error("message of {length} bytes exceeds max message length of {max}")]
    MessageTooLong { length: usize, max: usize },

    #[error("failed to map backing file '{path}'")]
    Backing {
        path: String,
        #[source]
        source: io::Error,
    },
}
