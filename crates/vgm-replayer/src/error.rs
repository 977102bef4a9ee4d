//! Error types for VGM command-stream playback

use sn76489::Sn76489Error;

/// Error type for replayer operations
#[derive(thiserror::Error, Debug)]
pub enum ReplayerError {
    /// An opcode handler could not read all of its operand bytes
    #[error("unexpected end of command data")]
    PrematureEof,

    /// No handler is registered for the opcode that was read
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),

    /// An installed emulator claims an opcode that is already taken
    #[error("opcode 0x{0:02X} already has a handler")]
    DuplicateHandler(u8),

    /// A second-chip opcode appeared in a stream without dual-chip mode
    #[error("second PSG addressed but dual-chip mode is not enabled")]
    DualChipDisabled,

    /// `next()` was called after the stream already ended
    #[error("command stream already ended")]
    AlreadyEnded,

    /// Error from the underlying chip emulation
    #[error("chip error: {0}")]
    Chip(#[from] Sn76489Error),

    /// IO error from the data cursor
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for replayer operations
pub type Result<T> = std::result::Result<T, ReplayerError>;
