//! Error types for the Noise transport handshake and framing.

use thiserror::Error;

use ln_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Cryptographic operation failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A handshake act had the wrong length
    #[error("act read failed: expected {expected} bytes, got {got}")]
    ActReadFailed { expected: usize, got: usize },

    /// A handshake act's version byte was non-zero
    #[error("act version byte mismatch: expected 0, got {0}")]
    ActBadVersion(u8),

    /// AEAD authentication failed during a handshake act or a frame
    #[error("AEAD authentication failed")]
    AeadFailure,

    /// A transport frame's declared length exceeds the maximum
    #[error("frame length {0} exceeds the 65535-byte maximum")]
    FrameTooLarge(usize),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
