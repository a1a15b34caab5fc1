//! Cryptographic substrate for the invoice codec and the Noise transport handshake.
//!
//! Every primitive here is a thin wrapper over an established crate: the point is
//! to give the two codecs one shared, zeroizing surface for hashing, key
//! agreement, signing and authenticated encryption rather than having each
//! reach for `sha2`/`secp256k1`/`chacha20poly1305` independently.

pub mod aead;
pub mod error;
pub mod hashes;
pub mod secp;

pub use error::CryptoError;
