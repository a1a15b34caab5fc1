//! BOLT-8 Noise_XK_secp256k1_ChaChaPoly_SHA256 transport handshake and framing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Noise_XK Handshake                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Act 1 (50B): initiator ephemeral key, AEAD tag over ∅      │
//! │  Act 2 (50B): responder ephemeral key, AEAD tag over ∅      │
//! │  Act 3 (66B): initiator static key (encrypted), AEAD tag    │
//! └─────────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!              TransportState (sk, rk, sn, rn, ck)
//!              length-prefixed AEAD framing, key rotation every
//!              1000 send/receive operations
//! ```
//!
//! Both roles are built as a typestate chain: each act consumes the
//! previous state and returns the next, so the compiler rejects calling an
//! act out of order or reusing a spent handshake state.

pub mod error;
pub mod handshake;
pub mod transport;
pub mod types;

pub use error::TransportError;
pub use handshake::{
    InitiatorAfterAct1, InitiatorAfterAct2, InitiatorInit, ResponderAfterAct1, ResponderAfterAct2,
    ResponderInit, TransportReady,
};
pub use transport::TransportState;
pub use types::{PrivateScalar, TrafficKeys};
