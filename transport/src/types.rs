//! Key material and sizing constants for the Noise_XK handshake.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// ASCII protocol identifier mixed into the rolling hash at initialization.
pub const PROTOCOL_NAME: &[u8] = b"Noise_XK_secp256k1_ChaChaPoly_SHA256";

/// ASCII prologue mixed into the rolling hash after the protocol name.
pub const PROLOGUE: &[u8] = b"lightning";

/// Version byte prefixed to every handshake act.
pub const VERSION_BYTE: u8 = 0x00;

pub const ACT_ONE_LEN: usize = 50;
pub const ACT_TWO_LEN: usize = 50;
pub const ACT_THREE_LEN: usize = 66;

/// AEAD operations permitted on one key before it must rotate.
pub const KEY_ROTATION_INTERVAL: u64 = 1000;

/// Maximum plaintext payload of one transport frame.
pub const MAX_FRAME_LEN: usize = 65535;

/// A 32-byte secp256k1 scalar used as a static or ephemeral private key.
/// Zeroized on drop: this is the one piece of key material the handshake
/// never outlives without erasing.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateScalar(pub [u8; 32]);

/// The rolling handshake hash `h` and chaining key `ck`. `ck` is key
/// material derived from ECDH output and is zeroized on drop; `h` is a
/// public transcript digest and needs no such care, but both live together
/// through the handshake's lifetime so they're kept in one small struct.
#[derive(Clone)]
pub struct SymmetricState {
    pub h: [u8; 32],
    pub ck: SensitiveChainingKey,
}

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveChainingKey(pub [u8; 32]);

impl SymmetricState {
    pub fn initialize(pubkey_prologue: &[u8; 33]) -> Self {
        let h = ln_crypto::hashes::sha256(PROTOCOL_NAME);
        let ck = h;
        let mut preimage = h.to_vec();
        preimage.extend_from_slice(PROLOGUE);
        let h = ln_crypto::hashes::sha256(&preimage);
        let mut preimage = h.to_vec();
        preimage.extend_from_slice(pubkey_prologue);
        let h = ln_crypto::hashes::sha256(&preimage);
        Self {
            h,
            ck: SensitiveChainingKey(ck),
        }
    }

    pub fn mix_hash(&mut self, data: &[u8]) {
        let mut preimage = self.h.to_vec();
        preimage.extend_from_slice(data);
        self.h = ln_crypto::hashes::sha256(&preimage);
    }

    /// `(ck, output) := HKDF(ck, input)`, replacing `ck` in place and
    /// returning the second 32-byte output for the caller to use as a
    /// transient key.
    pub fn mix_key(&mut self, input: &[u8]) -> [u8; 32] {
        let (new_ck, output) = ln_crypto::hashes::hkdf2(&self.ck.0, input);
        self.ck = SensitiveChainingKey(new_ck);
        output
    }
}

/// The two directional traffic keys and nonce counters established at the
/// end of Act 3, plus the retained chaining key used for key rotation.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TrafficKeys {
    pub sk: [u8; 32],
    pub rk: [u8; 32],
    #[zeroize(skip)]
    pub sn: u64,
    #[zeroize(skip)]
    pub rn: u64,
    pub ck: [u8; 32],
}
