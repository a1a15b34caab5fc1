use hkdf::Hkdf;
use sha2::{Digest, Sha256};

/// SHA-256 of an arbitrary byte string.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// HMAC-SHA-256 extract-then-expand, producing 64 output bytes split into two
/// 32-byte halves. `salt` plays the role of the Noise chaining key, `ikm` the
/// input key material (an ECDH shared secret, or the empty string when only
/// rotating an existing chaining key into fresh traffic keys).
pub fn hkdf2(salt: &[u8; 32], ikm: &[u8]) -> ([u8; 32], [u8; 32]) {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; 64];
    hk.expand(&[], &mut okm)
        .expect("64 is a valid HKDF-SHA256 output length");
    let mut first = [0u8; 32];
    let mut second = [0u8; 32];
    first.copy_from_slice(&okm[..32]);
    second.copy_from_slice(&okm[32..]);
    (first, second)
}
