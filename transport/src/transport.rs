//! Length-prefixed authenticated framing atop the handshake's traffic keys,
//! with per-direction nonce counters and periodic key rotation.

use tracing::debug;

use ln_crypto::{aead, hashes};

use crate::error::{Result, TransportError};
use crate::types::{TrafficKeys, KEY_ROTATION_INTERVAL, MAX_FRAME_LEN};

/// 12-byte nonce with the BOLT-8 counter occupying the full 8 bytes at
/// offset 4 (little-endian), not just the low 16 bits of that range — the
/// corrected form of the canonical serialization (see `TransportState`).
fn nonce_from_counter(counter: u64) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[4..].copy_from_slice(&counter.to_le_bytes());
    nonce
}

/// `HKDF(ck, current_key)` produces `(ck', new_key)`; the caller replaces
/// both the key and the chaining key and resets the associated nonce.
fn rotate_key(ck: &[u8; 32], current_key: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
    hashes::hkdf2(ck, current_key)
}

/// An established transport: the two directional traffic keys, their nonce
/// counters, and the chaining key used to rotate them. Transport framing is
/// the only consumer of a handshake's output; this struct cannot be
/// constructed except by consuming a `TransportReady`.
pub struct TransportState {
    keys: TrafficKeys,
}

impl TransportState {
    pub fn new(keys: TrafficKeys) -> Self {
        Self { keys }
    }

    /// Encrypts `plaintext` into a frame: an 18-byte encrypted length
    /// prefix followed by an `(N+16)`-byte encrypted body. Advances `sn`
    /// between (and after) the two AEAD operations, rotating the sending
    /// key if a counter reaches the rotation interval.
    pub fn encrypt_message(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        if plaintext.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge(plaintext.len()));
        }
        let len_bytes = (plaintext.len() as u16).to_be_bytes();

        let length_frame = self.encrypt_send(&len_bytes)?;
        let body_frame = self.encrypt_send(plaintext)?;

        let mut frame = Vec::with_capacity(length_frame.len() + body_frame.len());
        frame.extend_from_slice(&length_frame);
        frame.extend_from_slice(&body_frame);
        Ok(frame)
    }

    /// Decrypts an 18-byte encrypted length prefix, returning the 2-byte
    /// big-endian length it authenticates. Must precede the matching
    /// `decrypt_message` call to keep `rn` aligned with the sender's `sn`.
    pub fn decrypt_length(&mut self, length_ciphertext: &[u8]) -> Result<u16> {
        let plaintext = self.decrypt_recv(length_ciphertext)?;
        if plaintext.len() != 2 {
            return Err(TransportError::AeadFailure);
        }
        Ok(u16::from_be_bytes([plaintext[0], plaintext[1]]))
    }

    /// Decrypts a frame body following a prior `decrypt_length` call.
    pub fn decrypt_message(&mut self, body_ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.decrypt_recv(body_ciphertext)
    }

    fn encrypt_send(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = nonce_from_counter(self.keys.sn);
        let ciphertext = aead::encrypt(&self.keys.sk, &nonce, &[], plaintext)
            .map_err(|_| TransportError::AeadFailure)?;
        self.advance_send();
        Ok(ciphertext)
    }

    fn decrypt_recv(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let nonce = nonce_from_counter(self.keys.rn);
        let plaintext = aead::decrypt(&self.keys.rk, &nonce, &[], ciphertext)
            .map_err(|_| TransportError::AeadFailure)?;
        self.advance_recv();
        Ok(plaintext)
    }

    fn advance_send(&mut self) {
        self.keys.sn += 1;
        if self.keys.sn == KEY_ROTATION_INTERVAL {
            let (new_ck, new_sk) = rotate_key(&self.keys.ck, &self.keys.sk);
            self.keys.ck = new_ck;
            self.keys.sk = new_sk;
            self.keys.sn = 0;
            debug!("rotated sending key after {KEY_ROTATION_INTERVAL} AEAD operations");
        }
    }

    fn advance_recv(&mut self) {
        self.keys.rn += 1;
        if self.keys.rn == KEY_ROTATION_INTERVAL {
            let (new_ck, new_rk) = rotate_key(&self.keys.ck, &self.keys.rk);
            self.keys.ck = new_ck;
            self.keys.rk = new_rk;
            self.keys.rn = 0;
            debug!("rotated receiving key after {KEY_ROTATION_INTERVAL} AEAD operations");
        }
    }

    #[cfg(test)]
    pub(crate) fn send_counter(&self) -> u64 {
        self.keys.sn
    }

    #[cfg(test)]
    pub(crate) fn sending_key(&self) -> [u8; 32] {
        self.keys.sk
    }
}
