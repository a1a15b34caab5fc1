//! The Noise_XK three-act handshake, modeled as a typestate chain: each act
//! consumes the previous state and returns the next, so calling an act out
//! of order or reusing a spent state is a compile error rather than a
//! runtime one.

use secp256k1::{PublicKey, SecretKey, SECP256K1};
use zeroize::Zeroize;

use ln_crypto::{aead, secp};

use crate::error::{Result, TransportError};
use crate::types::{
    PrivateScalar, SymmetricState, TrafficKeys, ACT_ONE_LEN, ACT_THREE_LEN, ACT_TWO_LEN,
    VERSION_BYTE,
};

const ZERO_NONCE: [u8; 12] = [0u8; 12];

fn act3_send_nonce() -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[4..].copy_from_slice(&1u64.to_le_bytes());
    nonce
}

fn encrypt_empty(key: &[u8; 32], nonce: &[u8; 12], h: &[u8; 32]) -> Result<Vec<u8>> {
    aead::encrypt(key, nonce, h, &[]).map_err(|_| TransportError::AeadFailure)
}

fn decrypt_empty(key: &[u8; 32], nonce: &[u8; 12], h: &[u8; 32], ciphertext: &[u8]) -> Result<()> {
    aead::decrypt(key, nonce, h, ciphertext)
        .map(|_| ())
        .map_err(|_| TransportError::AeadFailure)
}

fn check_act(message: &[u8], expected_len: usize) -> Result<()> {
    if message.len() != expected_len {
        return Err(TransportError::ActReadFailed {
            expected: expected_len,
            got: message.len(),
        });
    }
    if message[0] != VERSION_BYTE {
        return Err(TransportError::ActBadVersion(message[0]));
    }
    Ok(())
}

fn public_key_bytes(key: &PublicKey) -> [u8; 33] {
    key.serialize()
}

/// The initiator's starting state: its own static keypair, the remote's
/// known static public key, and a caller-supplied ephemeral keypair.
pub struct InitiatorInit {
    ls: SecretKey,
    lp: PublicKey,
    rs: PublicKey,
    es: SecretKey,
    ep: PublicKey,
    state: SymmetricState,
}

pub struct InitiatorAfterAct1 {
    ls: SecretKey,
    lp: PublicKey,
    rs: PublicKey,
    es: SecretKey,
    ep: PublicKey,
    state: SymmetricState,
}

pub struct InitiatorAfterAct2 {
    ls: SecretKey,
    lp: PublicKey,
    re: PublicKey,
    state: SymmetricState,
    temp_k2: [u8; 32],
}

impl InitiatorInit {
    pub fn new(local_static: PrivateScalar, remote_static: PublicKey, ephemeral: PrivateScalar) -> Result<Self> {
        let ls = SecretKey::from_slice(&local_static.0).map_err(ln_crypto::CryptoError::from)?;
        let lp = PublicKey::from_secret_key(SECP256K1, &ls);
        let es = SecretKey::from_slice(&ephemeral.0).map_err(ln_crypto::CryptoError::from)?;
        let ep = PublicKey::from_secret_key(SECP256K1, &es);
        let state = SymmetricState::initialize(&public_key_bytes(&remote_static));
        Ok(Self {
            ls,
            lp,
            rs: remote_static,
            es,
            ep,
            state,
        })
    }

    /// Writes Act 1: `0x00 || ep || c`, 50 bytes total.
    pub fn write_act_one(mut self) -> Result<(Vec<u8>, InitiatorAfterAct1)> {
        self.state.mix_hash(&public_key_bytes(&self.ep));
        let ss = secp::ecdh(&self.es, &self.rs);
        let temp_k1 = self.state.mix_key(&ss);
        let c = encrypt_empty(&temp_k1, &ZERO_NONCE, &self.state.h)?;
        self.state.mix_hash(&c);

        let mut message = Vec::with_capacity(ACT_ONE_LEN);
        message.push(VERSION_BYTE);
        message.extend_from_slice(&public_key_bytes(&self.ep));
        message.extend_from_slice(&c);
        debug_assert_eq!(message.len(), ACT_ONE_LEN);

        Ok((
            message,
            InitiatorAfterAct1 {
                ls: self.ls,
                lp: self.lp,
                rs: self.rs,
                es: self.es,
                ep: self.ep,
                state: self.state,
            },
        ))
    }
}

impl InitiatorAfterAct1 {
    /// Reads Act 2 and derives `temp_k2`, advancing to the state from which
    /// Act 3 can be written.
    pub fn read_act_two(mut self, message: &[u8]) -> Result<InitiatorAfterAct2> {
        check_act(message, ACT_TWO_LEN)?;
        let re = PublicKey::from_slice(&message[1..34]).map_err(ln_crypto::CryptoError::from)?;
        let c = &message[34..];

        self.state.mix_hash(&message[1..34]);
        let ss = secp::ecdh(&self.es, &re);
        let temp_k2 = self.state.mix_key(&ss);
        decrypt_empty(&temp_k2, &ZERO_NONCE, &self.state.h, c)?;
        self.state.mix_hash(c);

        Ok(InitiatorAfterAct2 {
            ls: self.ls,
            lp: self.lp,
            re,
            state: self.state,
            temp_k2,
        })
    }
}

impl InitiatorAfterAct2 {
    /// Writes Act 3 and derives the traffic keys, consuming the handshake
    /// state and returning a ready-to-use transport.
    pub fn write_act_three(mut self) -> Result<(Vec<u8>, TransportReady)> {
        let nonce = act3_send_nonce();
        let lp_bytes = public_key_bytes(&self.lp);
        let c = aead::encrypt(&self.temp_k2, &nonce, &self.state.h, &lp_bytes)
            .map_err(|_| TransportError::AeadFailure)?;
        self.state.mix_hash(&c);

        let ss = secp::ecdh(&self.ls, &self.re);
        let temp_k3 = self.state.mix_key(&ss);
        let t = encrypt_empty(&temp_k3, &ZERO_NONCE, &self.state.h)?;

        // initiator: first 32 = sk, last 32 = rk
        let (sk, rk) = ln_crypto::hashes::hkdf2(&self.state.ck.0, &[]);

        let mut message = Vec::with_capacity(ACT_THREE_LEN);
        message.push(VERSION_BYTE);
        message.extend_from_slice(&c);
        message.extend_from_slice(&t);
        debug_assert_eq!(message.len(), ACT_THREE_LEN);

        let ck = self.state.ck.0;
        self.temp_k2.zeroize();

        Ok((
            message,
            TransportReady {
                keys: TrafficKeys {
                    sk,
                    rk,
                    sn: 0,
                    rn: 0,
                    ck,
                },
            },
        ))
    }
}

/// The responder's starting state. Its own static key is known; the
/// remote's static key is learned only in Act 3.
pub struct ResponderInit {
    ls: SecretKey,
    lp: PublicKey,
    es: SecretKey,
    ep: PublicKey,
    state: SymmetricState,
}

pub struct ResponderAfterAct1 {
    ls: SecretKey,
    lp: PublicKey,
    es: SecretKey,
    ep: PublicKey,
    re: PublicKey,
    state: SymmetricState,
}

pub struct ResponderAfterAct2 {
    es: SecretKey,
    state: SymmetricState,
    temp_k2: [u8; 32],
}

impl ResponderInit {
    pub fn new(local_static: PrivateScalar, ephemeral: PrivateScalar) -> Result<Self> {
        let ls = SecretKey::from_slice(&local_static.0).map_err(ln_crypto::CryptoError::from)?;
        let lp = PublicKey::from_secret_key(SECP256K1, &ls);
        let es = SecretKey::from_slice(&ephemeral.0).map_err(ln_crypto::CryptoError::from)?;
        let ep = PublicKey::from_secret_key(SECP256K1, &es);
        let state = SymmetricState::initialize(&public_key_bytes(&lp));
        Ok(Self {
            ls,
            lp,
            es,
            ep,
            state,
        })
    }

    /// Reads Act 1 and verifies its AEAD tag.
    pub fn read_act_one(mut self, message: &[u8]) -> Result<ResponderAfterAct1> {
        check_act(message, ACT_ONE_LEN)?;
        let re = PublicKey::from_slice(&message[1..34]).map_err(ln_crypto::CryptoError::from)?;
        let c = &message[34..];

        self.state.mix_hash(&message[1..34]);
        let ss = secp::ecdh(&self.ls, &re);
        let temp_k1 = self.state.mix_key(&ss);
        decrypt_empty(&temp_k1, &ZERO_NONCE, &self.state.h, c)?;
        self.state.mix_hash(c);

        Ok(ResponderAfterAct1 {
            ls: self.ls,
            lp: self.lp,
            es: self.es,
            ep: self.ep,
            re,
            state: self.state,
        })
    }
}

impl ResponderAfterAct1 {
    /// Writes Act 2 and derives `temp_k2`.
    pub fn write_act_two(mut self) -> Result<(Vec<u8>, ResponderAfterAct2)> {
        self.state.mix_hash(&public_key_bytes(&self.ep));
        let ss = secp::ecdh(&self.es, &self.re);
        let temp_k2 = self.state.mix_key(&ss);
        let c = encrypt_empty(&temp_k2, &ZERO_NONCE, &self.state.h)?;
        self.state.mix_hash(&c);

        let mut message = Vec::with_capacity(ACT_TWO_LEN);
        message.push(VERSION_BYTE);
        message.extend_from_slice(&public_key_bytes(&self.ep));
        message.extend_from_slice(&c);
        debug_assert_eq!(message.len(), ACT_TWO_LEN);

        Ok((
            message,
            ResponderAfterAct2 {
                es: self.es,
                state: self.state,
                temp_k2,
            },
        ))
    }
}

impl ResponderAfterAct2 {
    /// Reads Act 3, learns the initiator's static public key, and derives
    /// the traffic keys.
    pub fn read_act_three(mut self, message: &[u8]) -> Result<TransportReady> {
        check_act(message, ACT_THREE_LEN)?;
        let c = &message[1..50];
        let t = &message[50..];

        let nonce = act3_send_nonce();
        let lp_bytes = aead::decrypt(&self.temp_k2, &nonce, &self.state.h, c)
            .map_err(|_| TransportError::AeadFailure)?;
        let rs = PublicKey::from_slice(&lp_bytes).map_err(ln_crypto::CryptoError::from)?;
        self.state.mix_hash(c);

        let ss = secp::ecdh(&self.es, &rs);
        let temp_k3 = self.state.mix_key(&ss);
        decrypt_empty(&temp_k3, &ZERO_NONCE, &self.state.h, t)?;

        // responder: first 32 = rk, last 32 = sk (swapped relative to the
        // initiator; this asymmetry is intentional and load-bearing)
        let (rk, sk) = ln_crypto::hashes::hkdf2(&self.state.ck.0, &[]);

        let ck = self.state.ck.0;
        self.temp_k2.zeroize();

        Ok(TransportReady {
            keys: TrafficKeys {
                sk,
                rk,
                sn: 0,
                rn: 0,
                ck,
            },
        })
    }
}

/// Terminal handshake state: the directional traffic keys and nonce
/// counters, ready to hand off to transport framing.
pub struct TransportReady {
    pub(crate) keys: TrafficKeys,
}

impl TransportReady {
    pub fn into_keys(self) -> TrafficKeys {
        self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::RngCore;
    use rand::SeedableRng;

    fn random_scalar(rng: &mut StdRng) -> PrivateScalar {
        let mut bytes = [0u8; 32];
        loop {
            rng.fill_bytes(&mut bytes);
            if SecretKey::from_slice(&bytes).is_ok() {
                return PrivateScalar(bytes);
            }
        }
    }

    #[test]
    fn full_handshake_derives_matching_swapped_keys() {
        let mut rng = StdRng::seed_from_u64(1);
        let initiator_static = random_scalar(&mut rng);
        let responder_static = random_scalar(&mut rng);
        let initiator_ephemeral = random_scalar(&mut rng);
        let responder_ephemeral = random_scalar(&mut rng);

        let responder_ls = SecretKey::from_slice(&responder_static.0).unwrap();
        let responder_public = PublicKey::from_secret_key(SECP256K1, &responder_ls);

        let initiator = InitiatorInit::new(
            initiator_static,
            responder_public,
            initiator_ephemeral,
        )
        .unwrap();
        let responder = ResponderInit::new(responder_static, responder_ephemeral).unwrap();

        let (act1, initiator) = initiator.write_act_one().unwrap();
        assert_eq!(act1.len(), ACT_ONE_LEN);
        let responder = responder.read_act_one(&act1).unwrap();

        let (act2, responder) = responder.write_act_two().unwrap();
        assert_eq!(act2.len(), ACT_TWO_LEN);
        let initiator = initiator.read_act_two(&act2).unwrap();

        let (act3, initiator_ready) = initiator.write_act_three().unwrap();
        assert_eq!(act3.len(), ACT_THREE_LEN);
        let responder_ready = responder.read_act_three(&act3).unwrap();

        let initiator_keys = initiator_ready.into_keys();
        let responder_keys = responder_ready.into_keys();
        assert_eq!(initiator_keys.sk, responder_keys.rk);
        assert_eq!(initiator_keys.rk, responder_keys.sk);
    }

    #[test]
    fn tampered_act_one_fails_aead() {
        let mut rng = StdRng::seed_from_u64(2);
        let initiator_static = random_scalar(&mut rng);
        let responder_static = random_scalar(&mut rng);
        let initiator_ephemeral = random_scalar(&mut rng);
        let responder_ephemeral = random_scalar(&mut rng);

        let responder_ls = SecretKey::from_slice(&responder_static.0).unwrap();
        let responder_public = PublicKey::from_secret_key(SECP256K1, &responder_ls);

        let initiator =
            InitiatorInit::new(initiator_static, responder_public, initiator_ephemeral).unwrap();
        let responder = ResponderInit::new(responder_static, responder_ephemeral).unwrap();

        let (mut act1, _initiator) = initiator.write_act_one().unwrap();
        *act1.last_mut().unwrap() ^= 0xff;

        assert!(responder.read_act_one(&act1).is_err());
    }

    #[test]
    fn wrong_length_act_is_rejected() {
        let mut rng = StdRng::seed_from_u64(3);
        let responder_static = random_scalar(&mut rng);
        let responder_ephemeral = random_scalar(&mut rng);
        let responder = ResponderInit::new(responder_static, responder_ephemeral).unwrap();
        assert!(responder.read_act_one(&[0u8; 10]).is_err());
    }

    #[test]
    fn bad_version_byte_is_rejected() {
        let mut rng = StdRng::seed_from_u64(4);
        let responder_static = random_scalar(&mut rng);
        let responder_ephemeral = random_scalar(&mut rng);
        let responder = ResponderInit::new(responder_static, responder_ephemeral).unwrap();
        let mut message = vec![0xffu8; ACT_ONE_LEN];
        assert!(responder.read_act_one(&mut message).is_err());
    }
}
