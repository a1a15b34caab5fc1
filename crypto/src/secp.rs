//! secp256k1 key agreement and recoverable ECDSA, wrapped for the invoice
//! signature and the Noise handshake's static/ephemeral key exchange.

use secp256k1::ecdh::SharedSecret;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};

use crate::CryptoError;

/// ECDH shared secret as defined by BOLT-8: SHA-256 of the compressed shared
/// point, which is exactly what `secp256k1::ecdh::SharedSecret` computes.
pub fn ecdh(local_secret: &SecretKey, remote_public: &PublicKey) -> [u8; 32] {
    SharedSecret::new(remote_public, local_secret).secret_bytes()
}

/// Recoverable ECDSA signature over a 32-byte message digest, returning the
/// compact 64-byte `(r, s)` pair and the recovery id needed to reconstruct
/// the signing key from the signature alone.
pub fn sign_recoverable(
    digest: &[u8; 32],
    secret_key: &SecretKey,
) -> Result<([u8; 64], RecoveryId), CryptoError> {
    let message = Message::from_digest(*digest);
    let signature = SECP256K1.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();
    Ok((compact, recovery_id))
}

/// Recovers the public key that produced `signature` over `digest`.
pub fn recover(
    digest: &[u8; 32],
    signature: &[u8; 64],
    recovery_id: RecoveryId,
) -> Result<PublicKey, CryptoError> {
    let message = Message::from_digest(*digest);
    let recoverable = RecoverableSignature::from_compact(signature, recovery_id)?;
    recoverable
        .recover(&message)
        .map_err(|_| CryptoError::RecoveryFailed)
}

/// Verifies a recoverable signature against a known public key. Invoices
/// recover the payee's key from the signature and then verify it against
/// that same recovered key, so this is run unconditionally for parity with
/// that fixed, always-verify contract rather than being skipped as redundant.
pub fn verify(
    digest: &[u8; 32],
    signature: &[u8; 64],
    recovery_id: RecoveryId,
    public_key: &PublicKey,
) -> Result<(), CryptoError> {
    let message = Message::from_digest(*digest);
    let recoverable = RecoverableSignature::from_compact(signature, recovery_id)?;
    let ecdsa = recoverable.to_standard();
    ecdsa
        .verify(&message, public_key)
        .map_err(|_| CryptoError::VerificationFailed)
}
