use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid secp256k1 key or point: {0}")]
    InvalidKey(#[from] secp256k1::Error),

    #[error("ECDSA signature verification failed")]
    VerificationFailed,

    #[error("ECDSA public key recovery failed")]
    RecoveryFailed,

    #[error("AEAD authentication failed")]
    AeadFailed,
}
