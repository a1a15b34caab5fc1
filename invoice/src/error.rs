use thiserror::Error;

use ln_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("malformed prefix: {0}")]
    MalformedPrefix(String),

    #[error("unknown network tag {0:?}")]
    UnknownNetwork(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("truncated payload: {0}")]
    TruncatedPayload(String),

    #[error("bech32 checksum or syntax error: {0}")]
    BadChecksum(String),

    #[error("ECDSA signature invalid")]
    SignatureInvalid,

    #[error("cryptography error: {0}")]
    Crypto(#[from] CryptoError),
}
