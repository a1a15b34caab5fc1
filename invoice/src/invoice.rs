use bech32::Variant;
use secp256k1::ecdsa::RecoveryId;
use secp256k1::{PublicKey, SecretKey};

use ln_crypto::{hashes, secp};

use crate::cursor::WordCursor;
use crate::error::InvoiceError;
use crate::fields::{
    decode_fields, write_field_slot, Field, FieldSlot, UnknownField, DEFAULT_EXPIRY_SECONDS,
    DEFAULT_MIN_FINAL_CLTV_EXPIRY,
};
use crate::prefix::{Amount, Network, Prefix};

const TIMESTAMP_WORDS: usize = 7;
const SIGNATURE_WORDS: usize = 103;
const RECOVERY_WORDS: usize = 1;
const TRAILER_WORDS: usize = SIGNATURE_WORDS + RECOVERY_WORDS;

/// A decoded or about-to-be-encoded BOLT-11 payment request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invoice {
    pub network: Network,
    pub amount: Amount,
    pub timestamp: u64,
    pub fields: Vec<Field>,
    pub unknown_fields: Vec<UnknownField>,
    pub signature: Signature,
    pub pubkey: [u8; 33],
    pub hash_data: [u8; 32],
    pub used_sig_recovery: bool,

    /// Wire-order interleaving of `fields` and `unknown_fields`. Not part of
    /// the invoice's logical content (two invoices with the same fields in
    /// the same order but different slot bookkeeping are still equal for our
    /// purposes only if this matches too, which it always will for anything
    /// produced by `decode`), but required to reproduce the exact wire
    /// stream on `encode`.
    field_order: Vec<FieldSlot>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_flag: u8,
}

impl Invoice {
    /// Reads the default-applying accessor for `expiry`: the field's value
    /// if present, otherwise 3600 seconds.
    pub fn expiry_seconds(&self) -> u64 {
        self.fields
            .iter()
            .find_map(|f| match f {
                Field::Expiry(value) => Some(*value),
                _ => None,
            })
            .unwrap_or(DEFAULT_EXPIRY_SECONDS)
    }

    /// Reads the default-applying accessor for `min_final_cltv_expiry`: the
    /// field's value if present, otherwise 9 blocks.
    pub fn min_final_cltv_expiry(&self) -> u64 {
        self.fields
            .iter()
            .find_map(|f| match f {
                Field::MinFinalCltvExpiry(value) => Some(*value),
                _ => None,
            })
            .unwrap_or(DEFAULT_MIN_FINAL_CLTV_EXPIRY)
    }

    pub fn decode(invoice_str: &str) -> Result<Self, InvoiceError> {
        let (hrp, data, variant) = bech32::decode(invoice_str)
            .map_err(|err| InvoiceError::BadChecksum(err.to_string()))?;
        if variant != Variant::Bech32 {
            return Err(InvoiceError::BadChecksum(
                "invoices use the original bech32 checksum, not bech32m".into(),
            ));
        }

        let words = u5_slice_to_bytes(&data);
        let prefix = Prefix::parse(&hrp)?;

        let mut cursor = WordCursor::from_words(words.clone());
        if cursor.words_remaining() < TIMESTAMP_WORDS + TRAILER_WORDS {
            return Err(InvoiceError::TruncatedPayload(
                "word stream shorter than the mandatory timestamp and signature trailer".into(),
            ));
        }
        let timestamp = cursor.read_uint_be(TIMESTAMP_WORDS)?;

        let decoded = decode_fields(&mut cursor)?;
        if cursor.words_remaining() != TRAILER_WORDS {
            return Err(InvoiceError::TruncatedPayload(format!(
                "expected exactly {TRAILER_WORDS} trailing words, found {}",
                cursor.words_remaining()
            )));
        }

        let sig_bytes = cursor.read_bytes(SIGNATURE_WORDS, false)?;
        if sig_bytes.len() != 64 {
            return Err(InvoiceError::TruncatedPayload(
                "signature did not unpack to 64 bytes".into(),
            ));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..]);
        let recovery_flag = cursor.read_uint_be(RECOVERY_WORDS)? as u8;

        // Pre-image: re-pack every word up to (but excluding) the trailing
        // 104 words, with padding on, and prepend the HRP's ASCII bytes.
        let payload_word_count = words.len() - TRAILER_WORDS;
        let mut preimage_cursor = WordCursor::from_words(words[..payload_word_count].to_vec());
        let preimage_bytes = preimage_cursor.read_bytes(payload_word_count, true)?;
        let mut preimage = hrp.as_bytes().to_vec();
        preimage.extend_from_slice(&preimage_bytes);
        let hash_data = hashes::sha256(&preimage);

        let payee_node = decoded.fields.iter().find_map(|f| match f {
            Field::PayeeNode(pk) => Some(*pk),
            _ => None,
        });

        let recovery_id = RecoveryId::from_i32(recovery_flag as i32)
            .map_err(|_| InvoiceError::MalformedPrefix("recovery flag out of range".into()))?;
        let mut signature_bytes = [0u8; 64];
        signature_bytes[..32].copy_from_slice(&r);
        signature_bytes[32..].copy_from_slice(&s);

        let (pubkey, used_sig_recovery) = match payee_node {
            Some(pk) => (pk, false),
            None => {
                let recovered = secp::recover(&hash_data, &signature_bytes, recovery_id)?;
                (recovered.serialize(), true)
            }
        };

        let verify_key = PublicKey::from_slice(&pubkey).map_err(ln_crypto::CryptoError::from)?;
        secp::verify(&hash_data, &signature_bytes, recovery_id, &verify_key)
            .map_err(|_| InvoiceError::SignatureInvalid)?;

        Ok(Self {
            network: prefix.network,
            amount: prefix.amount,
            timestamp,
            fields: decoded.fields,
            unknown_fields: decoded.unknown_fields,
            signature: Signature {
                r,
                s,
                recovery_flag,
            },
            pubkey,
            hash_data,
            used_sig_recovery,
            field_order: decoded.order,
        })
    }

    /// Encodes this invoice's body and signs the pre-image with
    /// `signing_key`. The signing key must correspond to `self.pubkey`
    /// unless a `payee_node` field is present (in which case the payee is
    /// asserted, not derived from the key used to sign).
    pub fn encode(&self, signing_key: &SecretKey) -> Result<String, InvoiceError> {
        let prefix = Prefix {
            network: self.network,
            amount: self.amount,
        };
        let hrp = prefix.render();

        let mut cursor = WordCursor::new();
        cursor.write_uint_be(self.timestamp, TIMESTAMP_WORDS);
        for slot in &self.field_order {
            write_field_slot(&mut cursor, *slot, &self.fields, &self.unknown_fields);
        }

        let payload_words = cursor.words().to_vec();
        let mut preimage_cursor = WordCursor::from_words(payload_words.clone());
        let preimage_bytes = preimage_cursor.read_bytes(payload_words.len(), true)?;
        let mut preimage = hrp.as_bytes().to_vec();
        preimage.extend_from_slice(&preimage_bytes);
        let hash_data = hashes::sha256(&preimage);

        let (signature_bytes, recovery_id) = secp::sign_recoverable(&hash_data, signing_key)?;
        cursor.write_bytes(&signature_bytes, true);
        cursor.write_uint_be(recovery_id.to_i32() as u64, RECOVERY_WORDS);

        let words = cursor.into_words();
        let data = bytes_to_u5_slice(&words)?;
        bech32::encode(&hrp, data, Variant::Bech32).map_err(|err| InvoiceError::BadChecksum(err.to_string()))
    }

    /// True if a `payee_node` field was present among `self.fields`, meaning
    /// decode would not have had to recover the pubkey from the signature.
    pub fn has_payee_node(&self) -> bool {
        self.fields.iter().any(|f| matches!(f, Field::PayeeNode(_)))
    }
}

fn u5_slice_to_bytes(data: &[bech32::u5]) -> Vec<u8> {
    data.iter().map(|w| w.to_u8()).collect()
}

fn bytes_to_u5_slice(words: &[u8]) -> Result<Vec<bech32::u5>, InvoiceError> {
    words
        .iter()
        .map(|&w| {
            bech32::u5::try_from_u8(w)
                .map_err(|err| InvoiceError::TruncatedPayload(err.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use secp256k1::SECP256K1;

    fn keypair(seed: u64) -> (SecretKey, PublicKey) {
        let mut rng = StdRng::seed_from_u64(seed);
        let secret_key = SecretKey::new(&mut rng);
        let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);
        (secret_key, public_key)
    }

    fn minimal_invoice(network: Network, amount: Amount) -> (Invoice, SecretKey) {
        let (secret_key, public_key) = keypair(42);
        let invoice = Invoice {
            network,
            amount,
            timestamp: 1_496_314_658,
            fields: vec![Field::PaymentHash([7u8; 32])],
            unknown_fields: vec![],
            signature: Signature {
                r: [0u8; 32],
                s: [0u8; 32],
                recovery_flag: 0,
            },
            pubkey: public_key.serialize(),
            hash_data: [0u8; 32],
            used_sig_recovery: true,
            field_order: vec![FieldSlot::Known(0)],
        };
        (invoice, secret_key)
    }

    #[test]
    fn encode_then_decode_round_trips_fields_and_signature() {
        let (invoice, secret_key) = minimal_invoice(Network::Mainnet, Amount::Unspecified);
        let encoded = invoice.encode(&secret_key).unwrap();
        let decoded = Invoice::decode(&encoded).unwrap();

        assert_eq!(decoded.network, invoice.network);
        assert_eq!(decoded.amount, invoice.amount);
        assert_eq!(decoded.timestamp, invoice.timestamp);
        assert_eq!(decoded.fields, invoice.fields);
        assert_eq!(decoded.unknown_fields, invoice.unknown_fields);
        assert!(decoded.used_sig_recovery);
        secp::verify(
            &decoded.hash_data,
            &{
                let mut sig = [0u8; 64];
                sig[..32].copy_from_slice(&decoded.signature.r);
                sig[32..].copy_from_slice(&decoded.signature.s);
                sig
            },
            RecoveryId::from_i32(decoded.signature.recovery_flag as i32).unwrap(),
            &PublicKey::from_slice(&decoded.pubkey).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn amount_round_trips_as_shortest_multiplier() {
        let (invoice, secret_key) =
            minimal_invoice(Network::Mainnet, Amount::Pico(2_500_000_000));
        let encoded = invoice.encode(&secret_key).unwrap();
        assert!(encoded.starts_with("lnbc2500u1"));
        let decoded = Invoice::decode(&encoded).unwrap();
        assert_eq!(decoded.amount, Amount::Pico(2_500_000_000));
    }

    #[test]
    fn payee_node_field_disables_signature_recovery() {
        let (secret_key, public_key) = keypair(7);
        let invoice = Invoice {
            network: Network::Mainnet,
            amount: Amount::Unspecified,
            timestamp: 1_496_314_658,
            fields: vec![Field::PayeeNode(public_key.serialize())],
            unknown_fields: vec![],
            signature: Signature {
                r: [0u8; 32],
                s: [0u8; 32],
                recovery_flag: 0,
            },
            pubkey: public_key.serialize(),
            hash_data: [0u8; 32],
            used_sig_recovery: false,
            field_order: vec![FieldSlot::Known(0)],
        };
        let encoded = invoice.encode(&secret_key).unwrap();
        let decoded = Invoice::decode(&encoded).unwrap();
        assert!(!decoded.used_sig_recovery);
        assert_eq!(decoded.pubkey, public_key.serialize());
    }

    #[test]
    fn absent_expiry_and_cltv_expose_documented_defaults() {
        let (invoice, _secret_key) = minimal_invoice(Network::Mainnet, Amount::Unspecified);
        assert_eq!(invoice.expiry_seconds(), DEFAULT_EXPIRY_SECONDS);
        assert_eq!(invoice.min_final_cltv_expiry(), DEFAULT_MIN_FINAL_CLTV_EXPIRY);
    }
}
