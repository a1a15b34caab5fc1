//! BOLT-11 payment-invoice codec.
//!
//! A BOLT-11 invoice is a bech32 string carrying a human-readable prefix
//! (network + optional amount), a 35-bit timestamp, a typed field stream,
//! and a trailing secp256k1 ECDSA signature with recovery flag over the
//! SHA-256 of everything that came before it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ hrp: "ln" network amount?  │  separator "1"                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ timestamp (7 words) │ field stream │ signature (103+1 words) │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ln_invoice::Invoice;
//!
//! let invoice = Invoice::decode("lnbc2500u1...")?;
//! println!("amount: {:?}", invoice.amount);
//! ```

pub mod cursor;
pub mod error;
pub mod fields;
pub mod invoice;
pub mod prefix;

pub use error::InvoiceError;
pub use fields::{Field, FallbackAddress, FallbackVersion, RouteHop, UnknownField};
pub use invoice::{Invoice, Signature};
pub use prefix::{Amount, Network, Prefix};
