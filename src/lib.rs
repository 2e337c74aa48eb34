//! RSA keys for an onion-routed chat client: loading PEM/DER, SHA-1 key
//! digests and the 16-character network identity derived from them,
//! PKCS#1 v1.5 / SHA-256 signatures, and the base32 codec the identity is
//! written in.

pub mod base32;
pub mod key;
pub mod rng;

pub use key::signing::sha256;
pub use key::{is_valid_network_identity, CryptoKey, Digest, Encoding, KeyError, KeyType};
