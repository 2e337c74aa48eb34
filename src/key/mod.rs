pub mod key_reader;
pub mod key_writer;
pub mod signing;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest as _, Sha1};
use thiserror::Error;
use tracing::debug;

use crate::base32;

/// Length of the SHA-1 public key digest.
pub const DIGEST_LEN: usize = 20;
/// Digest bytes that make up a network identity (80 bits).
pub const IDENTITY_DIGEST_BYTES: usize = 10;
/// Length of a network identity in base32 symbols.
pub const NETWORK_IDENTITY_LEN: usize = 16;
pub const SHA256_DIGEST_LEN: usize = 32;
/// Largest modulus accepted from either key type.
pub const MAX_MODULUS_BITS: usize = 16384;

pub type Digest = [u8; DIGEST_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Pem,
    Der,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    PublicKey,
    PrivateKey,
}

impl KeyType {
    pub fn pem_label(&self) -> &'static str {
        match self {
            KeyType::PublicKey => "RSA PUBLIC KEY",
            KeyType::PrivateKey => "RSA PRIVATE KEY",
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Pem => write!(f, "pem"),
            Encoding::Der => write!(f, "der"),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pem" => Ok(Encoding::Pem),
            "der" => Ok(Encoding::Der),
            _ => Err(format!("unknown encoding `{}', available: pem, der", s)),
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyType::PublicKey => write!(f, "public"),
            KeyType::PrivateKey => write!(f, "private"),
        }
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(KeyType::PublicKey),
            "private" => Ok(KeyType::PrivateKey),
            _ => Err(format!("unknown key type `{}', available: public, private", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("no key data")]
    Empty,
    #[error("malformed PEM: {0}")]
    Pem(String),
    #[error("malformed DER: {0}")]
    Der(String),
    #[error("no key loaded")]
    NotLoaded,
    #[error("key has no private material")]
    NotPrivate,
    #[error("digest must be {expected} bytes, got {actual}")]
    InvalidDigest { expected: usize, actual: usize },
    #[error("signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone)]
pub(crate) enum KeyMaterial {
    Public(RsaPublicKey),
    Private(RsaPrivateKey),
}

impl KeyMaterial {
    fn public(&self) -> RsaPublicKey {
        match self {
            KeyMaterial::Public(key) => key.clone(),
            KeyMaterial::Private(key) => key.to_public_key(),
        }
    }

    fn bits(&self) -> usize {
        match self {
            KeyMaterial::Public(key) => key.n().bits(),
            KeyMaterial::Private(key) => key.n().bits(),
        }
    }
}

/// An RSA key, either public only or with its private half.
///
/// Starts out empty. [`CryptoKey::load`] replaces the material only on
/// success, so a failed load never disturbs what was there before.
#[derive(Debug, Default)]
pub struct CryptoKey {
    material: Option<KeyMaterial>,
}

impl CryptoKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: &[u8], key_type: KeyType, encoding: Encoding) -> Result<Self, KeyError> {
        let mut key = Self::new();
        key.load(data, key_type, encoding)?;
        Ok(key)
    }

    pub fn load(&mut self, data: &[u8], key_type: KeyType, encoding: Encoding) -> Result<(), KeyError> {
        match key_reader::read_key(data, key_type, encoding) {
            Ok(material) => {
                debug!(%key_type, %encoding, bits = material.bits(), "loaded key");
                self.material = Some(material);
                Ok(())
            }
            Err(e) => {
                debug!(%key_type, %encoding, error = %e, "rejected key data");
                Err(e)
            }
        }
    }

    pub fn load_pem(&mut self, data: &[u8], key_type: KeyType) -> Result<(), KeyError> {
        self.load(data, key_type, Encoding::Pem)
    }

    pub fn clear(&mut self) {
        self.material = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.material.is_some()
    }

    pub fn is_private(&self) -> bool {
        matches!(self.material, Some(KeyMaterial::Private(_)))
    }

    /// Modulus size in bits, `0` when nothing is loaded.
    pub fn bits(&self) -> usize {
        self.material.as_ref().map_or(0, KeyMaterial::bits)
    }

    /// A public-only copy of this key.
    pub fn public_key(&self) -> Result<CryptoKey, KeyError> {
        let public = self.material.as_ref().ok_or(KeyError::NotLoaded)?.public();
        Ok(CryptoKey { material: Some(KeyMaterial::Public(public)) })
    }

    fn public_der(&self) -> Result<Vec<u8>, KeyError> {
        let public = self.material.as_ref().ok_or(KeyError::NotLoaded)?.public();
        let doc = public.to_pkcs1_der().map_err(|e| KeyError::Der(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn encode_public_key(&self, encoding: Encoding) -> Result<Vec<u8>, KeyError> {
        let der = self.public_der()?;
        Ok(match encoding {
            Encoding::Der => der,
            Encoding::Pem => key_writer::write_pem(KeyType::PublicKey, &der),
        })
    }

    pub fn encode_private_key(&self, encoding: Encoding) -> Result<Vec<u8>, KeyError> {
        let private = match &self.material {
            Some(KeyMaterial::Private(key)) => key,
            Some(KeyMaterial::Public(_)) => return Err(KeyError::NotPrivate),
            None => return Err(KeyError::NotLoaded),
        };
        let doc = private.to_pkcs1_der().map_err(|e| KeyError::Der(e.to_string()))?;
        Ok(match encoding {
            Encoding::Der => doc.as_bytes().to_vec(),
            Encoding::Pem => key_writer::write_pem(KeyType::PrivateKey, doc.as_bytes()),
        })
    }

    /// SHA-1 over the DER `RSAPublicKey` encoding.
    pub fn public_key_digest(&self) -> Result<Digest, KeyError> {
        let der = self.public_der()?;
        Ok(Sha1::digest(&der).into())
    }

    /// Base32 of the first 80 bits of [`CryptoKey::public_key_digest`].
    pub fn network_identity(&self) -> Result<String, KeyError> {
        let digest = self.public_key_digest()?;
        Ok(base32::encode(&digest[..IDENTITY_DIGEST_BYTES]))
    }
}

/// Whether `id` has the shape of a network identity.
pub fn is_valid_network_identity(id: &str) -> bool {
    id.len() == NETWORK_IDENTITY_LEN && id.bytes().all(|c| base32::ALPHABET.contains(&c))
}
