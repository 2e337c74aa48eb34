//! PKCS#1 v1.5 signatures over SHA-256.
//!
//! `sign_data`/`verify_data` hash the message themselves; the `_sha256`
//! variants take the 32-byte digest directly. Both produce and accept the
//! same signatures.

use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::key::{CryptoKey, KeyError, KeyMaterial, SHA256_DIGEST_LEN};

fn scheme() -> Pkcs1v15Sign {
    Pkcs1v15Sign::new::<Sha256>()
}

pub fn sha256(data: &[u8]) -> [u8; SHA256_DIGEST_LEN] {
    Sha256::digest(data).into()
}

impl CryptoKey {
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.sign_sha256(&sha256(data))
    }

    pub fn verify_data(&self, data: &[u8], signature: &[u8]) -> bool {
        self.verify_sha256(&sha256(data), signature)
    }

    pub fn sign_sha256(&self, digest: &[u8]) -> Result<Vec<u8>, KeyError> {
        let private = match &self.material {
            Some(KeyMaterial::Private(key)) => key,
            Some(KeyMaterial::Public(_)) => {
                warn!("signature requested from a public key");
                return Err(KeyError::NotPrivate);
            }
            None => {
                warn!("signature requested with no key loaded");
                return Err(KeyError::NotLoaded);
            }
        };
        if digest.len() != SHA256_DIGEST_LEN {
            return Err(KeyError::InvalidDigest { expected: SHA256_DIGEST_LEN, actual: digest.len() });
        }
        private.sign(scheme(), digest).map_err(|e| KeyError::Signing(e.to_string()))
    }

    pub fn verify_sha256(&self, digest: &[u8], signature: &[u8]) -> bool {
        let Some(material) = &self.material else {
            return false;
        };
        if digest.len() != SHA256_DIGEST_LEN {
            return false;
        }
        match material.public().verify(scheme(), digest, signature) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "signature rejected");
                false
            }
        }
    }
}
