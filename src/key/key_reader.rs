use rsa::pkcs1::der::Decode;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

use crate::key::{Encoding, KeyError, KeyMaterial, KeyType, MAX_MODULUS_BITS};

const BOUNDARY: &str = "-----";

/// One PEM block split into its boundary lines and base64 body.
#[derive(Debug)]
pub struct KeyReader {
    pub header: String,
    pub footer: String,
    body: String,
}

fn label_of<'a>(line: &'a str, kind: &str) -> Option<&'a str> {
    line.strip_prefix(BOUNDARY)?
        .strip_prefix(kind)?
        .strip_prefix(' ')?
        .strip_suffix(BOUNDARY)
}

impl KeyReader {
    /// Splits out the first PEM block in `data`.
    ///
    /// Explanatory text before the BEGIN line and after the END line is
    /// skipped, as OpenSSL does. A second block is an error.
    pub fn new(data: &[u8]) -> Result<Self, KeyError> {
        let text = std::str::from_utf8(data).map_err(|_| KeyError::Pem("data is not text".to_string()))?;
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
        if lines.peek().is_none() {
            return Err(KeyError::Empty);
        }
        let header = lines
            .by_ref()
            .find(|line| label_of(line, "BEGIN").is_some())
            .ok_or_else(|| KeyError::Pem("missing BEGIN line".to_string()))?
            .to_string();
        let mut footer = None;
        let mut body = String::new();
        for line in lines.by_ref() {
            if line.starts_with(BOUNDARY) {
                if label_of(line, "END").is_none() {
                    return Err(KeyError::Pem(format!("unexpected boundary `{}'", line)));
                }
                footer = Some(line.to_string());
                break;
            }
            body.push_str(line);
        }
        let footer = footer.ok_or_else(|| KeyError::Pem("missing END line".to_string()))?;
        if lines.any(|line| label_of(line, "BEGIN").is_some()) {
            return Err(KeyError::Pem("more than one PEM block".to_string()));
        }
        Ok(Self { header, footer, body })
    }

    /// The label of the BEGIN line, e.g. `RSA PUBLIC KEY`.
    pub fn label(&self) -> &str {
        label_of(&self.header, "BEGIN").unwrap_or_default()
    }

    pub fn expect_label(&self, label: &str) -> Result<(), KeyError> {
        if self.label() != label {
            return Err(KeyError::Pem(format!("expected `{}' block, found `{}'", label, self.label())));
        }
        if label_of(&self.footer, "END") != Some(label) {
            return Err(KeyError::Pem(format!("END line `{}' does not match `{}'", self.footer, label)));
        }
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<u8>, KeyError> {
        let der = base64::decode_config(&self.body, base64::STANDARD)
            .map_err(|e| KeyError::Pem(format!("bad base64 body: {}", e)))?;
        if der.is_empty() {
            return Err(KeyError::Pem("empty body".to_string()));
        }
        Ok(der)
    }
}

fn read_public_der(der: &[u8]) -> Result<RsaPublicKey, KeyError> {
    let key = rsa::pkcs1::RsaPublicKey::from_der(der).map_err(|e| KeyError::Der(e.to_string()))?;
    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(key.modulus.as_bytes()),
        BigUint::from_bytes_be(key.public_exponent.as_bytes()),
        MAX_MODULUS_BITS,
    )
    .map_err(|e| KeyError::Der(e.to_string()))
}

fn read_private_der(der: &[u8]) -> Result<RsaPrivateKey, KeyError> {
    let key = RsaPrivateKey::from_pkcs1_der(der).map_err(|e| KeyError::Der(e.to_string()))?;
    if key.n().bits() > MAX_MODULUS_BITS {
        return Err(KeyError::Der(format!("modulus over {} bits", MAX_MODULUS_BITS)));
    }
    Ok(key)
}

fn read_der(der: &[u8], key_type: KeyType) -> Result<KeyMaterial, KeyError> {
    match key_type {
        KeyType::PublicKey => read_public_der(der).map(KeyMaterial::Public),
        KeyType::PrivateKey => read_private_der(der).map(KeyMaterial::Private),
    }
}

pub(crate) fn read_key(data: &[u8], key_type: KeyType, encoding: Encoding) -> Result<KeyMaterial, KeyError> {
    if data.is_empty() {
        return Err(KeyError::Empty);
    }
    match encoding {
        Encoding::Der => read_der(data, key_type),
        Encoding::Pem => {
            let reader = KeyReader::new(data)?;
            reader.expect_label(key_type.pem_label())?;
            read_der(&reader.read_all()?, key_type)
        }
    }
}
