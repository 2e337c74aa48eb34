use crate::key::KeyType;

/// Base64 characters per PEM body line.
pub const BASE64_SPLIT: usize = 64;

pub fn header(key_type: KeyType) -> String {
    format!("-----BEGIN {}-----", key_type.pem_label())
}

pub fn footer(key_type: KeyType) -> String {
    format!("-----END {}-----", key_type.pem_label())
}

/// Frames `der` as a PEM block, each line ending in `\n`.
pub fn write_pem(key_type: KeyType, der: &[u8]) -> Vec<u8> {
    let body = base64::encode_config(der, base64::STANDARD);
    let header = header(key_type);
    let footer = footer(key_type);
    let lines = (body.len() + BASE64_SPLIT - 1) / BASE64_SPLIT;
    let mut out = Vec::with_capacity(header.len() + footer.len() + body.len() + lines + 2);
    out.extend_from_slice(header.as_bytes());
    out.push(b'\n');
    // base64 output is ASCII, so byte chunks are whole characters
    for line in body.as_bytes().chunks(BASE64_SPLIT) {
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out.extend_from_slice(footer.as_bytes());
    out.push(b'\n');
    out
}
