//! Lowercase base32 (RFC 4648 alphabet, no padding on output).
//!
//! Used to turn key digests and random tokens into text. Decoding accepts
//! either case and stops at the first `=` or NUL byte.

use thiserror::Error;

pub const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

const PAD: u8 = b'=';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Base32Error {
    #[error("invalid base32 symbol 0x{byte:02x} at offset {offset}")]
    InvalidSymbol { byte: u8, offset: usize },
    #[error("destination too small: need {needed} bytes, have {available}")]
    Capacity { needed: usize, available: usize },
}

/// Number of symbols `encode` produces for `len` input bytes.
pub fn encoded_len(len: usize) -> usize {
    (len * 8 + 4) / 5
}

fn symbol_value(c: u8) -> Option<u8> {
    match c {
        b'a'..=b'z' => Some(c - b'a'),
        b'A'..=b'Z' => Some(c - b'A'),
        b'2'..=b'7' => Some(c - b'2' + 26),
        _ => None,
    }
}

fn is_terminator(c: u8) -> bool {
    c == PAD || c == 0
}

pub fn encode(src: &[u8]) -> String {
    let mut out = vec![0u8; encoded_len(src.len())];
    let n = write_symbols(src, &mut out);
    out.truncate(n);
    // ALPHABET is ASCII
    out.into_iter().map(char::from).collect()
}

/// Encodes into `dest`, returning the number of symbols written.
pub fn encode_to_slice(src: &[u8], dest: &mut [u8]) -> Result<usize, Base32Error> {
    let needed = encoded_len(src.len());
    if dest.len() < needed {
        return Err(Base32Error::Capacity { needed, available: dest.len() });
    }
    Ok(write_symbols(src, &mut dest[..needed]))
}

// `dest` must hold at least `encoded_len(src.len())` bytes.
fn write_symbols(src: &[u8], dest: &mut [u8]) -> usize {
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    let mut i = 0;
    for &b in src {
        acc = (acc << 8) | b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            dest[i] = ALPHABET[((acc >> bits) & 0x1f) as usize];
            i += 1;
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        dest[i] = ALPHABET[((acc << (5 - bits)) & 0x1f) as usize];
        i += 1;
    }
    i
}

/// Counts the significant symbols of `src`, validating each one.
fn significant_symbols(src: &[u8]) -> Result<usize, Base32Error> {
    let mut n = 0;
    for (offset, &byte) in src.iter().enumerate() {
        if is_terminator(byte) {
            break;
        }
        if symbol_value(byte).is_none() {
            return Err(Base32Error::InvalidSymbol { byte, offset });
        }
        n += 1;
    }
    Ok(n)
}

/// Number of bytes `decode` would produce for `src`.
pub fn decoded_len(src: &[u8]) -> Result<usize, Base32Error> {
    Ok(significant_symbols(src)? * 5 / 8)
}

pub fn decode(src: impl AsRef<[u8]>) -> Result<Vec<u8>, Base32Error> {
    let src = src.as_ref();
    let mut out = vec![0u8; decoded_len(src)?];
    let n = decode_to_slice(src, &mut out)?;
    out.truncate(n);
    Ok(out)
}

/// Decodes into `dest`, returning the number of bytes written.
///
/// On error nothing is written to `dest`.
pub fn decode_to_slice(src: &[u8], dest: &mut [u8]) -> Result<usize, Base32Error> {
    let symbols = significant_symbols(src)?;
    let needed = symbols * 5 / 8;
    if dest.len() < needed {
        return Err(Base32Error::Capacity { needed, available: dest.len() });
    }
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    let mut i = 0;
    for &c in &src[..symbols] {
        // validated by significant_symbols
        let v = symbol_value(c).unwrap_or(0);
        acc = (acc << 5) | v as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            dest[i] = (acc >> bits) as u8;
            i += 1;
            acc &= (1 << bits) - 1;
        }
    }
    Ok(i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_encode_vectors() {
        assert_eq!(encode(b"test0"), "orsxg5bq");
        assert_eq!(encode(&hex::decode("fff56d44ae0d5cc962c4").unwrap()), "772w2rfobvomsywe");
        assert_eq!(
            encode(&hex::decode("1878a6d332c8ce9159aac738873784").unwrap()),
            "db4knuzszdhjcwnky44ion4e"
        );
    }

    #[test]
    fn test_encode_partial_group() {
        let full = hex::decode("2ed063e25b16dfc4fc0123c9ebf68371e48ea01c0865abb2583cd5d360").unwrap();
        assert_eq!(encode(&full), "f3ighys3c3p4j7abepe6x5udohsi5ia4bbs2xmsyhtk5gya");
        assert_eq!(encode(&full[..26]), "f3ighys3c3p4j7abepe6x5udohsi5ia4bbs2xmsyhq");
        assert_eq!(encode(&[]), "");
        for len in 0..20 {
            assert_eq!(encode(&vec![0xa5; len]).len(), encoded_len(len));
        }
    }

    #[test]
    fn test_encode_to_slice() {
        let mut buf = [0u8; 8];
        assert_eq!(encode_to_slice(b"test0", &mut buf), Ok(8));
        assert_eq!(&buf, b"orsxg5bq");
        let mut short = [0u8; 7];
        assert_eq!(
            encode_to_slice(b"test0", &mut short),
            Err(Base32Error::Capacity { needed: 8, available: 7 })
        );
    }

    #[test]
    fn test_decode_known() {
        assert_eq!(decode("orsxg5bq").unwrap(), b"test0");
        assert_eq!(decode("ORSXG5BQ").unwrap(), b"test0");
        assert_eq!(decode("").unwrap(), b"");
    }

    #[test]
    fn test_decode_terminators() {
        assert_eq!(decode("orsxg5bq=").unwrap(), b"test0");
        assert_eq!(decode("orsxg5bq===").unwrap(), b"test0");
        assert_eq!(decode("orsxg5bq======").unwrap(), b"test0");
        assert_eq!(decode(b"orsxg5bq\0\0\0\0\0").unwrap(), b"test0");
        // nothing past the terminator is looked at
        assert_eq!(decode(b"orsxg5bq=@@!").unwrap(), b"test0");
        assert_eq!(decode(b"orsxg5bq\0zz").unwrap(), b"test0");
    }

    #[test]
    fn test_decode_invalid() {
        assert_eq!(decode("@rsxg5bq"), Err(Base32Error::InvalidSymbol { byte: b'@', offset: 0 }));
        assert_eq!(decode("orsx1"), Err(Base32Error::InvalidSymbol { byte: b'1', offset: 4 }));
        assert!(decode("orsx g5bq").is_err());
        assert!(decode("orsxg5bq\n").is_err());
    }

    #[test]
    fn test_decode_capacity() {
        let mut buf = [0xffu8; 4];
        assert_eq!(
            decode_to_slice(b"orsxg5bq", &mut buf),
            Err(Base32Error::Capacity { needed: 5, available: 4 })
        );
        assert_eq!(buf, [0xff; 4]);
        let mut buf = [0u8; 60];
        assert_eq!(decode_to_slice(b"orsxg5bq", &mut buf), Ok(5));
        assert_eq!(&buf[..5], b"test0");
    }

    #[test]
    fn test_decoded_len() {
        assert_eq!(decoded_len(b"orsxg5bq"), Ok(5));
        assert_eq!(decoded_len(b"orsxg5b"), Ok(4));
        assert_eq!(decoded_len(b"o="), Ok(0));
    }

    #[test]
    fn test_round_trip_random() {
        let mut rng = rand::thread_rng();
        for len in 0..=1000 {
            let mut data = vec![0u8; len];
            rng.fill_bytes(&mut data);
            let encoded = encode(&data);
            assert_eq!(decode(&encoded).unwrap(), data, "length {}", len);
            assert_eq!(decode(encoded.to_uppercase()).unwrap(), data);
        }
    }

    #[test]
    fn test_corrupted_symbol() {
        let mut data = [0u8; 60];
        rand::thread_rng().fill_bytes(&mut data);
        let mut encoded = encode(&data).to_uppercase().into_bytes();
        assert_eq!(encoded.len(), 96);
        encoded[0] = if encoded[0] == b'A' { b'B' } else { b'A' };
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.len(), 60);
        assert_ne!(&decoded[..], &data[..]);

        encoded[0] = b'@';
        assert!(decode(&encoded).is_err());
    }
}
