//! Stellar strkey parsing.
//!
//! A strkey is `base32(version_byte || payload || crc16_le)` with no padding.
//! This pipeline only deals in two flavors: ed25519 account ids (`G...`) and
//! contract ids (`C...`), both carrying a 32-byte payload and therefore always
//! 56 characters long.

use data_encoding::BASE32_NOPAD;
use thiserror::Error;

const VERSION_ACCOUNT_ED25519: u8 = 6 << 3; // 'G'
const VERSION_CONTRACT: u8 = 2 << 3; // 'C'

#[derive(Debug, Error)]
pub enum StrkeyError {
    #[error("strkey must be 56 characters, got {0}")]
    Length(usize),
    #[error("strkey contains a character outside the base32 alphabet")]
    Charset,
    #[error("unsupported strkey version byte {0:#04x}")]
    Version(u8),
    #[error("strkey checksum mismatch")]
    Checksum,
}

/// A decoded strkey of one of the kinds this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strkey {
    AccountEd25519([u8; 32]),
    Contract([u8; 32]),
}

impl Strkey {
    pub fn payload(&self) -> &[u8; 32] {
        match self {
            Strkey::AccountEd25519(key) => key,
            Strkey::Contract(hash) => hash,
        }
    }
}

pub fn decode(input: &str) -> Result<Strkey, StrkeyError> {
    if input.len() != 56 {
        return Err(StrkeyError::Length(input.len()));
    }

    let raw = BASE32_NOPAD
        .decode(input.as_bytes())
        .map_err(|_| StrkeyError::Charset)?;
    debug_assert_eq!(raw.len(), 35);

    let version = raw[0];
    let payload: [u8; 32] = raw[1..33]
        .try_into()
        .expect("35-byte strkey body always holds a 32-byte payload");
    let checksum = u16::from_le_bytes([raw[33], raw[34]]);

    if crc16_xmodem(&raw[..33]) != checksum {
        return Err(StrkeyError::Checksum);
    }

    match version {
        VERSION_ACCOUNT_ED25519 => Ok(Strkey::AccountEd25519(payload)),
        VERSION_CONTRACT => Ok(Strkey::Contract(payload)),
        other => Err(StrkeyError::Version(other)),
    }
}

/// Decode an account strkey (`G...`), rejecting every other kind.
pub fn decode_account(input: &str) -> Result<[u8; 32], StrkeyError> {
    match decode(input)? {
        Strkey::AccountEd25519(key) => Ok(key),
        Strkey::Contract(_) => Err(StrkeyError::Version(VERSION_CONTRACT)),
    }
}

/// Decode a contract strkey (`C...`), rejecting every other kind.
pub fn decode_contract(input: &str) -> Result<[u8; 32], StrkeyError> {
    match decode(input)? {
        Strkey::Contract(hash) => Ok(hash),
        Strkey::AccountEd25519(_) => Err(StrkeyError::Version(VERSION_ACCOUNT_ED25519)),
    }
}

pub fn encode_account(payload: &[u8; 32]) -> String {
    encode(VERSION_ACCOUNT_ED25519, payload)
}

pub fn encode_contract(payload: &[u8; 32]) -> String {
    encode(VERSION_CONTRACT, payload)
}

fn encode(version: u8, payload: &[u8; 32]) -> String {
    let mut raw = Vec::with_capacity(35);
    raw.push(version);
    raw.extend_from_slice(payload);
    let checksum = crc16_xmodem(&raw);
    raw.extend_from_slice(&checksum.to_le_bytes());
    BASE32_NOPAD.encode(&raw)
}

fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    // SEP-23 test vector.
    const VALID_ACCOUNT: &str = "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ";

    #[test]
    fn decodes_known_account_strkey() {
        let decoded = decode(VALID_ACCOUNT).expect("valid account strkey");
        assert!(matches!(decoded, Strkey::AccountEd25519(_)));
        assert_eq!(encode_account(decoded.payload()), VALID_ACCOUNT);
    }

    #[test]
    fn round_trips_account_and_contract_payloads() {
        let payload = [0x5a; 32];
        let account = encode_account(&payload);
        assert_eq!(account.len(), 56);
        assert!(account.starts_with('G'));
        assert_eq!(decode_account(&account).unwrap(), payload);

        let contract = encode_contract(&payload);
        assert!(contract.starts_with('C'));
        assert_eq!(decode_contract(&contract).unwrap(), payload);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(decode("GABC"), Err(StrkeyError::Length(4))));
        assert!(matches!(decode(""), Err(StrkeyError::Length(0))));
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let mut corrupted = String::from(VALID_ACCOUNT);
        // Flip the final character to another alphabet member.
        corrupted.pop();
        corrupted.push(if VALID_ACCOUNT.ends_with('A') { 'B' } else { 'A' });
        assert!(matches!(decode(&corrupted), Err(StrkeyError::Checksum)));
    }

    #[test]
    fn rejects_charset_violations() {
        let lowered = VALID_ACCOUNT.to_lowercase();
        assert!(matches!(decode(&lowered), Err(StrkeyError::Charset)));
        let with_digit = format!("{}1", &VALID_ACCOUNT[..55]);
        assert!(matches!(decode(&with_digit), Err(StrkeyError::Charset)));
    }

    #[test]
    fn rejects_kind_mismatch() {
        let contract = encode_contract(&[7u8; 32]);
        assert!(decode_account(&contract).is_err());
        assert!(decode_contract(VALID_ACCOUNT).is_err());
    }
}
