// ABOUTME: Validator BLS public key type and account-list output parser
// ABOUTME: Extracts deduplicated, lower-case canonical keys from free-text CLI output

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of a compressed BLS12-381 public key in bytes.
pub const PUBKEY_LEN: usize = 48;

/// `0x` followed by 96 hex digits. The parser drops a match that is directly
/// followed by another hex digit, so a longer hash is never cut into a key.
static PUBKEY_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"0x[0-9a-fA-F]{96}").expect("pubkey pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PubkeyError {
    #[error("public key must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("public key must be {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("public key is not valid hex: {0}")]
    InvalidHex(String),
    #[error("No validator accounts found")]
    NoAccountsFound,
}

/// A validator's 48-byte BLS public key.
///
/// Identity is the raw bytes; the text form is `0x` followed by 96 lower-case
/// hex characters. Parsing accepts either case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidatorPublicKey([u8; PUBKEY_LEN]);

impl ValidatorPublicKey {
    pub fn from_bytes(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }
}

impl FromStr for ValidatorPublicKey {
    type Err = PubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| PubkeyError::MissingPrefix(s.to_string()))?;
        if digits.len() != PUBKEY_LEN * 2 {
            return Err(PubkeyError::InvalidLength {
                expected: PUBKEY_LEN * 2,
                actual: digits.len(),
            });
        }
        let mut bytes = [0u8; PUBKEY_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| PubkeyError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ValidatorPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ValidatorPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValidatorPublicKey({})", self)
    }
}

impl Serialize for ValidatorPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ValidatorPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Non-empty, duplicate-free set of keys in the order they were discovered.
///
/// Serialized as a plain list; deserializing goes through [`ValidatorKeySet::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<ValidatorPublicKey>",
    into = "Vec<ValidatorPublicKey>"
)]
pub struct ValidatorKeySet {
    keys: Vec<ValidatorPublicKey>,
}

impl ValidatorKeySet {
    /// Build a set from arbitrary keys, collapsing duplicates.
    ///
    /// Returns [`PubkeyError::NoAccountsFound`] when `keys` is empty.
    pub fn new<I>(keys: I) -> Result<Self, PubkeyError>
    where
        I: IntoIterator<Item = ValidatorPublicKey>,
    {
        let mut seen = HashSet::new();
        let keys: Vec<_> = keys.into_iter().filter(|k| seen.insert(*k)).collect();
        if keys.is_empty() {
            return Err(PubkeyError::NoAccountsFound);
        }
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidatorPublicKey> {
        self.keys.iter()
    }

    pub fn contains(&self, key: &ValidatorPublicKey) -> bool {
        self.keys.contains(key)
    }

    /// Comma-joined canonical keys, as taken by `--backup-public-keys`.
    pub fn to_csv(&self) -> String {
        self.keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl TryFrom<Vec<ValidatorPublicKey>> for ValidatorKeySet {
    type Error = PubkeyError;

    fn try_from(keys: Vec<ValidatorPublicKey>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<ValidatorKeySet> for Vec<ValidatorPublicKey> {
    fn from(set: ValidatorKeySet) -> Self {
        set.keys
    }
}

impl<'a> IntoIterator for &'a ValidatorKeySet {
    type Item = &'a ValidatorPublicKey;
    type IntoIter = std::slice::Iter<'a, ValidatorPublicKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Parse the public keys out of `validator accounts list` output.
///
/// Prysm prints one account per block:
///
/// ```text
/// Showing 2 validator accounts
///
/// Account 0 | definitely-evolving-honeybee
/// [validating public key] 0x80b11b83...fea33c6
///
/// Account 1 | implicitly-ultimate-emu
/// [validating public key] 0x8ac669f5...2b2a775
/// ```
///
/// Every `0x` run of exactly 96 hex digits is taken as a key, even when it
/// is glued onto preceding text. An output without any key is an error,
/// never an empty success.
pub fn parse_validator_pubkeys(output: &str) -> Result<ValidatorKeySet, PubkeyError> {
    let keys = PUBKEY_CANDIDATE
        .find_iter(output)
        .filter(|m| {
            !output[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_hexdigit())
        })
        .filter_map(|m| m.as_str().parse::<ValidatorPublicKey>().ok());
    ValidatorKeySet::new(keys)
}
