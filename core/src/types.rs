//! Shared primitive types used across the case-assignment engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, unique identifier for a persisted user.
pub type UserId = String;

/// A stable, unique identifier for any persisted record (group, division, case row).
pub type RecordId = String;

/// Character offset where the analysis seed digits begin.
pub const ANALYSIS_SEED_OFFSET: usize = 7;

/// Character offset where the count seed digits begin.
pub const COUNT_SEED_OFFSET: usize = 5;

/// Sample family, encoded as the first character of a case identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaseType {
    L,
    G,
}

impl CaseType {
    pub const ALL: [CaseType; 2] = [CaseType::L, CaseType::G];

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'L' => Some(Self::L),
            'G' => Some(Self::G),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::G => "G",
        }
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a group performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    Analysis,
    Count,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Count => "count",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "analysis" => Some(Self::Analysis),
            "count" => Some(Self::Count),
            _ => None,
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a discovered token is not a usable case identifier.
/// Never surfaced as an error: the driver simply drops these tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    UnknownType(char),
    Empty,
    BadSeed { offset: usize },
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType(c) => write!(f, "unknown case type prefix '{c}'"),
            Self::Empty => f.write_str("empty case identifier"),
            Self::BadSeed { offset } => write!(f, "no digit seed at offset {offset}"),
        }
    }
}

/// A validated case identifier, e.g. `L2104052638`.
///
/// Layout: one type character, then digits. The analysis seed is the digit
/// run from character 7 onward, the count seed from character 5 onward.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaseId {
    raw: String,
    case_type: CaseType,
}

impl CaseId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let first = raw.chars().next().ok_or(IdentifierError::Empty)?;
        let case_type = CaseType::from_prefix(first).ok_or(IdentifierError::UnknownType(first))?;
        for offset in [COUNT_SEED_OFFSET, ANALYSIS_SEED_OFFSET] {
            let digits = seed_digits(raw, offset);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(IdentifierError::BadSeed { offset });
            }
        }
        Ok(Self {
            raw: raw.to_string(),
            case_type,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn case_type(&self) -> CaseType {
        self.case_type
    }

    /// Seed used to pick the analysis pair, reduced modulo `modulus`.
    pub fn analysis_residue(&self, modulus: u64) -> u64 {
        residue(seed_digits(&self.raw, ANALYSIS_SEED_OFFSET), modulus)
    }

    /// Seed used to pick the counter, reduced modulo `modulus`.
    pub fn count_residue(&self, modulus: u64) -> u64 {
        residue(seed_digits(&self.raw, COUNT_SEED_OFFSET), modulus)
    }
}

impl TryFrom<String> for CaseId {
    type Error = IdentifierError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<CaseId> for String {
    fn from(id: CaseId) -> Self {
        id.raw
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn seed_digits(raw: &str, offset: usize) -> &str {
    match raw.char_indices().nth(offset) {
        Some((idx, _)) => &raw[idx..],
        None => "",
    }
}

// Digit-by-digit reduction: seeds may be longer than any integer type.
fn residue(digits: &str, modulus: u64) -> u64 {
    debug_assert!(modulus > 0);
    let m = modulus as u128;
    digits
        .bytes()
        .fold(0u128, |acc, b| (acc * 10 + u128::from(b - b'0')) % m) as u64
}
