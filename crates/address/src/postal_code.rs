use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// Eight-digit postal code (CEP).
///
/// Construction strips punctuation and whitespace but never pads or cuts the
/// digits: anything other than exactly eight digits is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    pub const LEN: usize = 8;

    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let digits: String = input.chars().filter(|ch| ch.is_ascii_digit()).collect();
        if digits.len() != Self::LEN {
            return Err(AddressError::InvalidPostalCode {
                input: input.to_string(),
                digits: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    /// The eight bare digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of each digit, most significant first.
    pub fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|byte| byte - b'0')
    }

    /// `DDDDD-DDD`, the only form printed on labels (no "CEP" prefix).
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PostalCode {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}
