use std::fmt;
use std::str::FromStr;

use crate::error::BarcodeError;

/// Object tracking code: two service letters, nine digits, two country
/// letters (`JC123456789BR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingCode(String);

impl TrackingCode {
    pub const LEN: usize = 13;

    /// Accepts embedded whitespace and lower case; stores the compact
    /// upper-case form.
    pub fn parse(input: &str) -> Result<Self, BarcodeError> {
        let compact: String = input
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .map(|ch| ch.to_ascii_uppercase())
            .collect();
        let bytes = compact.as_bytes();
        let valid = bytes.len() == Self::LEN
            && bytes[..2].iter().all(u8::is_ascii_uppercase)
            && bytes[2..11].iter().all(u8::is_ascii_digit)
            && bytes[11..].iter().all(u8::is_ascii_uppercase);
        if !valid {
            return Err(BarcodeError::InvalidTrackingCode(input.to_string()));
        }
        Ok(Self(compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn service_prefix(&self) -> &str {
        &self.0[..2]
    }

    pub fn country(&self) -> &str {
        &self.0[11..]
    }

    /// Grouped form printed under the code: `AA 123 456 789 BB`.
    pub fn display(&self) -> String {
        let code = &self.0;
        format!(
            "{} {} {} {} {}",
            &code[..2],
            &code[2..5],
            &code[5..8],
            &code[8..11],
            &code[11..]
        )
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TrackingCode {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
