use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AddressError;
use crate::postal_code::PostalCode;

/// Unvalidated destination record as it arrives from callers (JSON, forms).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(default, rename = "destinatario", skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(rename = "logradouro")]
    pub street: String,
    #[serde(default, rename = "numero")]
    pub number: String,
    #[serde(default, rename = "complemento", skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    pub district: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "estado")]
    pub state: String,
    pub cep: String,
}

/// Validated destination address.
///
/// Required: street, district, city, state, postal code. The building number
/// may be empty (printed as `s/n`); recipient and complement are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AddressRecord", into = "AddressRecord")]
pub struct Address {
    pub recipient: Option<String>,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: PostalCode,
}

impl TryFrom<AddressRecord> for Address {
    type Error = AddressError;

    fn try_from(record: AddressRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            recipient: optional(record.recipient),
            street: required("logradouro", &record.street)?,
            number: record.number.trim().to_string(),
            complement: optional(record.complement),
            district: required("bairro", &record.district)?,
            city: required("cidade", &record.city)?,
            state: state(&record.state)?,
            postal_code: PostalCode::parse(&record.cep)?,
        })
    }
}

impl From<Address> for AddressRecord {
    fn from(address: Address) -> Self {
        Self {
            recipient: address.recipient,
            street: address.street,
            number: address.number,
            complement: address.complement,
            district: address.district,
            city: address.city,
            state: address.state,
            cep: address.postal_code.into(),
        }
    }
}

/// Unvalidated sender (return address) profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderRecord {
    #[serde(default, rename = "nome")]
    pub name: String,
    #[serde(default, rename = "logradouro")]
    pub street: String,
    #[serde(default, rename = "numero")]
    pub number: String,
    #[serde(default, rename = "complemento", skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, rename = "bairro")]
    pub district: String,
    #[serde(default, rename = "cidade")]
    pub city: String,
    #[serde(default, rename = "estado")]
    pub state: String,
    #[serde(default)]
    pub cep: String,
}

/// A single problem found while checking a sender profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SenderIssue {
    #[error("sender field `{0}` is required")]
    MissingField(&'static str),
    #[error("sender postal code must have 8 digits")]
    InvalidPostalCode,
}

impl SenderRecord {
    /// Lists every problem with the profile instead of stopping at the first.
    pub fn validate_profile(&self) -> Vec<SenderIssue> {
        let required = [
            ("nome", &self.name),
            ("logradouro", &self.street),
            ("numero", &self.number),
            ("bairro", &self.district),
            ("cidade", &self.city),
            ("estado", &self.state),
            ("cep", &self.cep),
        ];
        let mut issues: Vec<SenderIssue> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| SenderIssue::MissingField(*field))
            .collect();
        if !self.cep.trim().is_empty() && PostalCode::parse(&self.cep).is_err() {
            issues.push(SenderIssue::InvalidPostalCode);
        }
        issues
    }
}

/// Validated sender block. Same geographic shape as [`Address`] with a
/// mandatory display name instead of an optional recipient override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SenderRecord", into = "SenderRecord")]
pub struct Sender {
    pub name: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    pub postal_code: PostalCode,
}

impl TryFrom<SenderRecord> for Sender {
    type Error = AddressError;

    fn try_from(record: SenderRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required("nome", &record.name)?,
            street: required("logradouro", &record.street)?,
            number: record.number.trim().to_string(),
            complement: optional(record.complement),
            district: required("bairro", &record.district)?,
            city: required("cidade", &record.city)?,
            state: state(&record.state)?,
            postal_code: PostalCode::parse(&record.cep)?,
        })
    }
}

impl From<Sender> for SenderRecord {
    fn from(sender: Sender) -> Self {
        Self {
            name: sender.name,
            street: sender.street,
            number: sender.number,
            complement: sender.complement,
            district: sender.district,
            city: sender.city,
            state: sender.state,
            cep: sender.postal_code.into(),
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn state(value: &str) -> Result<String, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::MissingField("estado"));
    }
    if trimmed.chars().count() != 2 || !trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(AddressError::InvalidState(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
