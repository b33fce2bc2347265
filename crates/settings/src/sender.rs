use std::fs;
use std::path::Path;

use labelkit_address::{Sender, SenderRecord};

use crate::config::SettingsError;

/// Validates a raw sender profile, reporting every missing field at once.
pub fn parse_sender(record: SenderRecord) -> Result<Sender, SettingsError> {
    let issues = record.validate_profile();
    if !issues.is_empty() {
        return Err(SettingsError::InvalidSender { issues });
    }
    Ok(Sender::try_from(record)?)
}

pub fn load_sender(path: impl AsRef<Path>) -> Result<Sender, SettingsError> {
    let path = path.as_ref().to_path_buf();
    let contents = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
        path: path.clone(),
        source,
    })?;
    let record: SenderRecord =
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
    parse_sender(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelkit_address::SenderIssue;

    #[test]
    fn incomplete_profile_lists_all_issues() {
        let record = SenderRecord {
            name: "Acme".into(),
            cep: "5001".into(),
            ..Default::default()
        };
        match parse_sender(record) {
            Err(SettingsError::InvalidSender { issues }) => {
                assert!(issues.contains(&SenderIssue::MissingField("bairro")));
                assert!(issues.contains(&SenderIssue::InvalidPostalCode));
            }
            other => panic!("expected InvalidSender, got {other:?}"),
        }
    }
}
