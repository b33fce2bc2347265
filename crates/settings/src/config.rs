use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use labelkit_address::SenderIssue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

const DEFAULT_DPI: u32 = 300;
const DEFAULT_FONT: &str = "Helvetica";
const DEFAULT_MIN_FONT_SIZE: f32 = 10.0;
const DEFAULT_SERVICE_TYPE: &str = "03";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} must contain a JSON object")]
    NotAnObject { path: PathBuf },
    #[error("config update rejected: {source}")]
    InvalidUpdate {
        #[source]
        source: serde_json::Error,
    },
    #[error("sender profile is incomplete: {}", render_issues(.issues))]
    InvalidSender { issues: Vec<SenderIssue> },
    #[error(transparent)]
    Address(#[from] labelkit_address::AddressError),
}

fn render_issues(issues: &[SenderIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Generation settings, keyed by their wire names.
///
/// Unknown top-level keys survive a load/merge/save cycle through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(rename = "resolucao_dpi", default = "default_dpi")]
    pub dpi: u32,
    #[serde(rename = "incluir_cepnet", default = "default_true")]
    pub include_cepnet: bool,
    #[serde(rename = "incluir_datamatrix", default)]
    pub include_datamatrix: bool,
    /// Informational only: pages are always set in the built-in Helvetica
    /// pair. Kept so the key round-trips through `load`/`merge`.
    #[serde(rename = "fonte_padrao", default = "default_font")]
    pub default_font: String,
    #[serde(rename = "tamanho_fonte_min", default = "default_min_font_size")]
    pub min_font_size: f32,
    #[serde(default)]
    pub datamatrix: DataMatrixDefaults,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_true() -> bool {
    true
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_min_font_size() -> f32 {
    DEFAULT_MIN_FONT_SIZE
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            include_cepnet: true,
            include_datamatrix: false,
            default_font: default_font(),
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            datamatrix: DataMatrixDefaults::default(),
            extra: BTreeMap::new(),
        }
    }
}

/// Defaults for the 2-D symbol payload fields that do not come from the
/// addresses themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMatrixDefaults {
    #[serde(rename = "idv_padrao", default = "default_service_type")]
    pub service_type: String,
    #[serde(default)]
    pub cnae: String,
    #[serde(rename = "servicos_adicionais", default)]
    pub additional_services: Vec<String>,
    #[serde(rename = "codigo_servico", default)]
    pub principal_service: String,
    #[serde(default)]
    pub cif: String,
}

fn default_service_type() -> String {
    DEFAULT_SERVICE_TYPE.to_string()
}

impl Default for DataMatrixDefaults {
    fn default() -> Self {
        Self {
            service_type: default_service_type(),
            cnae: String::new(),
            additional_services: Vec::new(),
            principal_service: String::new(),
            cif: String::new(),
        }
    }
}

impl GenerationConfig {
    pub fn sanitize(&mut self) {
        if self.dpi == 0 {
            self.dpi = DEFAULT_DPI;
        }
        if !self.min_font_size.is_finite() || self.min_font_size <= 0.0 {
            self.min_font_size = DEFAULT_MIN_FONT_SIZE;
        }
        if self.default_font.trim().is_empty() {
            self.default_font = default_font();
        }
    }

    /// Shallow merge: each top-level key in `update` replaces the current
    /// value wholesale. A nested `datamatrix` object is not merged key by
    /// key; its omitted keys fall back to their defaults.
    ///
    /// On a type error nothing is changed.
    pub fn merge(&mut self, update: &Map<String, Value>) -> Result<(), SettingsError> {
        let mut current = match serde_json::to_value(&*self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(source) => return Err(SettingsError::InvalidUpdate { source }),
        };
        for (key, value) in update {
            current.insert(key.clone(), value.clone());
        }
        let mut merged: GenerationConfig = serde_json::from_value(Value::Object(current))
            .map_err(|source| SettingsError::InvalidUpdate { source })?;
        merged.sanitize();

        let keys: Vec<&str> = update.keys().map(String::as_str).collect();
        tracing::debug!(?keys, "merged generation config update");
        *self = merged;
        Ok(())
    }

    /// Loads a full config, applying defaults for missing keys.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let update = read_update(path)?;
        let mut config = Self::default();
        config.merge(&update)?;
        Ok(config)
    }
}

/// Reads a JSON object to be fed to [`GenerationConfig::merge`].
pub fn read_update(path: impl AsRef<Path>) -> Result<Map<String, Value>, SettingsError> {
    let path = path.as_ref().to_path_buf();
    let contents = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
        path: path.clone(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
        path: path.clone(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SettingsError::NotAnObject { path }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn defaults_match_wire_defaults() {
        let config: GenerationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GenerationConfig::default());
        assert_eq!(config.dpi, 300);
        assert!(config.include_cepnet);
        assert!(!config.include_datamatrix);
        assert_eq!(config.datamatrix.service_type, "03");
    }

    #[test]
    fn shallow_merge_only_touches_given_keys() {
        let mut config = GenerationConfig::default();
        config
            .merge(&object(json!({ "incluir_cepnet": false })))
            .unwrap();
        assert!(!config.include_cepnet);
        assert_eq!(config.dpi, 300);
        assert_eq!(config.min_font_size, 10.0);
    }

    #[test]
    fn nested_object_is_replaced_not_merged() {
        let mut config = GenerationConfig::default();
        config
            .merge(&object(json!({
                "datamatrix": { "idv_padrao": "17", "cnae": "4751201" }
            })))
            .unwrap();
        config
            .merge(&object(json!({ "datamatrix": { "cif": "ABC" } })))
            .unwrap();
        assert_eq!(config.datamatrix.cif, "ABC");
        assert_eq!(config.datamatrix.service_type, "03");
        assert_eq!(config.datamatrix.cnae, "");
    }

    #[test]
    fn type_error_leaves_config_intact() {
        let mut config = GenerationConfig::default();
        config.dpi = 203;
        let err = config
            .merge(&object(json!({ "resolucao_dpi": "high", "incluir_cepnet": false })))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidUpdate { .. }));
        assert_eq!(config.dpi, 203);
        assert!(config.include_cepnet);
    }

    #[test]
    fn unknown_keys_are_kept() {
        let mut config = GenerationConfig::default();
        config
            .merge(&object(json!({ "impressora": "zebra" })))
            .unwrap();
        assert_eq!(config.extra.get("impressora"), Some(&json!("zebra")));

        let round: GenerationConfig =
            serde_json::from_value(serde_json::to_value(&config).unwrap()).unwrap();
        assert_eq!(round.extra.get("impressora"), Some(&json!("zebra")));
    }

    #[test]
    fn zero_dpi_is_sanitized() {
        let mut config = GenerationConfig::default();
        config.merge(&object(json!({ "resolucao_dpi": 0 }))).unwrap();
        assert_eq!(config.dpi, 300);
    }

    #[test]
    fn default_font_round_trips_through_merge() {
        let mut config = GenerationConfig::default();
        let update = json!({ "fonte_padrao": "Arial" });
        config.merge(update.as_object().unwrap()).unwrap();
        assert_eq!(config.default_font, "Arial");

        let blank = json!({ "fonte_padrao": "  " });
        config.merge(blank.as_object().unwrap()).unwrap();
        assert_eq!(config.default_font, "Helvetica");

        let serialized = serde_json::to_value(&config).unwrap();
        assert_eq!(serialized["fonte_padrao"], "Helvetica");
        assert!(config.extra.is_empty());
    }
}
