use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, format::FormatRegistry};

/// Engine wide thresholds, read from a RON file. Missing fields keep their
/// defaults.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registered teams needed to start a tournament.
    pub min_teams: usize,
    /// Classified teams needed to build a bracket from the groups.
    pub min_bracket_teams: usize,
    pub classifiers_per_group: u8,
    /// Refuse to build the bracket while group matches are pending.
    pub require_complete_groups: bool,
    /// A topology table that replaces the built-in one.
    pub formats: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_teams: 4,
            min_bracket_teams: 4,
            classifiers_per_group: 2,
            require_complete_groups: true,
            formats: None,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// If the string is not RON or the values make no sense.
    pub fn from_ron(string: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(string)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// If the file can't be read or [`EngineConfig::from_ron`] fails.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let string = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_ron(&string)?;
        if let Some(formats) = &config.formats
            && formats.is_relative()
            && let Some(parent) = path.parent()
        {
            config.formats = Some(parent.join(formats));
        }

        Ok(config)
    }

    /// # Errors
    ///
    /// If a threshold is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_teams < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_teams has to be at least 2, got {}",
                self.min_teams
            )));
        }
        if self.min_bracket_teams < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_bracket_teams has to be at least 2, got {}",
                self.min_bracket_teams
            )));
        }
        if self.classifiers_per_group == 0 {
            return Err(ConfigError::Invalid(
                "classifiers_per_group has to be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// The configured topology table, or the built-in one.
    ///
    /// # Errors
    ///
    /// If the table can't be loaded or doesn't validate.
    pub fn registry(&self) -> Result<FormatRegistry, ConfigError> {
        let registry = match &self.formats {
            Some(path) => {
                log::info!("loading tournament formats from {}", path.display());
                FormatRegistry::from_path(path)?
            }
            None => FormatRegistry::builtin()?,
        };

        Ok(registry)
    }
}
