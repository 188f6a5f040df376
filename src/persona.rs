//! Persona records and the JSON persona store.
//!
//! A persona file is a JSON array of profile objects in the shape of the
//! Nemotron persona datasets. Only the fields the prompts use are typed; every
//! other field is carried along untouched so a sampled subset can be written
//! back without losing data.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

/// Errors raised while reading or writing persona files.
#[derive(Debug, thiserror::Error)]
pub enum PersonaStoreError {
    /// The persona file does not exist.
    #[error("persona file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },
    /// The file exists but could not be read or written.
    #[error("persona file I/O failed for {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a JSON array of persona objects.
    #[error("invalid persona JSON in {}: {source}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A sample larger than the dataset was requested.
    #[error("cannot sample {requested} personas from a dataset of {available}")]
    SampleTooLarge {
        /// Requested sample size.
        requested: usize,
        /// Number of personas available.
        available: usize,
    },
}

/// One synthetic persona.
///
/// Profiles are produced by the store and only ever read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// Unique identifier (`uuid` in the dataset).
    #[serde(rename = "uuid", default, deserialize_with = "lenient_text")]
    pub id: String,
    /// Age in years.
    #[serde(
        default,
        deserialize_with = "lenient_age",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<u32>,
    /// Sex as written in the dataset.
    #[serde(default, deserialize_with = "lenient_text")]
    pub sex: String,
    /// Occupation.
    #[serde(default, deserialize_with = "lenient_text")]
    pub occupation: String,
    /// Prefecture of residence.
    #[serde(default, deserialize_with = "lenient_text")]
    pub prefecture: String,
    /// Broader region the prefecture belongs to.
    #[serde(default, deserialize_with = "lenient_text")]
    pub region: String,
    /// Free-text personality and values.
    #[serde(rename = "persona", default, deserialize_with = "lenient_text")]
    pub personality: String,
    /// Free-text professional stance.
    #[serde(default, deserialize_with = "lenient_text")]
    pub professional_persona: String,
    /// Free-text hobbies and interests.
    #[serde(default, deserialize_with = "lenient_text")]
    pub hobbies_and_interests: String,
    /// Free-text cultural background.
    #[serde(default, deserialize_with = "lenient_text")]
    pub cultural_background: String,
    /// Remaining dataset fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Text field that tolerates whatever the dataset put there: strings pass
/// through, numbers and booleans are rendered, anything else is empty.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

/// Age given as a number or a numeric string; anything else is unknown.
fn lenient_age<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl PersonaProfile {
    /// Age rendered for prompts and tables; empty when unknown.
    pub fn age_text(&self) -> String {
        self.age.map(|a| a.to_string()).unwrap_or_default()
    }
}

impl fmt::Display for PersonaProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.id, self.age_text(), self.occupation)
    }
}

/// Load every persona from a JSON file.
///
/// # Errors
///
/// Returns [`PersonaStoreError::NotFound`] when the file is absent, and
/// `Io`/`Parse` when it cannot be read or decoded.
pub fn load_personas(path: &Path) -> Result<Vec<PersonaProfile>, PersonaStoreError> {
    if !path.exists() {
        return Err(PersonaStoreError::NotFound {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), "loading personas");
    let contents = std::fs::read_to_string(path).map_err(|source| PersonaStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let personas: Vec<PersonaProfile> =
        serde_json::from_str(&contents).map_err(|source| PersonaStoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(count = personas.len(), "personas loaded");
    Ok(personas)
}

/// Write personas as a pretty-printed JSON array, creating parent directories.
///
/// # Errors
///
/// Returns `Io` when the directory or file cannot be written.
pub fn save_personas(path: &Path, personas: &[PersonaProfile]) -> Result<(), PersonaStoreError> {
    let io_err = |source: std::io::Error| PersonaStoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(personas).map_err(|source| PersonaStoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(io_err)?;

    info!(path = %path.display(), count = personas.len(), "personas saved");
    Ok(())
}

/// Draw `size` personas uniformly at random without replacement.
///
/// # Errors
///
/// Returns [`PersonaStoreError::SampleTooLarge`] when `size` exceeds the
/// number of personas available.
pub fn sample_personas<R: Rng + ?Sized>(
    personas: &[PersonaProfile],
    size: usize,
    rng: &mut R,
) -> Result<Vec<PersonaProfile>, PersonaStoreError> {
    if size > personas.len() {
        return Err(PersonaStoreError::SampleTooLarge {
            requested: size,
            available: personas.len(),
        });
    }

    Ok(personas.choose_multiple(rng, size).cloned().collect())
}
