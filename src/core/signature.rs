use crate::core::exif::{MAKE_KEY, MODEL_KEY, Metadata, SOFTWARE_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;

const UNKNOWN: &str = "Unknown";
const NO_SOFTWARE: &str = "None";

/// Normalized key identifying a capture device and the software that wrote the file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Derive a signature from one metadata record.
    ///
    /// Absent fields fall back to sentinels, so every record (even an empty one)
    /// produces a usable signature.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let make = field_or(metadata, MAKE_KEY, UNKNOWN);
        let model = field_or(metadata, MODEL_KEY, UNKNOWN);
        let software = field_or(metadata, SOFTWARE_KEY, NO_SOFTWARE);

        Self::from_parts(make, model, software)
    }

    pub fn from_parts(make: &str, model: &str, software: &str) -> Self {
        Self(format!(
            "Make: {} | Model: {} | Software: {}",
            make.trim(),
            model.trim(),
            software.trim()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn field_or<'a>(metadata: &'a Metadata, key: &str, fallback: &'a str) -> &'a str {
    metadata.get(key).map(String::as_str).unwrap_or(fallback)
}

impl From<String> for Signature {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Signature {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Signature {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
