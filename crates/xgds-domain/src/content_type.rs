//! Type discriminator for relayed records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// `app_label` + `model` pair naming the kind of a relayed record,
/// e.g. `xgds_core.conditionhistory`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentType {
    pub app_label: String,
    pub model: String,
}

impl ContentType {
    /// Model names are matched case-insensitively, so they are stored lowercased.
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into().to_lowercase(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("content type must look like `app_label.model`, got {0:?}")]
pub struct ParseContentTypeError(pub String);

impl FromStr for ContentType {
    type Err = ParseContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('.') {
            Some((app, model)) if !app.is_empty() && !model.is_empty() && !model.contains('.') => {
                Ok(Self::new(app, model))
            }
            _ => Err(ParseContentTypeError(s.to_owned())),
        }
    }
}
