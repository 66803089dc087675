use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use xgds_domain::content_type::ContentType;

use crate::domain::repository::RecordHandler;
use crate::domain::types::{RelayPayload, RelayUpload};
use crate::error::RelayServiceError;

/// Maps a content type to the handler that stores records of that type.
///
/// Filled once at startup; lookups never fall back to another handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<ContentType, Arc<dyn RecordHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, content_type: ContentType, handler: Arc<dyn RecordHandler>) {
        tracing::info!(content_type = %content_type, "registered relay handler");
        self.handlers.insert(content_type, handler);
    }

    pub fn get(&self, content_type: &ContentType) -> Option<Arc<dyn RecordHandler>> {
        self.handlers.get(content_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Parse the text fields of a relay delivery.
pub fn parse_relay_form(
    mut fields: HashMap<String, String>,
    files: Vec<RelayUpload>,
) -> Result<RelayPayload, RelayServiceError> {
    let mut required = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| RelayServiceError::InvalidRelayForm(format!("missing {name}")))
    };
    let object_id = required("object_id")?
        .parse()
        .map_err(|_| RelayServiceError::InvalidRelayForm("object_id must be an integer".to_owned()))?;
    let app_label = required("content_type_app_label")?;
    let model = required("content_type_model")?;
    let serialized_form = required("serialized_form")?;

    let is_update = match fields.remove("is_update").as_deref().map(str::trim) {
        None | Some("") | Some("False") | Some("false") | Some("0") => false,
        Some("True") | Some("true") | Some("1") => true,
        Some(other) => {
            return Err(RelayServiceError::InvalidRelayForm(format!(
                "is_update must be a boolean, got {other:?}"
            )));
        }
    };

    let Value::Object(form) = serde_json::from_str(&serialized_form).map_err(|e| {
        RelayServiceError::InvalidRelayForm(format!("serialized_form is not JSON: {e}"))
    })?
    else {
        return Err(RelayServiceError::InvalidRelayForm(
            "serialized_form must be a JSON object".to_owned(),
        ));
    };

    Ok(RelayPayload {
        content_type: ContentType::new(app_label, model),
        object_id,
        is_update,
        url: fields.remove("url").unwrap_or_default(),
        fields: form,
        files,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveOutcome {
    /// A non-update delivery for a record that already exists here.
    Exists(Value),
    Applied(Value),
}

pub struct ReceiveRelayUseCase<'a> {
    pub handlers: &'a HandlerRegistry,
}

impl ReceiveRelayUseCase<'_> {
    pub async fn execute(&self, payload: RelayPayload) -> Result<ReceiveOutcome, RelayServiceError> {
        let handler = self
            .handlers
            .get(&payload.content_type)
            .ok_or_else(|| RelayServiceError::UnknownContentType(payload.content_type.to_string()))?;

        if !payload.is_update {
            if let Some(existing) = handler.find_existing(payload.object_id).await? {
                tracing::info!(
                    content_type = %payload.content_type,
                    object_id = %payload.object_id,
                    "duplicate relay delivery"
                );
                return Ok(ReceiveOutcome::Exists(existing));
            }
        }
        let content_type = payload.content_type.clone();
        let object_id = payload.object_id;
        let applied = handler.apply(payload).await?;
        tracing::info!(content_type = %content_type, object_id = %object_id, "relay applied");
        Ok(ReceiveOutcome::Applied(applied))
    }
}
