use anyhow::{Context as _, anyhow};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter,
};
use serde_json::{Value, json};

use xgds_domain::content_type::ContentType;
use xgds_domain::id::ObjectId;
use xgds_relay_schema::records;

use crate::domain::repository::{RecordHandler, RelayFileStore};
use crate::domain::types::RelayPayload;
use crate::error::RelayServiceError;

/// Stores relayed records of one content type as JSON field maps.
///
/// Attachments are written under `<app_label>/<model>/` and their paths
/// stored in the field named by the multipart key, as a file field would.
pub struct DbRecordHandler<F>
where
    F: RelayFileStore,
{
    pub db: DatabaseConnection,
    pub files: F,
    pub content_type: ContentType,
}

impl<F> DbRecordHandler<F>
where
    F: RelayFileStore,
{
    async fn find_model(&self, object_id: ObjectId) -> Result<Option<records::Model>, RelayServiceError> {
        let model = records::Entity::find()
            .filter(records::Column::ContentTypeAppLabel.eq(self.content_type.app_label.as_str()))
            .filter(records::Column::ContentTypeModel.eq(self.content_type.model.as_str()))
            .filter(records::Column::ObjectId.eq(object_id.0))
            .one(&self.db)
            .await
            .context("find relayed record")?;
        Ok(model)
    }
}

fn record_json(model: &records::Model) -> Value {
    json!({
        "pk": model.object_id,
        "content_type": format!("{}.{}", model.content_type_app_label, model.content_type_model),
        "url": model.url,
        "fields": model.fields,
        "updated_at": xgds_core::serde::to_iso8601(&model.updated_at),
    })
}

#[async_trait::async_trait]
impl<F> RecordHandler for DbRecordHandler<F>
where
    F: RelayFileStore + 'static,
{
    async fn find_existing(&self, object_id: ObjectId) -> Result<Option<Value>, RelayServiceError> {
        Ok(self.find_model(object_id).await?.as_ref().map(record_json))
    }

    async fn apply(&self, payload: RelayPayload) -> Result<Value, RelayServiceError> {
        let mut fields = payload.fields;
        let dir = format!("{}/{}", self.content_type.app_label, self.content_type.model);
        for upload in payload.files {
            let path = self.files.save(&dir, &upload.file_name, upload.bytes).await?;
            fields.insert(upload.file_key, Value::String(path));
        }

        let now = Utc::now();
        records::Entity::insert(records::ActiveModel {
            id: NotSet,
            content_type_app_label: Set(self.content_type.app_label.clone()),
            content_type_model: Set(self.content_type.model.clone()),
            object_id: Set(payload.object_id.0),
            url: Set(payload.url),
            fields: Set(Value::Object(fields)),
            created_at: Set(now),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([
                records::Column::ContentTypeAppLabel,
                records::Column::ContentTypeModel,
                records::Column::ObjectId,
            ])
            .update_columns([
                records::Column::Url,
                records::Column::Fields,
                records::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(&self.db)
        .await
        .context("upsert relayed record")?;

        let model = self
            .find_model(payload.object_id)
            .await?
            .ok_or_else(|| anyhow!("relayed record {} vanished after upsert", payload.object_id))?;
        Ok(record_json(&model))
    }
}
