use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use xgds_domain::content_type::ContentType;
use xgds_domain::id::{ObjectId, RelayEventId};
use xgds_relay_schema::{constants, global_variables, relay_events, relay_files};

use crate::domain::repository::{
    AutoIncrement, ConstantRepository, RelayEventRepository, ShardInfo,
};
use crate::domain::types::{NewRelayEvent, RelayEvent, RelayFile};
use crate::error::RelayServiceError;

// ── RelayEvent repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRelayEventRepository {
    pub db: DatabaseConnection,
}

impl RelayEventRepository for DbRelayEventRepository {
    async fn find_by_id(&self, id: RelayEventId) -> Result<Option<RelayEvent>, RelayServiceError> {
        let model = relay_events::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find relay event by id")?;
        Ok(model.map(relay_event_from_model))
    }

    async fn find_pending(
        &self,
        content_type: &ContentType,
        object_id: ObjectId,
        hostname: &str,
    ) -> Result<Option<RelayEvent>, RelayServiceError> {
        let model = relay_events::Entity::find()
            .filter(relay_events::Column::ContentTypeAppLabel.eq(content_type.app_label.as_str()))
            .filter(relay_events::Column::ContentTypeModel.eq(content_type.model.as_str()))
            .filter(relay_events::Column::ObjectId.eq(object_id.0))
            .filter(relay_events::Column::Hostname.eq(hostname))
            .filter(relay_events::Column::IsUpdate.eq(false))
            .filter(relay_events::Column::RelaySuccessTime.is_null())
            .order_by_asc(relay_events::Column::Id)
            .one(&self.db)
            .await
            .context("find pending relay event")?;
        Ok(model.map(relay_event_from_model))
    }

    async fn create(&self, event: &NewRelayEvent) -> Result<RelayEvent, RelayServiceError> {
        let model = relay_events::ActiveModel {
            id: NotSet,
            content_type_app_label: Set(event.content_type.app_label.clone()),
            content_type_model: Set(event.content_type.model.clone()),
            object_id: Set(event.object_id.0),
            acquisition_time: Set(event.acquisition_time),
            relay_start_time: Set(None),
            relay_success_time: Set(None),
            serialized_form: Set(event.serialized_form.clone()),
            url: Set(event.url.clone()),
            is_update: Set(event.is_update),
            hostname: Set(event.hostname.clone()),
        }
        .insert(&self.db)
        .await
        .context("create relay event")?;
        Ok(relay_event_from_model(model))
    }

    async fn add_file(
        &self,
        event_id: RelayEventId,
        file_key: &str,
        path: &str,
    ) -> Result<RelayFile, RelayServiceError> {
        let model = relay_files::ActiveModel {
            id: NotSet,
            file_to_send: Set(path.to_owned()),
            file_key: Set(file_key.to_owned()),
            relay_event_id: Set(event_id.0),
        }
        .insert(&self.db)
        .await
        .context("add relay file")?;
        Ok(relay_file_from_model(model))
    }

    async fn list_files(&self, event_id: RelayEventId) -> Result<Vec<RelayFile>, RelayServiceError> {
        let models = relay_files::Entity::find()
            .filter(relay_files::Column::RelayEventId.eq(event_id.0))
            .order_by_asc(relay_files::Column::Id)
            .all(&self.db)
            .await
            .context("list relay files")?;
        Ok(models.into_iter().map(relay_file_from_model).collect())
    }

    async fn mark_started(
        &self,
        id: RelayEventId,
        at: DateTime<Utc>,
    ) -> Result<(), RelayServiceError> {
        relay_events::ActiveModel {
            id: Set(id.0),
            relay_start_time: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark relay event started")?;
        Ok(())
    }

    async fn mark_succeeded(
        &self,
        id: RelayEventId,
        at: DateTime<Utc>,
    ) -> Result<(), RelayServiceError> {
        // Delivered events are immutable; the null filter keeps the first stamp.
        relay_events::Entity::update_many()
            .col_expr(relay_events::Column::RelaySuccessTime, Expr::value(at))
            .filter(relay_events::Column::Id.eq(id.0))
            .filter(relay_events::Column::RelaySuccessTime.is_null())
            .exec(&self.db)
            .await
            .context("mark relay event succeeded")?;
        Ok(())
    }

    async fn list_undelivered(&self, limit: u64) -> Result<Vec<RelayEvent>, RelayServiceError> {
        let models = relay_events::Entity::find()
            .filter(relay_events::Column::RelaySuccessTime.is_null())
            .order_by_asc(relay_events::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list undelivered relay events")?;
        Ok(models.into_iter().map(relay_event_from_model).collect())
    }
}

fn relay_event_from_model(model: relay_events::Model) -> RelayEvent {
    RelayEvent {
        id: RelayEventId(model.id),
        content_type: ContentType::new(model.content_type_app_label, model.content_type_model),
        object_id: ObjectId(model.object_id),
        acquisition_time: model.acquisition_time,
        relay_start_time: model.relay_start_time,
        relay_success_time: model.relay_success_time,
        serialized_form: model.serialized_form,
        url: model.url,
        is_update: model.is_update,
        hostname: model.hostname,
    }
}

fn relay_file_from_model(model: relay_files::Model) -> RelayFile {
    RelayFile {
        id: model.id,
        relay_event_id: RelayEventId(model.relay_event_id),
        file_key: model.file_key,
        path: model.file_to_send,
    }
}

// ── Constants ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbConstantRepository {
    pub db: DatabaseConnection,
}

impl ConstantRepository for DbConstantRepository {
    async fn find_value(&self, name: &str) -> Result<Option<String>, RelayServiceError> {
        let model = constants::Entity::find()
            .filter(constants::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("find constant")?;
        Ok(model.map(|m| m.value))
    }
}

// ── Shard introspection ───────────────────────────────────────────────────────

pub const AUTO_INCREMENT_OFFSET: &str = "AUTO_INCREMENT_OFFSET";
pub const AUTO_INCREMENT_INCREMENT: &str = "AUTO_INCREMENT_INCREMENT";

#[derive(Clone)]
pub struct DbShardInfo {
    pub db: DatabaseConnection,
}

impl DbShardInfo {
    async fn variable(&self, name: &str) -> Result<i64, RelayServiceError> {
        let model = global_variables::Entity::find_by_id(name.to_owned())
            .one(&self.db)
            .await
            .with_context(|| format!("read global variable {name}"))?;
        let value = model
            .and_then(|m| m.variable_value)
            .ok_or_else(|| anyhow!("global variable {name} is not set"))?;
        Ok(value)
    }
}

impl ShardInfo for DbShardInfo {
    async fn auto_increment(&self) -> Result<AutoIncrement, RelayServiceError> {
        Ok(AutoIncrement {
            offset: self.variable(AUTO_INCREMENT_OFFSET).await?,
            increment: self.variable(AUTO_INCREMENT_INCREMENT).await?,
        })
    }
}
