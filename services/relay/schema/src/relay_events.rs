use sea_orm::entity::prelude::*;

/// A pending or completed cross-site delivery of one record.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "relay_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub content_type_app_label: String,
    pub content_type_model: String,
    pub object_id: i64,
    pub acquisition_time: Option<chrono::DateTime<chrono::Utc>>,
    pub relay_start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub relay_success_time: Option<chrono::DateTime<chrono::Utc>>,
    #[sea_orm(column_type = "Text")]
    pub serialized_form: String,
    pub url: String,
    pub is_update: bool,
    pub hostname: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::relay_files::Entity")]
    RelayFiles,
}

impl Related<super::relay_files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelayFiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
