use sea_orm::entity::prelude::*;

/// Binary attachment sent alongside a relay event.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "relay_files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Path relative to the media root, e.g. `relay/3f2c..._image.jpg`.
    pub file_to_send: String,
    /// Multipart field name used on delivery.
    pub file_key: String,
    pub relay_event_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::relay_events::Entity",
        from = "Column::RelayEventId",
        to = "super::relay_events::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    RelayEvent,
}

impl Related<super::relay_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelayEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
