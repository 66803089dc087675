use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RelayEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelayEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RelayEvents::ContentTypeAppLabel)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RelayEvents::ContentTypeModel)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RelayEvents::ObjectId).big_integer().not_null())
                    .col(ColumnDef::new(RelayEvents::AcquisitionTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(RelayEvents::RelayStartTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(RelayEvents::RelaySuccessTime).timestamp_with_time_zone())
                    .col(ColumnDef::new(RelayEvents::SerializedForm).text().not_null())
                    .col(ColumnDef::new(RelayEvents::Url).string_len(128).not_null())
                    .col(
                        ColumnDef::new(RelayEvents::IsUpdate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RelayEvents::Hostname).string_len(32).not_null())
                    .to_owned(),
            )
            .await?;

        // Lookup of the pending event for a (content type, object, host) triple.
        manager
            .create_index(
                Index::create()
                    .table(RelayEvents::Table)
                    .col(RelayEvents::ContentTypeAppLabel)
                    .col(RelayEvents::ContentTypeModel)
                    .col(RelayEvents::ObjectId)
                    .col(RelayEvents::Hostname)
                    .name("idx_relay_events_target")
                    .to_owned(),
            )
            .await?;

        // Operators watch `relay_success_time IS NULL` for stuck deliveries.
        manager
            .create_index(
                Index::create()
                    .table(RelayEvents::Table)
                    .col(RelayEvents::RelaySuccessTime)
                    .name("idx_relay_events_relay_success_time")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RelayEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RelayEvents {
    Table,
    Id,
    ContentTypeAppLabel,
    ContentTypeModel,
    ObjectId,
    AcquisitionTime,
    RelayStartTime,
    RelaySuccessTime,
    SerializedForm,
    Url,
    IsUpdate,
    Hostname,
}
