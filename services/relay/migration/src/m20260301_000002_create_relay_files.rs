use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RelayFiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RelayFiles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RelayFiles::FileToSend).string_len(256).not_null())
                    .col(ColumnDef::new(RelayFiles::FileKey).string_len(64).not_null())
                    .col(ColumnDef::new(RelayFiles::RelayEventId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(RelayFiles::Table, RelayFiles::RelayEventId)
                            .to(RelayEvents::Table, RelayEvents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(RelayFiles::Table)
                    .col(RelayFiles::RelayEventId)
                    .name("idx_relay_files_relay_event_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RelayFiles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RelayFiles {
    Table,
    Id,
    FileToSend,
    FileKey,
    RelayEventId,
}

#[derive(Iden)]
enum RelayEvents {
    Table,
    Id,
}
