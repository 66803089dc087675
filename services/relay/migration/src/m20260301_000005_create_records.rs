use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Records::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Records::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Records::ContentTypeAppLabel)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Records::ContentTypeModel)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Records::ObjectId).big_integer().not_null())
                    .col(ColumnDef::new(Records::Url).string_len(128).not_null())
                    .col(ColumnDef::new(Records::Fields).json_binary().not_null())
                    .col(
                        ColumnDef::new(Records::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Records::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per relayed object; upserts conflict on this key.
        manager
            .create_index(
                Index::create()
                    .table(Records::Table)
                    .col(Records::ContentTypeAppLabel)
                    .col(Records::ContentTypeModel)
                    .col(Records::ObjectId)
                    .unique()
                    .name("uq_records_content_type_object_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Records::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Records {
    Table,
    Id,
    ContentTypeAppLabel,
    ContentTypeModel,
    ObjectId,
    Url,
    Fields,
    CreatedAt,
    UpdatedAt,
}
