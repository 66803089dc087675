use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Constants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Constants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Constants::Name)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Constants::Units).string_len(32).not_null())
                    .col(ColumnDef::new(Constants::Notes).string_len(256))
                    .col(ColumnDef::new(Constants::DataType).string_len(32).not_null())
                    .col(ColumnDef::new(Constants::Value).string_len(256).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Constants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Constants {
    Table,
    Id,
    Name,
    Units,
    Notes,
    DataType,
    Value,
}
