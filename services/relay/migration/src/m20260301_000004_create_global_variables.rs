use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Sites running MySQL replace this table with a view over
/// `information_schema.global_variables`; elsewhere operators fill in
/// `AUTO_INCREMENT_OFFSET` / `AUTO_INCREMENT_INCREMENT` by hand.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GlobalVariables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GlobalVariables::VariableName)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GlobalVariables::VariableValue).big_integer())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GlobalVariables::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum GlobalVariables {
    Table,
    VariableName,
    VariableValue,
}
