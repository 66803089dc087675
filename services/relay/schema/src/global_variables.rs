use sea_orm::entity::prelude::*;

/// Database server variables (`AUTO_INCREMENT_OFFSET`, `AUTO_INCREMENT_INCREMENT`,
/// `SERVER_ID`) describing which residue class of primary keys this site mints.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "global_variables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub variable_name: String,
    pub variable_value: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
