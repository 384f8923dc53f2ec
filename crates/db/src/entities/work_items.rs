//! `SeaORM` Entity for work_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "work_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub budget_source_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))", nullable)]
    pub allocated_budget: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget_sources::Entity",
        from = "Column::BudgetSourceId",
        to = "super::budget_sources::Column::Id"
    )]
    BudgetSources,
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
}

impl Related<super::budget_sources::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetSources.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
