use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "flyers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub code: String,
    /// Print size label, e.g. "A4" or "B5".
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_distribution::Entity")]
    OrderDistributions,
}

impl Related<super::order_distribution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDistributions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
