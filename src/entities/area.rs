use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic delivery unit. Immutable reference data; the capacity columns
/// are the ceilings for any single allocation targeting this area.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "areas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub address_code: String,
    pub town: String,
    pub city: String,
    pub prefecture: String,
    /// Units deliverable by direct door drop. Null means no survey data; treated as 0.
    pub door_to_door_capacity: Option<i32>,
    /// Units deliverable to apartment complexes only.
    pub multi_family_capacity: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_distribution_area::Entity")]
    OrderDistributionAreas,
}

impl Related<super::order_distribution_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDistributionAreas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
