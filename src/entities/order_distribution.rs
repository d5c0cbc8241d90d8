use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer's request to distribute one flyer to a set of areas:
/// "order O wants flyer F distributed via method M, totaling planned_count
/// units, within [start_date, end_date]". The area breakdown lives in
/// `order_distribution_area`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_distributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub flyer_id: Uuid,
    pub method: String,
    /// Authoritative total for this distribution; assignments summing past it
    /// are reported as over-allocation, never rejected.
    pub planned_count: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spare_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Physical delivery method; selects which area capacity column applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionMethod {
    DoorToDoor,
    MultiFamily,
}

impl DistributionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionMethod::DoorToDoor => "door_to_door",
            DistributionMethod::MultiFamily => "multi_family",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "door_to_door" => Some(DistributionMethod::DoorToDoor),
            "multi_family" => Some(DistributionMethod::MultiFamily),
            _ => None,
        }
    }

    /// The capacity ceiling this method reads from an area, null columns
    /// defaulting to 0.
    pub fn capacity_of(&self, area: &super::area::Model) -> i32 {
        match self {
            DistributionMethod::DoorToDoor => area.door_to_door_capacity.unwrap_or(0),
            DistributionMethod::MultiFamily => area.multi_family_capacity.unwrap_or(0),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::flyer::Entity",
        from = "Column::FlyerId",
        to = "super::flyer::Column::Id"
    )]
    Flyer,
    #[sea_orm(has_many = "super::order_distribution_area::Entity")]
    OrderDistributionAreas,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::flyer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flyer.def()
    }
}

impl Related<super::order_distribution_area::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderDistributionAreas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
