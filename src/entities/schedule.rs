use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dated delivery container. Slots are zero-based indices up to
/// `slot_count`; each slot is a bucket that can hold any number of
/// distribution items.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub delivery_date: NaiveDate,
    pub branch_id: Option<Uuid>,
    pub operator: Option<String>,
    pub status: String,
    pub remarks: Option<String>,
    pub slot_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Planned,
    Fixed,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Planned => "planned",
            ScheduleStatus::Fixed => "fixed",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(ScheduleStatus::Planned),
            "fixed" => Some(ScheduleStatus::Fixed),
            "completed" => Some(ScheduleStatus::Completed),
            "cancelled" => Some(ScheduleStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::distribution_item::Entity")]
    DistributionItems,
}

impl Related<super::distribution_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DistributionItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
