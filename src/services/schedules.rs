//! Schedule lifecycle: dated delivery containers with a fixed slot layout.
//!
//! Deleting a schedule removes its distribution items in the same transaction
//! so no orphaned placements survive.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::distribution_item::{self, Entity as DistributionItemEntity};
use crate::entities::schedule::{self, Entity as ScheduleEntity, ScheduleStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateScheduleRequest {
    pub delivery_date: NaiveDate,
    pub branch_id: Option<Uuid>,
    pub operator: Option<String>,
    pub status: Option<String>,
    pub remarks: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Slot count must be between 1 and 100"))]
    pub slot_count: Option<i32>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateScheduleRequest {
    pub delivery_date: Option<NaiveDate>,
    pub branch_id: Option<Uuid>,
    pub operator: Option<String>,
    pub status: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleResponse {
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

impl From<schedule::Model> for ScheduleResponse {
    fn from(model: schedule::Model) -> Self {
        Self {
            id: model.id,
            delivery_date: model.delivery_date,
            branch_id: model.branch_id,
            operator: model.operator,
            status: model.status,
            remarks: model.remarks,
            slot_count: model.slot_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    pub schedules: Vec<ScheduleResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing delivery schedules.
#[derive(Clone)]
pub struct ScheduleService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    default_slot_count: i32,
}

impl ScheduleService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        default_slot_count: i32,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_slot_count,
        }
    }

    fn validate_status(status: &str) -> Result<(), ServiceError> {
        ScheduleStatus::from_str(status)
            .map(|_| ())
            .ok_or_else(|| {
                ServiceError::InvalidStatus(format!("Unknown schedule status: {}", status))
            })
    }

    /// Creates a new schedule ahead of a delivery window.
    #[instrument(skip(self, request), fields(delivery_date = %request.delivery_date))]
    pub async fn create_schedule(
        &self,
        request: CreateScheduleRequest,
    ) -> Result<ScheduleResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let status = match request.status.as_deref() {
            Some(status) => {
                Self::validate_status(status)?;
                status.to_string()
            }
            None => ScheduleStatus::Planned.as_str().to_string(),
        };

        let db = &*self.db_pool;
        let now = Utc::now();
        let schedule_id = Uuid::new_v4();

        let schedule = schedule::ActiveModel {
            id: Set(schedule_id),
            delivery_date: Set(request.delivery_date),
            branch_id: Set(request.branch_id),
            operator: Set(request.operator),
            status: Set(status),
            remarks: Set(request.remarks),
            slot_count: Set(request.slot_count.unwrap_or(self.default_slot_count)),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, schedule_id = %schedule_id, "Failed to create schedule");
            ServiceError::DatabaseError(e)
        })?;

        info!(schedule_id = %schedule.id, "Schedule created");

        if let Some(event_sender) = &self.event_sender {
            let event = Event::ScheduleCreated {
                schedule_id: schedule.id,
                timestamp: now,
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, schedule_id = %schedule.id, "Failed to send schedule created event");
            }
        }

        Ok(ScheduleResponse::from(schedule))
    }

    /// Gets a schedule by ID.
    #[instrument(skip(self))]
    pub async fn get_schedule(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleResponse>, ServiceError> {
        let db = &*self.db_pool;

        let schedule = ScheduleEntity::find_by_id(schedule_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(schedule.map(ScheduleResponse::from))
    }

    /// Lists schedules with pagination and optional date/branch filters.
    #[instrument(skip(self))]
    pub async fn list_schedules(
        &self,
        page: u64,
        per_page: u64,
        delivery_date: Option<NaiveDate>,
        branch_id: Option<Uuid>,
    ) -> Result<ScheduleListResponse, ServiceError> {
        if page == 0 {
            return Err(ServiceError::ValidationError(
                "Page number must be greater than 0".to_string(),
            ));
        }
        if per_page == 0 || per_page > 1000 {
            return Err(ServiceError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let mut query = ScheduleEntity::find();
        if let Some(date) = delivery_date {
            query = query.filter(schedule::Column::DeliveryDate.eq(date));
        }
        if let Some(branch_id) = branch_id {
            query = query.filter(schedule::Column::BranchId.eq(branch_id));
        }

        let paginator = query
            .order_by_asc(schedule::Column::DeliveryDate)
            .order_by_asc(schedule::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let schedules = paginator
            .fetch_page(page - 1)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(ScheduleListResponse {
            schedules: schedules.into_iter().map(ScheduleResponse::from).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Applies a partial update to a schedule.
    #[instrument(skip(self, request), fields(schedule_id = %schedule_id))]
    pub async fn update_schedule(
        &self,
        schedule_id: Uuid,
        request: UpdateScheduleRequest,
    ) -> Result<ScheduleResponse, ServiceError> {
        if let Some(status) = request.status.as_deref() {
            Self::validate_status(status)?;
        }

        let db = &*self.db_pool;

        let schedule = ScheduleEntity::find_by_id(schedule_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Schedule {} not found", schedule_id))
            })?;

        let mut active: schedule::ActiveModel = schedule.into();
        if let Some(delivery_date) = request.delivery_date {
            active.delivery_date = Set(delivery_date);
        }
        if let Some(branch_id) = request.branch_id {
            active.branch_id = Set(Some(branch_id));
        }
        if let Some(operator) = request.operator {
            active.operator = Set(Some(operator));
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        if let Some(remarks) = request.remarks {
            active.remarks = Set(Some(remarks));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(schedule_id = %schedule_id, "Schedule updated");

        Ok(ScheduleResponse::from(updated))
    }

    /// Deletes a schedule and every distribution item assigned to it in one
    /// transaction. Deleting a non-empty schedule is allowed.
    #[instrument(skip(self))]
    pub async fn delete_schedule(&self, schedule_id: Uuid) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;

        ScheduleEntity::find_by_id(schedule_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Schedule {} not found", schedule_id))
            })?;

        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let removed_items = DistributionItemEntity::delete_many()
            .filter(distribution_item::Column::ScheduleId.eq(schedule_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .rows_affected;

        ScheduleEntity::delete_by_id(schedule_id)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, schedule_id = %schedule_id, "Failed to commit schedule deletion");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            schedule_id = %schedule_id,
            removed_items = removed_items,
            "Schedule deleted with its items"
        );

        if let Some(event_sender) = &self.event_sender {
            let event = Event::ScheduleDeleted {
                schedule_id,
                removed_items,
                timestamp: Utc::now(),
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, schedule_id = %schedule_id, "Failed to send schedule deleted event");
            }
        }

        Ok(removed_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_status_conversion() {
        assert_eq!(ScheduleStatus::Planned.as_str(), "planned");
        assert_eq!(ScheduleStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(
            ScheduleStatus::from_str("fixed"),
            Some(ScheduleStatus::Fixed)
        );
        assert_eq!(ScheduleStatus::from_str("bogus"), None);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(ScheduleService::validate_status("planned").is_ok());
        assert!(matches!(
            ScheduleService::validate_status("archived"),
            Err(ServiceError::InvalidStatus(_))
        ));
    }
}
