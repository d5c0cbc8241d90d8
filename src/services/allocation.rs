//! Allocation Engine
//!
//! Places order-distribution/area pairs into schedule slots, resolves area
//! capacity ceilings, computes aggregate allocation statistics, and detects
//! unassigned demand. All consumption figures are derived on demand from the
//! current `distribution_items` rows; nothing is incrementally maintained.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::area::{self, Entity as AreaEntity};
use crate::entities::customer::Entity as CustomerEntity;
use crate::entities::distribution_item::{self, Entity as DistributionItemEntity};
use crate::entities::flyer::Entity as FlyerEntity;
use crate::entities::order::{self, Entity as OrderEntity, OrderStatus};
use crate::entities::order_distribution::{
    self, DistributionMethod, Entity as OrderDistributionEntity,
};
use crate::entities::order_distribution_area::{self, Entity as OrderDistributionAreaEntity};
use crate::entities::schedule::{self, Entity as ScheduleEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Request to place an order-distribution/area pair into a schedule slot.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentRequest {
    pub order_distribution_area_id: Uuid,
    pub schedule_id: Uuid,
    #[validate(range(min = 0, message = "Slot index must be non-negative"))]
    pub slot_index: i32,
}

/// Partial update for an existing assignment: relocate to another
/// schedule/slot and/or resize its planned count. Absent fields are left
/// unchanged.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAssignmentRequest {
    pub schedule_id: Option<Uuid>,
    pub slot_index: Option<i32>,
    pub planned_count: Option<i32>,
}

/// Assignment summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub slot_index: i32,
    pub order_id: Uuid,
    pub flyer_id: Uuid,
    pub customer_id: Uuid,
    pub area_id: Uuid,
    pub flyer_name: String,
    pub flyer_code: String,
    pub method: String,
    pub planned_count: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spare_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<distribution_item::Model> for AssignmentResponse {
    fn from(model: distribution_item::Model) -> Self {
        Self {
            id: model.id,
            schedule_id: model.schedule_id,
            slot_index: model.slot_index,
            order_id: model.order_id,
            flyer_id: model.flyer_id,
            customer_id: model.customer_id,
            area_id: model.area_id,
            flyer_name: model.flyer_name,
            flyer_code: model.flyer_code,
            method: model.method,
            planned_count: model.planned_count,
            start_date: model.start_date,
            end_date: model.end_date,
            spare_date: model.spare_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Per-distribution allocation totals, keyed by `orderId_flyerId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AllocationStats {
    pub total_planned: i64,
    pub total_assigned: i64,
    pub remaining: i64,
    pub is_over: bool,
}

impl AllocationStats {
    pub fn from_totals(total_planned: i64, total_assigned: i64) -> Self {
        let remaining = total_planned - total_assigned;
        Self {
            total_planned,
            total_assigned,
            remaining,
            is_over: remaining < 0,
        }
    }
}

/// Map key for the stats report.
pub fn stats_key(order_id: Uuid, flyer_id: Uuid) -> String {
    format!("{}_{}", order_id, flyer_id)
}

/// One row of the unassigned-work report: an active (distribution, area) pair
/// with no placement, enriched with display context.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnassignedWork {
    pub order_distribution_id: Uuid,
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub flyer_id: Uuid,
    pub flyer_name: String,
    pub flyer_code: String,
    pub flyer_size: Option<String>,
    pub method: String,
    pub planned_count: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub spare_date: Option<NaiveDate>,
    pub area_id: Uuid,
    pub area_town: String,
    pub area_city: String,
    pub area_prefecture: String,
    pub area_address_code: String,
    /// The method-applicable ceiling for this pairing, for display.
    pub area_capacity: i32,
}

/// Service implementing the allocation engine operations.
#[derive(Clone)]
pub struct AllocationService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    enforce_capacity: bool,
}

impl AllocationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        enforce_capacity: bool,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            enforce_capacity,
        }
    }

    /// Places the referenced order-distribution/area pair into a schedule
    /// slot. The new item's planned count is initialized to the full area
    /// ceiling under the distribution's method (null capacity counts as 0);
    /// the operator adjusts downward afterwards. No counters are mutated —
    /// consumption is always derived by [`Self::get_stats`].
    #[instrument(skip(self, request), fields(oda_id = %request.order_distribution_area_id, schedule_id = %request.schedule_id))]
    pub async fn create_assignment(
        &self,
        request: CreateAssignmentRequest,
    ) -> Result<AssignmentResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let oda = OrderDistributionAreaEntity::find_by_id(request.order_distribution_area_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Order distribution area {} not found",
                    request.order_distribution_area_id
                ))
            })?;

        let distribution = OrderDistributionEntity::find_by_id(oda.order_distribution_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Order distribution {} not found",
                    oda.order_distribution_id
                ))
            })?;

        let order = OrderEntity::find_by_id(distribution.order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", distribution.order_id))
            })?;

        let flyer = FlyerEntity::find_by_id(distribution.flyer_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Flyer {} not found", distribution.flyer_id))
            })?;

        let area = AreaEntity::find_by_id(oda.area_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Area {} not found", oda.area_id)))?;

        let schedule = ScheduleEntity::find_by_id(request.schedule_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Schedule {} not found", request.schedule_id))
            })?;

        if request.slot_index >= schedule.slot_count {
            return Err(ServiceError::ValidationError(format!(
                "Slot index {} out of range for schedule with {} slots",
                request.slot_index, schedule.slot_count
            )));
        }

        let method = DistributionMethod::from_str(&distribution.method).ok_or_else(|| {
            ServiceError::InvalidStatus(format!(
                "Unknown distribution method: {}",
                distribution.method
            ))
        })?;
        let ceiling = method.capacity_of(&area);

        let now = Utc::now();
        let item_id = Uuid::new_v4();

        let item = distribution_item::ActiveModel {
            id: Set(item_id),
            schedule_id: Set(schedule.id),
            slot_index: Set(request.slot_index),
            order_id: Set(distribution.order_id),
            flyer_id: Set(distribution.flyer_id),
            customer_id: Set(order.customer_id),
            area_id: Set(oda.area_id),
            flyer_name: Set(flyer.name.clone()),
            flyer_code: Set(flyer.code.clone()),
            method: Set(distribution.method.clone()),
            planned_count: Set(ceiling),
            start_date: Set(distribution.start_date),
            end_date: Set(distribution.end_date),
            spare_date: Set(distribution.spare_date),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to insert distribution item");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            item_id = %item.id,
            schedule_id = %item.schedule_id,
            slot_index = item.slot_index,
            planned_count = item.planned_count,
            "Assignment created at full area ceiling"
        );

        if let Some(event_sender) = &self.event_sender {
            let event = Event::AssignmentCreated {
                item_id: item.id,
                schedule_id: item.schedule_id,
                slot_index: item.slot_index,
                order_id: item.order_id,
                flyer_id: item.flyer_id,
                area_id: item.area_id,
                planned_count: item.planned_count,
                timestamp: now,
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, item_id = %item.id, "Failed to send assignment created event");
            }
        }

        Ok(AssignmentResponse::from(item))
    }

    /// Relocates and/or resizes an assignment. Only supplied fields are
    /// applied. A planned count above the area ceiling is allowed (operator
    /// override); the capacity hook logs a warning, or rejects when
    /// `enforce_capacity` is configured.
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn update_assignment(
        &self,
        item_id: Uuid,
        request: UpdateAssignmentRequest,
    ) -> Result<AssignmentResponse, ServiceError> {
        let db = &*self.db_pool;

        let item = DistributionItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Distribution item {} not found", item_id))
            })?;

        if let Some(count) = request.planned_count {
            if count < 0 {
                return Err(ServiceError::ValidationError(
                    "Planned count must be non-negative".to_string(),
                ));
            }
            self.check_capacity(&item, count).await?;
        }

        // Slot bounds are checked against the target schedule, which may be
        // the current one when only the slot changes.
        let target_schedule_id = request.schedule_id.unwrap_or(item.schedule_id);
        if request.schedule_id.is_some() || request.slot_index.is_some() {
            let schedule = ScheduleEntity::find_by_id(target_schedule_id)
                .one(db)
                .await
                .map_err(ServiceError::db_error)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Schedule {} not found", target_schedule_id))
                })?;

            let target_slot = request.slot_index.unwrap_or(item.slot_index);
            if target_slot < 0 || target_slot >= schedule.slot_count {
                return Err(ServiceError::ValidationError(format!(
                    "Slot index {} out of range for schedule with {} slots",
                    target_slot, schedule.slot_count
                )));
            }
        }

        let now = Utc::now();
        let mut active: distribution_item::ActiveModel = item.into();
        if let Some(schedule_id) = request.schedule_id {
            active.schedule_id = Set(schedule_id);
        }
        if let Some(slot_index) = request.slot_index {
            active.slot_index = Set(slot_index);
        }
        if let Some(planned_count) = request.planned_count {
            active.planned_count = Set(planned_count);
        }
        active.updated_at = Set(Some(now));

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(
            item_id = %updated.id,
            schedule_id = %updated.schedule_id,
            slot_index = updated.slot_index,
            planned_count = updated.planned_count,
            "Assignment updated"
        );

        if let Some(event_sender) = &self.event_sender {
            let event = Event::AssignmentUpdated {
                item_id: updated.id,
                schedule_id: updated.schedule_id,
                slot_index: updated.slot_index,
                planned_count: updated.planned_count,
                timestamp: now,
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, item_id = %updated.id, "Failed to send assignment updated event");
            }
        }

        Ok(AssignmentResponse::from(updated))
    }

    /// Capacity hook: compares a requested count to the method-applicable
    /// ceiling of the item's area. Warn-only unless `enforce_capacity`.
    async fn check_capacity(
        &self,
        item: &distribution_item::Model,
        requested_count: i32,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let Some(area) = AreaEntity::find_by_id(item.area_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
        else {
            // Reference data disappeared from under the item; nothing to
            // compare against.
            warn!(area_id = %item.area_id, "Area missing during capacity check");
            return Ok(());
        };

        let Some(method) = DistributionMethod::from_str(&item.method) else {
            return Ok(());
        };
        let ceiling = method.capacity_of(&area);

        if requested_count > ceiling {
            if self.enforce_capacity {
                return Err(ServiceError::ValidationError(format!(
                    "Planned count {} exceeds area capacity {} for area {}",
                    requested_count, ceiling, item.area_id
                )));
            }
            warn!(
                item_id = %item.id,
                area_id = %item.area_id,
                requested_count = requested_count,
                ceiling = ceiling,
                "Planned count exceeds area capacity (operator override)"
            );
        }

        Ok(())
    }

    /// Removes an assignment.
    #[instrument(skip(self))]
    pub async fn delete_assignment(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = DistributionItemEntity::delete_by_id(item_id)
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Distribution item {} not found",
                item_id
            )));
        }

        info!(item_id = %item_id, "Assignment deleted");

        if let Some(event_sender) = &self.event_sender {
            let event = Event::AssignmentRemoved {
                item_id,
                timestamp: Utc::now(),
            };
            if let Err(e) = event_sender.send(event).await {
                warn!(error = %e, item_id = %item_id, "Failed to send assignment removed event");
            }
        }

        Ok(())
    }

    /// Gets an assignment by ID.
    #[instrument(skip(self))]
    pub async fn get_assignment(
        &self,
        item_id: Uuid,
    ) -> Result<Option<AssignmentResponse>, ServiceError> {
        let db = &*self.db_pool;

        let item = DistributionItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(item.map(AssignmentResponse::from))
    }

    /// Lists assignments, optionally scoped to one schedule (the board view)
    /// and slot, ordered by slot index.
    #[instrument(skip(self))]
    pub async fn list_assignments(
        &self,
        schedule_id: Option<Uuid>,
        slot_index: Option<i32>,
    ) -> Result<Vec<AssignmentResponse>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = DistributionItemEntity::find();
        if let Some(schedule_id) = schedule_id {
            query = query.filter(distribution_item::Column::ScheduleId.eq(schedule_id));
        }
        if let Some(slot_index) = slot_index {
            query = query.filter(distribution_item::Column::SlotIndex.eq(slot_index));
        }

        let items = query
            .order_by_asc(distribution_item::Column::SlotIndex)
            .order_by_asc(distribution_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(items.into_iter().map(AssignmentResponse::from).collect())
    }

    /// Aggregate allocation statistics: for every order distribution, the sum
    /// of planned counts over all items sharing its (order, flyer) key. A
    /// derived view — recomputed on every call, never persisted, so it cannot
    /// drift from item state. `remaining` goes negative exactly when the
    /// distribution is over-allocated.
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<BTreeMap<String, AllocationStats>, ServiceError> {
        let db = &*self.db_pool;

        let distributions = OrderDistributionEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let items = DistributionItemEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut assigned: HashMap<(Uuid, Uuid), i64> = HashMap::new();
        for item in &items {
            *assigned.entry((item.order_id, item.flyer_id)).or_insert(0) +=
                item.planned_count as i64;
        }

        let mut planned: BTreeMap<(Uuid, Uuid), i64> = BTreeMap::new();
        for distribution in &distributions {
            *planned
                .entry((distribution.order_id, distribution.flyer_id))
                .or_insert(0) += distribution.planned_count as i64;
        }

        let mut stats = BTreeMap::new();
        for ((order_id, flyer_id), total_planned) in planned {
            let total_assigned = assigned
                .get(&(order_id, flyer_id))
                .copied()
                .unwrap_or_default();
            stats.insert(
                stats_key(order_id, flyer_id),
                AllocationStats::from_totals(total_planned, total_assigned),
            );
        }

        Ok(stats)
    }

    /// Unassigned-work detection: the (distribution × area) pairs of active
    /// orders (confirmed or in-progress) with no placement at all. A pair
    /// with any item is excluded even when its planned count under-covers the
    /// distribution total; under-allocation is visible only via
    /// [`Self::get_stats`].
    #[instrument(skip(self))]
    pub async fn get_unassigned(&self) -> Result<Vec<UnassignedWork>, ServiceError> {
        let db = &*self.db_pool;

        let active_orders = OrderEntity::find()
            .filter(order::Column::Status.is_in([
                OrderStatus::Confirmed.as_str(),
                OrderStatus::InProgress.as_str(),
            ]))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        if active_orders.is_empty() {
            return Ok(Vec::new());
        }

        let orders_by_id: HashMap<Uuid, _> =
            active_orders.into_iter().map(|o| (o.id, o)).collect();
        let order_ids: Vec<Uuid> = orders_by_id.keys().copied().collect();

        let distributions = OrderDistributionEntity::find()
            .filter(order_distribution::Column::OrderId.is_in(order_ids))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        if distributions.is_empty() {
            return Ok(Vec::new());
        }

        let distribution_ids: Vec<Uuid> = distributions.iter().map(|d| d.id).collect();
        let odas = OrderDistributionAreaEntity::find()
            .filter(
                order_distribution_area::Column::OrderDistributionId.is_in(distribution_ids),
            )
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        // Placed keys over the full item set: (order, flyer, area). Items on
        // inactive orders still count as placements for their own pairs but
        // those pairs are not in the demand pool anyway.
        let items = DistributionItemEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let placed: HashSet<(Uuid, Uuid, Uuid)> = items
            .iter()
            .map(|item| (item.order_id, item.flyer_id, item.area_id))
            .collect();

        let flyers_by_id: HashMap<Uuid, _> = FlyerEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let customers_by_id: HashMap<Uuid, _> = CustomerEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let areas_by_id: HashMap<Uuid, area::Model> = AreaEntity::find()
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        let distributions_by_id: HashMap<Uuid, _> =
            distributions.into_iter().map(|d| (d.id, d)).collect();

        let mut unassigned = Vec::new();
        for oda in &odas {
            let Some(distribution) = distributions_by_id.get(&oda.order_distribution_id) else {
                continue;
            };
            if placed.contains(&(distribution.order_id, distribution.flyer_id, oda.area_id)) {
                continue;
            }

            let Some(order) = orders_by_id.get(&distribution.order_id) else {
                continue;
            };
            let Some(area) = areas_by_id.get(&oda.area_id) else {
                warn!(area_id = %oda.area_id, "Area referenced by distribution breakdown not found");
                continue;
            };
            let Some(flyer) = flyers_by_id.get(&distribution.flyer_id) else {
                warn!(flyer_id = %distribution.flyer_id, "Flyer referenced by distribution not found");
                continue;
            };

            let capacity = DistributionMethod::from_str(&distribution.method)
                .map(|m| m.capacity_of(area))
                .unwrap_or(0);
            let customer_name = customers_by_id
                .get(&order.customer_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();

            unassigned.push(UnassignedWork {
                order_distribution_id: distribution.id,
                order_id: order.id,
                order_number: order.order_number.clone(),
                customer_id: order.customer_id,
                customer_name,
                flyer_id: flyer.id,
                flyer_name: flyer.name.clone(),
                flyer_code: flyer.code.clone(),
                flyer_size: flyer.size.clone(),
                method: distribution.method.clone(),
                planned_count: distribution.planned_count,
                start_date: distribution.start_date,
                end_date: distribution.end_date,
                spare_date: distribution.spare_date,
                area_id: area.id,
                area_town: area.town.clone(),
                area_city: area.city.clone(),
                area_prefecture: area.prefecture.clone(),
                area_address_code: area.address_code.clone(),
                area_capacity: capacity,
            });
        }

        Ok(unassigned)
    }
}
