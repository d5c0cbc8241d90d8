use chrono::{NaiveDate, Utc};
use flyerops_api::{
    db::{create_db_pool, run_migrations},
    entities::distribution_item,
    errors::ServiceError,
    services::schedules::{
        CreateScheduleRequest, ScheduleService, UpdateScheduleRequest,
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::{env, sync::Arc};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

async fn seed_item(db: &DatabaseConnection, schedule_id: Uuid, slot_index: i32) -> Uuid {
    let id = Uuid::new_v4();
    distribution_item::ActiveModel {
        id: Set(id),
        schedule_id: Set(schedule_id),
        slot_index: Set(slot_index),
        order_id: Set(Uuid::new_v4()),
        flyer_id: Set(Uuid::new_v4()),
        customer_id: Set(Uuid::new_v4()),
        area_id: Set(Uuid::new_v4()),
        flyer_name: Set("Test Flyer".to_string()),
        flyer_code: Set("FLY-T".to_string()),
        method: Set("door_to_door".to_string()),
        planned_count: Set(100),
        start_date: Set(date(2025, 8, 1)),
        end_date: Set(date(2025, 8, 7)),
        spare_date: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("item insert");
    id
}

#[tokio::test]
async fn schedule_lifecycle_end_to_end() {
    env::set_var("APP__DATABASE_URL", "sqlite::memory:?cache=shared");

    let db_pool = Arc::new(create_db_pool().await.expect("Failed to create DB pool"));
    run_migrations(db_pool.as_ref())
        .await
        .expect("Failed to run migrations");
    let db = db_pool.as_ref();

    let service = ScheduleService::new(db_pool.clone(), None, 10);

    // Create with defaults: status planned, configured slot count.
    let created = service
        .create_schedule(CreateScheduleRequest {
            delivery_date: date(2025, 8, 3),
            branch_id: None,
            operator: Some("operator-a".to_string()),
            status: None,
            remarks: None,
            slot_count: None,
        })
        .await
        .expect("schedule should be created");
    assert_eq!(created.status, "planned");
    assert_eq!(created.slot_count, 10);
    assert_eq!(created.operator.as_deref(), Some("operator-a"));
    assert!(created.updated_at.is_none());

    // Explicit values stick.
    let branch = Uuid::new_v4();
    let second = service
        .create_schedule(CreateScheduleRequest {
            delivery_date: date(2025, 8, 4),
            branch_id: Some(branch),
            operator: None,
            status: Some("fixed".to_string()),
            remarks: Some("rain backup".to_string()),
            slot_count: Some(4),
        })
        .await
        .expect("second schedule should be created");
    assert_eq!(second.status, "fixed");
    assert_eq!(second.slot_count, 4);

    // Unknown statuses are rejected up front.
    let result = service
        .create_schedule(CreateScheduleRequest {
            delivery_date: date(2025, 8, 5),
            branch_id: None,
            operator: None,
            status: Some("archived".to_string()),
            remarks: None,
            slot_count: None,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidStatus(_))));

    // Slot count outside 1..=100 fails validation.
    let result = service
        .create_schedule(CreateScheduleRequest {
            delivery_date: date(2025, 8, 5),
            branch_id: None,
            operator: None,
            status: None,
            remarks: None,
            slot_count: Some(0),
        })
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // Get round-trip.
    let fetched = service
        .get_schedule(created.id)
        .await
        .expect("get should succeed")
        .expect("schedule should exist");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.delivery_date, created.delivery_date);

    assert!(service
        .get_schedule(Uuid::new_v4())
        .await
        .expect("get should succeed")
        .is_none());

    // Listing: date and branch filters, delivery-date ordering.
    let all = service
        .list_schedules(1, 50, None, None)
        .await
        .expect("list should succeed");
    assert_eq!(all.total, 2);
    assert!(all
        .schedules
        .windows(2)
        .all(|w| w[0].delivery_date <= w[1].delivery_date));

    let by_date = service
        .list_schedules(1, 50, Some(date(2025, 8, 4)), None)
        .await
        .expect("filtered list should succeed");
    assert_eq!(by_date.total, 1);
    assert_eq!(by_date.schedules[0].id, second.id);

    let by_branch = service
        .list_schedules(1, 50, None, Some(branch))
        .await
        .expect("branch list should succeed");
    assert_eq!(by_branch.total, 1);
    assert_eq!(by_branch.schedules[0].id, second.id);

    let result = service.list_schedules(0, 50, None, None).await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // Partial update touches only the supplied fields.
    let updated = service
        .update_schedule(
            created.id,
            UpdateScheduleRequest {
                status: Some("completed".to_string()),
                remarks: Some("extra crew".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update should succeed");
    assert_eq!(updated.status, "completed");
    assert_eq!(updated.remarks.as_deref(), Some("extra crew"));
    assert_eq!(updated.delivery_date, created.delivery_date);
    assert_eq!(updated.operator.as_deref(), Some("operator-a"));
    assert_eq!(updated.slot_count, 10);
    assert!(updated.updated_at.is_some());

    let result = service
        .update_schedule(
            created.id,
            UpdateScheduleRequest {
                status: Some("bogus".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::InvalidStatus(_))));

    let result = service
        .update_schedule(Uuid::new_v4(), UpdateScheduleRequest::default())
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    // Deleting a non-empty schedule cascades to its items; items on other
    // schedules survive.
    seed_item(db, created.id, 0).await;
    seed_item(db, created.id, 1).await;
    let survivor = seed_item(db, second.id, 0).await;

    let removed = service
        .delete_schedule(created.id)
        .await
        .expect("delete should succeed");
    assert_eq!(removed, 2);

    assert!(service
        .get_schedule(created.id)
        .await
        .expect("get should succeed")
        .is_none());

    let leftover = distribution_item::Entity::find()
        .filter(distribution_item::Column::ScheduleId.eq(created.id))
        .all(db)
        .await
        .expect("item query");
    assert!(leftover.is_empty());

    let survivor_row = distribution_item::Entity::find_by_id(survivor)
        .one(db)
        .await
        .expect("item query");
    assert!(survivor_row.is_some());

    let result = service.delete_schedule(created.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
