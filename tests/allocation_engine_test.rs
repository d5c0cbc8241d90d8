use chrono::{NaiveDate, Utc};
use flyerops_api::{
    db::{create_db_pool, run_migrations},
    entities::{
        area, customer, flyer, order,
        order::OrderStatus,
        order_distribution,
        order_distribution::DistributionMethod,
        order_distribution_area, schedule,
        schedule::ScheduleStatus,
    },
    errors::ServiceError,
    services::allocation::{
        stats_key, AllocationService, CreateAssignmentRequest, UpdateAssignmentRequest,
    },
    services::schedules::{CreateScheduleRequest, ScheduleService},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::{env, sync::Arc};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

async fn seed_customer(db: &DatabaseConnection, name: &str) -> customer::Model {
    customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        code: Set(format!("C-{}", name.to_uppercase())),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("customer insert")
}

async fn seed_order(
    db: &DatabaseConnection,
    customer_id: Uuid,
    number: &str,
    status: OrderStatus,
) -> order::Model {
    order::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_number: Set(number.to_string()),
        customer_id: Set(customer_id),
        status: Set(status.as_str().to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("order insert")
}

async fn seed_flyer(db: &DatabaseConnection, name: &str, code: &str) -> flyer::Model {
    flyer::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        code: Set(code.to_string()),
        size: Set(Some("B5".to_string())),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("flyer insert")
}

async fn seed_area(
    db: &DatabaseConnection,
    town: &str,
    door: Option<i32>,
    multi: Option<i32>,
) -> area::Model {
    area::ActiveModel {
        id: Set(Uuid::new_v4()),
        address_code: Set(format!("13-{}", town)),
        town: Set(town.to_string()),
        city: Set("Chiyoda".to_string()),
        prefecture: Set("Tokyo".to_string()),
        door_to_door_capacity: Set(door),
        multi_family_capacity: Set(multi),
    }
    .insert(db)
    .await
    .expect("area insert")
}

async fn seed_distribution(
    db: &DatabaseConnection,
    order_id: Uuid,
    flyer_id: Uuid,
    method: DistributionMethod,
    planned_count: i32,
) -> order_distribution::Model {
    order_distribution::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        flyer_id: Set(flyer_id),
        method: Set(method.as_str().to_string()),
        planned_count: Set(planned_count),
        start_date: Set(date(2025, 7, 1)),
        end_date: Set(date(2025, 7, 7)),
        spare_date: Set(Some(date(2025, 7, 8))),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("distribution insert")
}

async fn seed_distribution_area(
    db: &DatabaseConnection,
    distribution_id: Uuid,
    area_id: Uuid,
) -> order_distribution_area::Model {
    order_distribution_area::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_distribution_id: Set(distribution_id),
        area_id: Set(area_id),
    }
    .insert(db)
    .await
    .expect("distribution area insert")
}

async fn seed_schedule(db: &DatabaseConnection, slot_count: i32) -> schedule::Model {
    schedule::ActiveModel {
        id: Set(Uuid::new_v4()),
        delivery_date: Set(date(2025, 7, 3)),
        branch_id: Set(None),
        operator: Set(Some("operator-a".to_string())),
        status: Set(ScheduleStatus::Planned.as_str().to_string()),
        remarks: Set(None),
        slot_count: Set(slot_count),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(db)
    .await
    .expect("schedule insert")
}

#[tokio::test]
async fn allocation_engine_end_to_end() {
    env::set_var("APP__DATABASE_URL", "sqlite::memory:?cache=shared");

    let db_pool = Arc::new(create_db_pool().await.expect("Failed to create DB pool"));
    run_migrations(db_pool.as_ref())
        .await
        .expect("Failed to run migrations");
    let db = db_pool.as_ref();

    let service = AllocationService::new(db_pool.clone(), None, false);
    let schedule_service = ScheduleService::new(db_pool.clone(), None, 10);

    // Reference data
    let customer = seed_customer(db, "acme").await;
    let order_r = seed_order(db, customer.id, "ORD-1001", OrderStatus::Confirmed).await;
    let flyer_r = seed_flyer(db, "Summer Sale", "FLY-SS").await;

    // Scenario A: door-to-door assignment initializes at the area ceiling.
    let area_x = seed_area(db, "area-x", Some(500), Some(120)).await;
    let dist_r = seed_distribution(db, order_r.id, flyer_r.id, DistributionMethod::DoorToDoor, 1000).await;
    let oda_a = seed_distribution_area(db, dist_r.id, area_x.id).await;

    let schedule1 = seed_schedule(db, 10).await;
    let item_a = service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: oda_a.id,
            schedule_id: schedule1.id,
            slot_index: 0,
        })
        .await
        .expect("assignment A should succeed");
    assert_eq!(item_a.planned_count, 500);
    assert_eq!(item_a.schedule_id, schedule1.id);
    assert_eq!(item_a.slot_index, 0);
    assert_eq!(item_a.flyer_name, "Summer Sale");
    assert_eq!(item_a.flyer_code, "FLY-SS");
    assert_eq!(item_a.customer_id, customer.id);
    assert_eq!(item_a.start_date, date(2025, 7, 1));
    assert_eq!(item_a.spare_date, Some(date(2025, 7, 8)));

    // Multi-family distributions read the other capacity column.
    let order_m = seed_order(db, customer.id, "ORD-1002", OrderStatus::Confirmed).await;
    let flyer_m = seed_flyer(db, "Tower Promo", "FLY-TP").await;
    let dist_m = seed_distribution(db, order_m.id, flyer_m.id, DistributionMethod::MultiFamily, 200).await;
    let oda_m = seed_distribution_area(db, dist_m.id, area_x.id).await;
    let item_m = service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: oda_m.id,
            schedule_id: schedule1.id,
            slot_index: 0,
        })
        .await
        .expect("multi-family assignment should succeed");
    assert_eq!(item_m.planned_count, 120);

    // Null capacity defaults to a zero ceiling.
    let area_null = seed_area(db, "area-null", None, None).await;
    let oda_null = seed_distribution_area(db, dist_m.id, area_null.id).await;
    let item_null = service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: oda_null.id,
            schedule_id: schedule1.id,
            slot_index: 1,
        })
        .await
        .expect("assignment with null capacity should succeed");
    assert_eq!(item_null.planned_count, 0);

    // Slot bounds are enforced at placement time.
    let result = service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: oda_a.id,
            schedule_id: schedule1.id,
            slot_index: 10,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // Unknown pairing id aborts with NotFound before any write.
    let result = service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: Uuid::new_v4(),
            schedule_id: schedule1.id,
            slot_index: 0,
        })
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    // Scenario B: two 600-unit placements against a 1000-unit distribution.
    let order_b = seed_order(db, customer.id, "ORD-1003", OrderStatus::InProgress).await;
    let flyer_b = seed_flyer(db, "Autumn Fair", "FLY-AF").await;
    let dist_b = seed_distribution(db, order_b.id, flyer_b.id, DistributionMethod::DoorToDoor, 1000).await;
    let area_b1 = seed_area(db, "area-b1", Some(600), None).await;
    let area_b2 = seed_area(db, "area-b2", Some(600), None).await;
    let oda_b1 = seed_distribution_area(db, dist_b.id, area_b1.id).await;
    let oda_b2 = seed_distribution_area(db, dist_b.id, area_b2.id).await;

    service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: oda_b1.id,
            schedule_id: schedule1.id,
            slot_index: 2,
        })
        .await
        .expect("assignment B1 should succeed");
    service
        .create_assignment(CreateAssignmentRequest {
            order_distribution_area_id: oda_b2.id,
            schedule_id: schedule1.id,
            slot_index: 3,
        })
        .await
        .expect("assignment B2 should succeed");

    let stats = service.get_stats().await.expect("stats should compute");
    let entry = stats
        .get(&stats_key(order_b.id, flyer_b.id))
        .expect("stats entry for scenario B");
    assert_eq!(entry.total_planned, 1000);
    assert_eq!(entry.total_assigned, 1200);
    assert_eq!(entry.remaining, -200);
    assert!(entry.is_over);

    // Under-allocation keeps a positive remainder and no over flag.
    let entry_m = stats
        .get(&stats_key(order_m.id, flyer_m.id))
        .expect("stats entry for multi-family distribution");
    assert_eq!(entry_m.total_planned, 200);
    assert_eq!(entry_m.total_assigned, 120);
    assert_eq!(entry_m.remaining, 80);
    assert!(!entry_m.is_over);

    // GetStats is a derived view: identical twice with no intervening writes.
    let stats_again = service.get_stats().await.expect("stats should recompute");
    assert_eq!(stats, stats_again);

    // Scenario C: area A of dist_r is placed, area B is not; exactly one
    // unassigned row, for (dist_r, area B). Under-allocation of placed pairs
    // does not resurrect them.
    let area_y = seed_area(db, "area-y", Some(300), None).await;
    seed_distribution_area(db, dist_r.id, area_y.id).await;

    let unassigned = service.get_unassigned().await.expect("unassigned report");
    let for_dist_r: Vec<_> = unassigned
        .iter()
        .filter(|row| row.order_distribution_id == dist_r.id)
        .collect();
    assert_eq!(for_dist_r.len(), 1);
    let row = for_dist_r[0];
    assert_eq!(row.area_id, area_y.id);
    assert_eq!(row.area_town, "area-y");
    assert_eq!(row.area_city, "Chiyoda");
    assert_eq!(row.area_prefecture, "Tokyo");
    assert_eq!(row.customer_name, "acme");
    assert_eq!(row.flyer_code, "FLY-SS");
    assert_eq!(row.flyer_size.as_deref(), Some("B5"));
    assert_eq!(row.area_capacity, 300);
    assert_eq!(row.planned_count, 1000);

    // Fully placed distributions do not appear at all.
    assert!(unassigned
        .iter()
        .all(|row| row.order_distribution_id != dist_b.id));

    // Orders outside CONFIRMED/IN_PROGRESS contribute no demand even with
    // zero placements.
    let order_draft = seed_order(db, customer.id, "ORD-1004", OrderStatus::Draft).await;
    let dist_draft =
        seed_distribution(db, order_draft.id, flyer_r.id, DistributionMethod::DoorToDoor, 400).await;
    seed_distribution_area(db, dist_draft.id, area_y.id).await;
    let order_cancelled = seed_order(db, customer.id, "ORD-1005", OrderStatus::Cancelled).await;
    let dist_cancelled =
        seed_distribution(db, order_cancelled.id, flyer_r.id, DistributionMethod::DoorToDoor, 400)
            .await;
    seed_distribution_area(db, dist_cancelled.id, area_y.id).await;

    let unassigned = service.get_unassigned().await.expect("unassigned report");
    assert!(unassigned
        .iter()
        .all(|row| row.order_distribution_id != dist_draft.id
            && row.order_distribution_id != dist_cancelled.id));

    // Scenario D: relocation applies only the supplied fields.
    let schedule2 = schedule_service
        .create_schedule(CreateScheduleRequest {
            delivery_date: date(2025, 7, 4),
            branch_id: None,
            operator: None,
            status: None,
            remarks: None,
            slot_count: Some(8),
        })
        .await
        .expect("schedule 2 should be created");

    let moved = service
        .update_assignment(
            item_a.id,
            UpdateAssignmentRequest {
                schedule_id: Some(schedule2.id),
                slot_index: Some(3),
                planned_count: None,
            },
        )
        .await
        .expect("relocation should succeed");
    assert_eq!(moved.schedule_id, schedule2.id);
    assert_eq!(moved.slot_index, 3);
    assert_eq!(moved.planned_count, 500);

    // Resizing above the ceiling is allowed by default (warn-only hook).
    let resized = service
        .update_assignment(
            item_a.id,
            UpdateAssignmentRequest {
                planned_count: Some(650),
                ..Default::default()
            },
        )
        .await
        .expect("over-ceiling resize should be allowed");
    assert_eq!(resized.planned_count, 650);
    assert_eq!(resized.schedule_id, schedule2.id);

    // With enforcement enabled the same resize is rejected.
    let enforcing = AllocationService::new(db_pool.clone(), None, true);
    let result = enforcing
        .update_assignment(
            item_a.id,
            UpdateAssignmentRequest {
                planned_count: Some(700),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // Slot bounds also apply on relocation.
    let result = service
        .update_assignment(
            item_a.id,
            UpdateAssignmentRequest {
                slot_index: Some(8),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // Board listing is scoped and slot-ordered.
    let board = service
        .list_assignments(Some(schedule1.id), None)
        .await
        .expect("board listing");
    assert!(board.iter().all(|item| item.schedule_id == schedule1.id));
    assert!(board.windows(2).all(|w| w[0].slot_index <= w[1].slot_index));

    // Deleting an assignment frees its (order, flyer, area) pair again.
    service
        .delete_assignment(item_m.id)
        .await
        .expect("delete should succeed");
    let unassigned = service.get_unassigned().await.expect("unassigned report");
    assert!(unassigned
        .iter()
        .any(|row| row.order_distribution_id == dist_m.id && row.area_id == area_x.id));

    let result = service.delete_assignment(item_m.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let result = service
        .update_assignment(Uuid::new_v4(), UpdateAssignmentRequest::default())
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
