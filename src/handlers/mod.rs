pub mod assignments;
pub mod reports;
pub mod schedules;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::allocation::AllocationService;
use crate::services::schedules::ScheduleService;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub allocation: Arc<AllocationService>,
    pub schedules: Arc<ScheduleService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            allocation: Arc::new(AllocationService::new(
                db.clone(),
                Some(event_sender.clone()),
                config.enforce_capacity,
            )),
            schedules: Arc::new(ScheduleService::new(
                db,
                Some(event_sender),
                config.default_slot_count,
            )),
        }
    }
}
