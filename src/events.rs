//! In-process domain events emitted by the allocation engine.
//!
//! Events are fire-and-forget: a failed send is logged by the caller and never
//! fails the originating operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events that can occur in the scheduling subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AssignmentCreated {
        item_id: Uuid,
        schedule_id: Uuid,
        slot_index: i32,
        order_id: Uuid,
        flyer_id: Uuid,
        area_id: Uuid,
        planned_count: i32,
        timestamp: DateTime<Utc>,
    },
    AssignmentUpdated {
        item_id: Uuid,
        schedule_id: Uuid,
        slot_index: i32,
        planned_count: i32,
        timestamp: DateTime<Utc>,
    },
    AssignmentRemoved {
        item_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    ScheduleCreated {
        schedule_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    ScheduleDeleted {
        schedule_id: Uuid,
        removed_items: u64,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::AssignmentCreated {
                item_id,
                schedule_id,
                slot_index,
                planned_count,
                ..
            } => {
                info!(
                    item_id = %item_id,
                    schedule_id = %schedule_id,
                    slot_index = slot_index,
                    planned_count = planned_count,
                    "Assignment created"
                );
            }
            Event::AssignmentUpdated {
                item_id,
                schedule_id,
                slot_index,
                planned_count,
                ..
            } => {
                info!(
                    item_id = %item_id,
                    schedule_id = %schedule_id,
                    slot_index = slot_index,
                    planned_count = planned_count,
                    "Assignment updated"
                );
            }
            Event::AssignmentRemoved { item_id, .. } => {
                info!(item_id = %item_id, "Assignment removed");
            }
            Event::ScheduleCreated { schedule_id, .. } => {
                info!(schedule_id = %schedule_id, "Schedule created");
            }
            Event::ScheduleDeleted {
                schedule_id,
                removed_items,
                ..
            } => {
                info!(
                    schedule_id = %schedule_id,
                    removed_items = removed_items,
                    "Schedule deleted"
                );
            }
        }
    }
    warn!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::AssignmentRemoved {
                item_id: Uuid::new_v4(),
                timestamp: Utc::now(),
            })
            .await
            .expect("send should succeed");

        let received = rx.recv().await.expect("event expected");
        assert!(matches!(received, Event::AssignmentRemoved { .. }));
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender
            .send(Event::ScheduleCreated {
                schedule_id: Uuid::new_v4(),
                timestamp: Utc::now(),
            })
            .await;
        assert!(result.is_err());
    }
}
