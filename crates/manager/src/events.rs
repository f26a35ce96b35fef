use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use solverhub_core::TenantId;

/// A job lifecycle transition, published as it happens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEvent {
    pub tenant_id: TenantId,
    pub kind: JobEventKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEventKind {
    Submitted,
    /// Registered, then refused by the worker pool and rolled back.
    Rejected { reason: String },
    Started,
    Finished { duration_ms: u64 },
    Failed { message: String },
    /// Stopped before a worker ever ran it.
    Cancelled,
    Evicted,
}

/// Fan-out of [`JobEvent`]s to any number of subscribers.
///
/// Publishing never blocks; a subscriber that falls more than the channel
/// capacity behind loses the oldest events (`RecvError::Lagged`).
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, tenant_id: &TenantId, kind: JobEventKind) {
        let event = JobEvent {
            tenant_id: tenant_id.clone(),
            kind,
            at: Utc::now(),
        };
        // No subscribers is not an error.
        if self.sender.send(event).is_err() {
            trace!(tenant = %tenant_id, "job event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_events_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let tenant = TenantId::from("t1");

        bus.publish(&tenant, JobEventKind::Submitted);
        bus.publish(&tenant, JobEventKind::Started);
        bus.publish(&tenant, JobEventKind::Finished { duration_ms: 5 });

        assert_eq!(rx.try_recv().unwrap().kind, JobEventKind::Submitted);
        assert_eq!(rx.try_recv().unwrap().kind, JobEventKind::Started);
        assert_eq!(rx.try_recv().unwrap().kind, JobEventKind::Finished { duration_ms: 5 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new(1);
        bus.publish(&TenantId::from("nobody-listens"), JobEventKind::Cancelled);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = JobEvent {
            tenant_id: TenantId::from("t"),
            kind: JobEventKind::Failed { message: "boom".into() },
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["tenant_id"], "t");
        assert_eq!(json["kind"]["event"], "failed");
        assert_eq!(json["kind"]["message"], "boom");
    }
}
