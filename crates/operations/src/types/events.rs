//! Change notifications fanned out to live subscribers.

use cleanit_database::{timestamp_now, JobStatus, PhotoKind, RequestStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    RequestCreated {
        request_id: String,
        building_id: String,
    },
    RequestStatusChanged {
        request_id: String,
        from: RequestStatus,
        to: RequestStatus,
    },
    JobScheduled {
        job_id: String,
        building_id: String,
    },
    JobStatusChanged {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
    JobPhotoAdded {
        job_id: String,
        kind: PhotoKind,
        url: String,
    },
    MessagePosted {
        conversation_id: String,
        message_id: String,
        sender_id: String,
    },
    ReviewPosted {
        job_id: String,
        review_id: String,
        rating: i64,
    },
}

/// An event plus the users and company it concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: DomainEvent,
    pub recipients: Vec<String>,
    pub company_id: Option<String>,
    pub at: String,
}

impl EventEnvelope {
    pub fn is_for(&self, user_id: &str) -> bool {
        self.recipients.iter().any(|recipient| recipient == user_id)
    }

    pub fn concerns_company(&self, company_id: &str) -> bool {
        self.company_id.as_deref() == Some(company_id)
    }
}

/// Broadcast channel for change notifications. Slow subscribers lose the
/// oldest events instead of holding publishers back.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent, recipients: Vec<String>, company_id: Option<String>) {
        let mut recipients = recipients;
        recipients.sort();
        recipients.dedup();

        let envelope = EventEnvelope {
            event,
            recipients,
            company_id,
            at: timestamp_now(),
        };

        // No subscribers is not an error.
        if let Ok(count) = self.sender.send(envelope) {
            trace!(subscribers = count, "event published");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut receiver = bus.subscribe();

        bus.publish(
            DomainEvent::JobScheduled {
                job_id: "job".to_string(),
                building_id: "building".to_string(),
            },
            vec!["worker".to_string(), "client".to_string(), "worker".to_string()],
            Some("company".to_string()),
        );

        let envelope = receiver.recv().await.unwrap();
        assert_eq!(envelope.recipients, vec!["client", "worker"]);
        assert!(envelope.is_for("worker"));
        assert!(!envelope.is_for("stranger"));
        assert!(envelope.concerns_company("company"));
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::new(1);
        bus.publish(
            DomainEvent::ReviewPosted {
                job_id: "job".to_string(),
                review_id: "review".to_string(),
                rating: 5,
            },
            vec![],
            None,
        );
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(DomainEvent::RequestStatusChanged {
            request_id: "r1".to_string(),
            from: RequestStatus::Pending,
            to: RequestStatus::Assigned,
        })
        .unwrap();

        assert_eq!(json["type"], "request_status_changed");
        assert_eq!(json["data"]["to"], "assigned");
    }
}
