//! Event Bus (spec §4.2 "State Transitions & Events"): a broadcast channel
//! of typed lifecycle events so CLI/metrics/audit consumers can subscribe
//! without the services that raise them depending on any of them.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::models::{BotState, CampaignState, TaskStatus};

/// Which campaign target crossed its threshold (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Volume,
    Transactions,
    Time,
}

/// Monotonically increasing sequence assigned by the bus at publish time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

/// Typed event payloads the orchestrator's services raise (spec §4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    Initialized,
    ShutdownStarted,
    ShutdownComplete,

    TaskStateChanged {
        task_id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    },
    BotStateChanged {
        bot_id: Uuid,
        from: BotState,
        to: BotState,
    },
    CampaignStateChanged {
        campaign_id: Uuid,
        from: CampaignState,
        to: CampaignState,
    },

    TargetReached {
        campaign_id: Uuid,
        kind: TargetKind,
    },
    MigrationDetected {
        token_mint: String,
        from_venue: String,
        to_venue: String,
    },
    AdjusterRecommended {
        campaign_id: Uuid,
        add_bots: i32,
        remove_bots: i32,
        interval_delta_pct: f64,
        size_delta_pct: f64,
    },

    Error {
        scope: String,
        message: String,
    },
}

/// A published event with its bus-assigned sequence number and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: OrchestratorEvent,
}

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { channel_capacity: 1024 }
    }
}

/// Broadcast hub for orchestrator lifecycle events. Publishing never
/// blocks or fails on a slow/absent subscriber (spec §5: observability is
/// best-effort and never gates core control flow).
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
    sequence: AtomicU64,
}

impl EventBus {
    pub fn new(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, payload: OrchestratorEvent) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = Envelope {
            sequence,
            timestamp: Utc::now(),
            payload,
        };
        let _ = self.sender.send(envelope);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}
