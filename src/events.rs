//! Closed set of events the `WindowManager` publishes to other subsystems,
//! and the batching loop its listeners share.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::errors::WindowResult;
use crate::hotkeys::HotkeyId;
use crate::types::ZoomLevel;

const EVENT_BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ManagerEvent {
    AcceleratorChanged { id: HotkeyId, accelerator: Option<String> },
    HotkeyEnabledChanged { id: HotkeyId, enabled: bool },
    ZoomLevelChanged { level: ZoomLevel },
    AlwaysOnTopChanged { enabled: bool },
}

/// Broadcast channel for [`ManagerEvent`]s. Publishing never blocks and never
/// fails; events published with no subscriber are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ManagerEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ManagerEvent) {
        log::debug!("📣 {:?}", event);
        // Err only means nobody is listening yet
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Drain queued events without blocking. Returns `true` if any of them is
/// `relevant`, or if the receiver lagged and events were lost.
pub fn drain_relevant(
    rx: &mut broadcast::Receiver<ManagerEvent>,
    relevant: fn(&ManagerEvent) -> bool,
    listener: &str,
) -> bool {
    let mut matched = false;
    loop {
        match rx.try_recv() {
            Ok(event) => matched |= relevant(&event),
            Err(TryRecvError::Lagged(skipped)) => {
                log::warn!("⚠️ {} lagged by {} events", listener, skipped);
                matched = true;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    matched
}

/// Wait for events until the bus closes, calling `on_batch` once per burst
/// that contains a relevant event (or a lag). Returns how many calls succeeded.
pub async fn run_batched<F>(
    mut rx: broadcast::Receiver<ManagerEvent>,
    relevant: fn(&ManagerEvent) -> bool,
    listener: &str,
    mut on_batch: F,
) -> u64
where
    F: FnMut() -> WindowResult<()>,
{
    let mut applied = 0;
    loop {
        let matched = match rx.recv().await {
            Ok(event) => relevant(&event),
            Err(RecvError::Lagged(skipped)) => {
                log::warn!("⚠️ {} lagged by {} events", listener, skipped);
                true
            }
            Err(RecvError::Closed) => break,
        };

        // Coalesce whatever else is already queued
        let matched = drain_relevant(&mut rx, relevant, listener) || matched;
        if matched {
            match on_batch() {
                Ok(()) => applied += 1,
                Err(e) => log::error!("❌ {} failed to apply changes: {}", listener, e),
            }
        }
    }

    log::info!("{} stopped after {} updates", listener, applied);
    applied
}
