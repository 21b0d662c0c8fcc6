// Live subscription - Keeps the latest reading of one sensor up to date
use crate::application::live_transport::{
    LiveConnection, LiveTransport, TransportEvent, TransportKind,
};
use crate::domain::live::{ConnectionState, LiveSnapshot};
use crate::domain::sensor::SensorEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Bounded, backoff-delayed re-subscription after a transport failure.
/// `max_attempts == 0` disables it, leaving a failed subscription closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before reconnect attempt `attempt` (1-based): doubles each time, capped
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

struct ActiveStream {
    sensor_id: String,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Per-view live subscription.
///
/// Holds at most one connection. The latest entry and the connection state are
/// published through a watch channel so a view can re-render on every change.
pub struct LiveSubscription {
    transport: Arc<dyn LiveTransport>,
    policy: ReconnectPolicy,
    snapshot: Arc<watch::Sender<LiveSnapshot>>,
    active: Option<ActiveStream>,
}

impl LiveSubscription {
    pub fn new(transport: Arc<dyn LiveTransport>) -> Self {
        let (snapshot, _) = watch::channel(LiveSnapshot::idle());
        Self {
            transport,
            policy: ReconnectPolicy::disabled(),
            snapshot: Arc::new(snapshot),
            active: None,
        }
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    pub fn sensor_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.sensor_id.as_str())
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<LiveSnapshot> {
        self.snapshot.subscribe()
    }

    /// Point the subscription at a sensor, or at nothing.
    ///
    /// Any existing connection is closed before the new one is opened and the
    /// last entry is cleared. Supplying the identifier that is already live is
    /// a no-op; supplying it again after the connection closed reconnects.
    pub async fn subscribe(&mut self, sensor_id: Option<&str>) {
        let sensor_id = sensor_id.filter(|id| !id.is_empty());

        if let (Some(id), Some(active)) = (sensor_id, &self.active) {
            if active.sensor_id == id && !active.task.is_finished() {
                return;
            }
        }

        self.teardown().await;

        let Some(id) = sensor_id else {
            self.snapshot.send_replace(LiveSnapshot::idle());
            return;
        };

        tracing::debug!(
            "Subscribing to sensor {} over {}",
            id,
            self.transport.kind()
        );
        self.snapshot.send_replace(LiveSnapshot {
            state: ConnectionState::Connecting,
            last_entry: None,
        });

        let connection = self.transport.connect(id);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(run_subscription(
            self.transport.clone(),
            connection,
            id.to_string(),
            self.policy,
            self.snapshot.clone(),
            cancel_rx,
        ));

        self.active = Some(ActiveStream {
            sensor_id: id.to_string(),
            cancel: Some(cancel_tx),
            task,
        });
    }

    /// Close the connection and mark the subscription disconnected.
    /// Calling it again, or on a subscription that never connected, does nothing.
    pub async fn dispose(&mut self) {
        if self.active.is_none() {
            return;
        }
        self.teardown().await;
        self.snapshot
            .send_modify(|s| s.state = ConnectionState::Closed);
    }

    async fn teardown(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        if let Some(cancel) = active.cancel.take() {
            // Fails only when the task already finished on its own
            let _ = cancel.send(());
        }

        if let Err(e) = (&mut active.task).await {
            if !e.is_cancelled() {
                tracing::error!("Live subscription task for {} failed: {}", active.sensor_id, e);
            }
        }
        tracing::debug!("Unsubscribed from sensor {}", active.sensor_id);
    }
}

/// Dropping without `dispose` still signals the pump, which closes the
/// connection on its own; only the final `Closed` state is not published.
impl Drop for LiveSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.active.as_mut().and_then(|a| a.cancel.take()) {
            let _ = cancel.send(());
        }
    }
}

enum PumpOutcome {
    Cancelled,
    Failed,
}

async fn run_subscription(
    transport: Arc<dyn LiveTransport>,
    mut connection: Box<dyn LiveConnection>,
    sensor_id: String,
    policy: ReconnectPolicy,
    snapshot: Arc<watch::Sender<LiveSnapshot>>,
    mut cancel: oneshot::Receiver<()>,
) {
    let mut attempt = 0u32;

    loop {
        let outcome = pump_connection(
            connection.as_mut(),
            &sensor_id,
            &snapshot,
            &mut cancel,
            &mut attempt,
        )
        .await;
        connection.close().await;

        if let PumpOutcome::Cancelled = outcome {
            return;
        }

        if attempt >= policy.max_attempts {
            snapshot.send_modify(|s| s.state = ConnectionState::Closed);
            return;
        }

        attempt += 1;
        let delay = policy.backoff_for(attempt);
        tracing::info!(
            "Reconnecting to sensor {} in {:?} (attempt {}/{})",
            sensor_id,
            delay,
            attempt,
            policy.max_attempts
        );
        snapshot.send_modify(|s| s.state = ConnectionState::Reconnecting { attempt });

        tokio::select! {
            _ = &mut cancel => return,
            _ = tokio::time::sleep(delay) => {}
        }

        snapshot.send_modify(|s| s.state = ConnectionState::Connecting);
        connection = transport.connect(&sensor_id);
    }
}

async fn pump_connection(
    connection: &mut dyn LiveConnection,
    sensor_id: &str,
    snapshot: &watch::Sender<LiveSnapshot>,
    cancel: &mut oneshot::Receiver<()>,
    attempt: &mut u32,
) -> PumpOutcome {
    loop {
        let event = tokio::select! {
            biased;
            _ = &mut *cancel => return PumpOutcome::Cancelled,
            event = connection.next_event() => event,
        };

        match event {
            Some(TransportEvent::Opened) => {
                tracing::debug!("Live connection for sensor {} is open", sensor_id);
                *attempt = 0;
                snapshot.send_modify(|s| s.state = ConnectionState::Open);
            }
            Some(TransportEvent::Frame(payload)) => {
                if let Some(entry) = decode_frame(&payload, sensor_id) {
                    snapshot.send_modify(|s| s.last_entry = Some(entry));
                }
            }
            Some(TransportEvent::Error(e)) => {
                tracing::warn!("Live connection for sensor {} failed: {}", sensor_id, e);
                return PumpOutcome::Failed;
            }
            None => {
                tracing::debug!("Live stream for sensor {} ended", sensor_id);
                return PumpOutcome::Failed;
            }
        }
    }
}

/// Decode one frame, keeping it only if it belongs to the subscribed sensor
fn decode_frame(payload: &str, sensor_id: &str) -> Option<SensorEntry> {
    match serde_json::from_str::<SensorEntry>(payload) {
        Ok(entry) if entry.sensor_id == sensor_id => Some(entry),
        Ok(entry) => {
            tracing::debug!(
                "Discarding entry {} for sensor {} on subscription {}",
                entry.id,
                entry.sensor_id,
                sensor_id
            );
            None
        }
        Err(e) => {
            tracing::warn!("Dropping malformed live frame for sensor {}: {}", sensor_id, e);
            None
        }
    }
}
