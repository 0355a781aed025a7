// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer-driven polling pipeline for the configured devices.
//!
//! Each cycle fetches every configured device concurrently and aggregates
//! the results all-or-nothing: one failed fetch fails the whole cycle and
//! the previous snapshot stays in place untouched. A successful cycle
//! replaces the snapshot atomically and notifies subscribers. There is no
//! retry or backoff inside a cycle; a failed cycle is simply retried at the
//! next tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::client::IotClient;
use crate::config::Config;
use crate::device::Device;
use crate::error::{Error, Result};

/// The latest known device payloads, keyed by device id.
///
/// A snapshot is only ever replaced as a whole; entries from a failed cycle
/// never leak into it.
pub type Snapshot = HashMap<String, Device>;

/// Channel capacity for coordinator events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notification published to subscribers after each poll cycle.
#[derive(Debug, Clone)]
pub enum CoordinatorEvent {
    /// A cycle succeeded and the snapshot was replaced.
    SnapshotUpdated,
    /// A cycle failed; the previous snapshot was retained.
    RefreshFailed {
        /// Message of the error that failed the cycle.
        message: String,
    },
}

/// Polls the configured devices and keeps their latest payloads.
///
/// The coordinator is the single owner of the snapshot. Entities read from
/// it and subscribe to [`CoordinatorEvent`]s to learn about replacements.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use yandex_climate::{Config, Coordinator, IotClient};
///
/// # async fn example() -> yandex_climate::Result<()> {
/// let config = Config::new("token", vec!["dev-1".to_string()]);
/// let client = IotClient::new(&config.token)?;
/// let coordinator = Arc::new(Coordinator::new(client, &config));
///
/// // The first cycle must succeed before anything consumes the snapshot.
/// coordinator.first_refresh().await?;
/// coordinator.start();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Coordinator {
    client: IotClient,
    device_ids: Vec<String>,
    interval: Duration,
    room_names: HashMap<String, String>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    events: broadcast::Sender<CoordinatorEvent>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Creates a coordinator for the devices named in `config`.
    ///
    /// The coordinator starts idle; call [`first_refresh`](Self::first_refresh)
    /// and then [`start`](Self::start).
    #[must_use]
    pub fn new(client: IotClient, config: &Config) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            device_ids: config.device_ids.clone(),
            interval: config.update_interval(),
            room_names: HashMap::new(),
            snapshot: RwLock::new(None),
            events,
            poll_task: Mutex::new(None),
        }
    }

    /// Attaches a room id to room name map, used for display names.
    #[must_use]
    pub fn with_room_names(mut self, room_names: HashMap<String, String>) -> Self {
        self.room_names = room_names;
        self
    }

    /// Returns the configured device ids, in configuration order.
    #[must_use]
    pub fn device_ids(&self) -> &[String] {
        &self.device_ids
    }

    /// Returns the poll interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Resolves a room id to its display name.
    #[must_use]
    pub fn room_name(&self, room_id: &str) -> Option<&str> {
        self.room_names.get(room_id).map(String::as_str)
    }

    /// Returns the snapshot of the most recent successful cycle, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().clone()
    }

    /// Returns a device's latest payload from the snapshot.
    #[must_use]
    pub fn device(&self, device_id: &str) -> Option<Device> {
        self.snapshot
            .read()
            .as_ref()
            .and_then(|snapshot| snapshot.get(device_id).cloned())
    }

    /// Returns `true` if the device appeared in the latest snapshot.
    #[must_use]
    pub fn device_available(&self, device_id: &str) -> bool {
        self.snapshot
            .read()
            .as_ref()
            .is_some_and(|snapshot| snapshot.contains_key(device_id))
    }

    /// Subscribes to poll cycle notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Runs one poll cycle immediately.
    ///
    /// All configured devices are fetched concurrently. If every fetch
    /// succeeds the snapshot is replaced and [`CoordinatorEvent::SnapshotUpdated`]
    /// is published. If any fetch fails the remaining fetches are abandoned,
    /// the previous snapshot is kept, [`CoordinatorEvent::RefreshFailed`] is
    /// published, and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failed fetch.
    pub async fn refresh(&self) -> Result<()> {
        match self.fetch_all().await {
            Ok(fresh) => {
                *self.snapshot.write() = Some(Arc::new(fresh));
                let _ = self.events.send(CoordinatorEvent::SnapshotUpdated);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "poll cycle failed, keeping previous snapshot");
                let _ = self.events.send(CoordinatorEvent::RefreshFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Runs the initial poll cycle during setup.
    ///
    /// Unlike ticked cycles, a failure here must not be swallowed: setup has
    /// to abort rather than create entities over a never-populated snapshot.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failed fetch.
    pub async fn first_refresh(&self) -> Result<()> {
        self.refresh().await
    }

    /// Fetches all configured devices concurrently.
    async fn fetch_all(&self) -> Result<Snapshot> {
        let mut fetches = JoinSet::new();
        for device_id in &self.device_ids {
            let client = self.client.clone();
            let device_id = device_id.clone();
            fetches.spawn(async move { client.get_device(&device_id).await });
        }

        let mut fresh = Snapshot::with_capacity(self.device_ids.len());
        while let Some(joined) = fetches.join_next().await {
            // Dropping the JoinSet on the error path aborts the rest.
            let device = joined.map_err(|err| Error::TaskFailed(err.to_string()))??;
            fresh.insert(device.id.clone(), device);
        }
        Ok(fresh)
    }

    /// Starts the poll timer.
    ///
    /// Cycles never overlap: the loop awaits each cycle before waiting for
    /// the next tick, and missed ticks are delayed rather than bursted.
    /// Failed cycles are logged and retried at the next tick. Calling
    /// `start` while the timer is already running does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.poll_task.lock();
        if task.is_some() {
            return;
        }

        let coordinator = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(coordinator.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; setup already ran a cycle.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                // refresh() logs and publishes failures; the loop only
                // has to keep ticking.
                let _ = coordinator.refresh().await;
            }
        }));
    }

    /// Stops the poll timer. A cycle in flight is aborted.
    pub fn stop(&self) {
        if let Some(task) = self.poll_task.lock().take() {
            task.abort();
        }
    }

    /// Returns `true` if the poll timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.poll_task.lock().is_some()
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> Coordinator {
        let config = Config::new("token", vec!["dev-1".to_string(), "dev-2".to_string()]);
        let client = IotClient::new(&config.token).unwrap();
        Coordinator::new(client, &config)
    }

    #[test]
    fn starts_without_snapshot() {
        let coordinator = coordinator();
        assert!(coordinator.snapshot().is_none());
        assert!(!coordinator.device_available("dev-1"));
        assert!(coordinator.device("dev-1").is_none());
    }

    #[test]
    fn keeps_configuration_order() {
        let coordinator = coordinator();
        assert_eq!(coordinator.device_ids(), ["dev-1", "dev-2"]);
        assert_eq!(coordinator.interval(), Duration::from_secs(120));
    }

    #[test]
    fn room_name_lookup() {
        let coordinator = coordinator()
            .with_room_names(HashMap::from([("r1".to_string(), "Кухня".to_string())]));
        assert_eq!(coordinator.room_name("r1"), Some("Кухня"));
        assert_eq!(coordinator.room_name("r2"), None);
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let coordinator = coordinator();
        assert!(!coordinator.is_running());
        coordinator.stop();
        assert!(!coordinator.is_running());
    }
}
