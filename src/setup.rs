// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Setup-time flows: module discovery and integration bootstrap.
//!
//! Discovery is the one place where individual device fetch failures are
//! tolerated: a device that cannot be fetched is logged and skipped so the
//! user can still pick from the rest. Once a configuration exists,
//! [`Integration::start`] is strict again: the first poll cycle must
//! succeed or setup aborts.

use std::sync::Arc;

use crate::client::IotClient;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::device::Device;
use crate::entity::{Entity, build_entities};
use crate::error::Result;

/// A climate module found during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveredModule {
    /// The device, as fetched during discovery.
    pub device: Device,
    /// The resolved room name, when the device's room is known.
    pub room_name: Option<String>,
}

impl DiscoveredModule {
    /// Returns a selection label for onboarding UIs.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.room_name {
            Some(room) => format!("{} — {} ({})", self.device.name, room, self.device.id),
            None => format!("{} ({})", self.device.name, self.device.id),
        }
    }
}

/// Finds all climate modules visible to the client's token.
///
/// Validates the token implicitly through `/user/info` (so 401, 403, and
/// generic API failures surface with their distinct kinds), fetches every
/// visible device, and keeps those that classify as climate modules.
/// Devices that fail to fetch are skipped with a debug log.
///
/// # Errors
///
/// Fails if `/user/info` cannot be fetched or is malformed. Per-device
/// fetch failures do not fail discovery.
pub async fn discover_climate_modules(client: &IotClient) -> Result<Vec<DiscoveredModule>> {
    let info = client.user_info().await?;
    let room_names = info.room_names();

    let mut modules = Vec::new();
    for device_id in info.device_ids() {
        let device = match client.get_device(&device_id).await {
            Ok(device) => device,
            Err(err) => {
                tracing::debug!(device_id = %device_id, error = %err, "skipping device");
                continue;
            }
        };

        if device.is_climate_module() {
            let room_name = device
                .room
                .as_ref()
                .and_then(|room| room_names.get(room).cloned());
            modules.push(DiscoveredModule { device, room_name });
        }
    }

    tracing::debug!(count = modules.len(), "discovery finished");
    Ok(modules)
}

/// A running polling pipeline and its entity set.
///
/// This is the explicit handle the presentation layer holds; there is no
/// global registry. Dropping it stops the poll timer.
#[derive(Debug)]
pub struct Integration {
    coordinator: Arc<Coordinator>,
    entities: Vec<Entity>,
}

impl Integration {
    /// Builds and starts a polling pipeline from a validated config.
    ///
    /// Resolves room names, runs the mandatory first poll cycle, builds the
    /// entity set, and starts the timer. A first-cycle failure aborts setup
    /// so no entities exist over a never-populated snapshot.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, a missing/rejected token, or a
    /// failed first poll cycle.
    pub async fn start(config: Config) -> Result<Self> {
        let client = IotClient::new(&config.token)?;
        Self::start_with_client(client, config).await
    }

    /// Like [`start`](Self::start), but with an injected API client.
    ///
    /// Useful when the client needs a non-default base URL or is shared
    /// with a discovery step.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration or a failed first poll cycle.
    pub async fn start_with_client(client: IotClient, config: Config) -> Result<Self> {
        config.validate()?;

        let room_names = client.room_names().await?;

        let coordinator =
            Arc::new(Coordinator::new(client, &config).with_room_names(room_names));
        coordinator.first_refresh().await?;

        let entities = build_entities(&coordinator, &config);
        coordinator.start();

        Ok(Self {
            coordinator,
            entities,
        })
    }

    /// Returns the pipeline handle.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    /// Returns the entity set, in device-then-kind order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Stops the poll timer.
    pub fn shutdown(&self) {
        self.coordinator.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str, room_name: Option<&str>) -> DiscoveredModule {
        DiscoveredModule {
            device: Device {
                id: "dev-1".to_string(),
                name: name.to_string(),
                room: None,
                properties: Vec::new(),
            },
            room_name: room_name.map(ToString::to_string),
        }
    }

    #[test]
    fn label_with_room() {
        let module = module("Станция", Some("Кухня"));
        assert_eq!(module.label(), "Станция — Кухня (dev-1)");
    }

    #[test]
    fn label_without_room() {
        let module = module("Станция", None);
        assert_eq!(module.label(), "Станция (dev-1)");
    }
}
