// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value-bearing entities exposed to the presentation layer.
//!
//! Each configured device yields one entity per recognized sensor instance
//! plus an optional diagnostic last-updated entity. Entities are thin reads
//! over the coordinator's latest snapshot: they carry no state of their own
//! and become unavailable, not erroring, when their device is absent.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::coordinator::{Coordinator, CoordinatorEvent};
use crate::device::SensorKind;
use crate::value::{self, EntityValue, FALLBACK_DEVICE_NAME};

/// Suffix and key of the derived last-updated entity.
const LAST_UPDATED_KEY: &str = "last_updated";

/// The closed set of entity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A sensor reading one property instance.
    Sensor(SensorKind),
    /// The derived most-recent-update timestamp, a diagnostic entity.
    LastUpdated,
}

impl EntityKind {
    /// Returns the key used in the entity's unique id.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Sensor(kind) => kind.instance(),
            Self::LastUpdated => LAST_UPDATED_KEY,
        }
    }

    /// Returns the human-readable title suffix.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Sensor(kind) => kind.title(),
            Self::LastUpdated => "Last Updated",
        }
    }
}

/// One externally visible sensor value of one device.
#[derive(Debug, Clone)]
pub struct Entity {
    coordinator: Arc<Coordinator>,
    device_id: String,
    kind: EntityKind,
}

impl Entity {
    /// Creates an entity reading from the given coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, device_id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            coordinator,
            device_id: device_id.into(),
            kind,
        }
    }

    /// Returns the id of the device this entity reads from.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the entity's kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the stable unique id, `{device_id}_{key}`.
    ///
    /// This is the identity the presentation layer must key on; display
    /// names carry no uniqueness guarantee.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.device_id, self.kind.key())
    }

    /// Returns `true` if the device appeared in the latest snapshot.
    #[must_use]
    pub fn available(&self) -> bool {
        self.coordinator.device_available(&self.device_id)
    }

    /// Returns the current formatted value, or `None` when absent.
    #[must_use]
    pub fn value(&self) -> Option<EntityValue> {
        let device = self.coordinator.device(&self.device_id)?;
        match self.kind {
            EntityKind::Sensor(kind) => {
                value::instance_value(&device.properties, kind.instance())
            }
            EntityKind::LastUpdated => {
                value::most_recent_update(&device.properties).map(EntityValue::Timestamp)
            }
        }
    }

    /// Returns the unit of measurement, if the entity has one.
    #[must_use]
    pub fn unit(&self) -> Option<&'static str> {
        match self.kind {
            EntityKind::Sensor(kind) => Some(kind.unit()),
            EntityKind::LastUpdated => None,
        }
    }

    /// Returns `true` for diagnostic entities.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(self.kind, EntityKind::LastUpdated)
    }

    /// Derives the display name from the latest snapshot.
    ///
    /// The device part uses the remote name (with the placeholder
    /// substitution), the resolved room name when known, and the id tail;
    /// the entity's title is appended. Falls back to a generic device name
    /// while the device is absent from the snapshot.
    #[must_use]
    pub fn display_name(&self) -> String {
        let device = self.coordinator.device(&self.device_id);

        let name = device
            .as_ref()
            .map_or(FALLBACK_DEVICE_NAME, |device| device.name.as_str());
        let room = device.as_ref().and_then(|device| {
            let room = device.room.as_deref()?;
            Some(self.coordinator.room_name(room).unwrap_or(room).to_string())
        });

        let device_name = value::device_display_name(name, room.as_deref(), &self.device_id);
        format!("{device_name} {}", self.kind.title())
    }

    /// Subscribes to snapshot replacement notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.coordinator.subscribe()
    }
}

/// Builds the entity set for every configured device.
///
/// Each device gets one entity per recognized sensor kind, plus the
/// diagnostic last-updated entity when `config.enable_last_updated` is set.
#[must_use]
pub fn build_entities(coordinator: &Arc<Coordinator>, config: &Config) -> Vec<Entity> {
    let mut entities = Vec::new();
    for device_id in &config.device_ids {
        for kind in SensorKind::ALL {
            entities.push(Entity::new(
                Arc::clone(coordinator),
                device_id,
                EntityKind::Sensor(kind),
            ));
        }
        if config.enable_last_updated {
            entities.push(Entity::new(
                Arc::clone(coordinator),
                device_id,
                EntityKind::LastUpdated,
            ));
        }
    }
    entities
}
