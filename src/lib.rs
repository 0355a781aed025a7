// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `yandex_climate` - A Rust library for Yandex Smart Home climate modules.
//!
//! This library polls the Yandex IoT REST API for a fixed set of registered
//! devices, extracts climate sensor readings (temperature, humidity, CO2),
//! and exposes them as typed entities with availability semantics for a
//! home-automation presentation layer.
//!
//! # How it works
//!
//! - **Client**: authenticated GETs against `/user/info` and
//!   `/devices/{id}`, with a typed error taxonomy (401, 403, generic).
//! - **Classifier**: a device is a climate module iff it exposes all three
//!   required property instances.
//! - **Coordinator**: a timer fetches all configured devices concurrently;
//!   a cycle either replaces the whole snapshot or keeps the old one.
//! - **Entities**: per-device sensor values plus a derived last-updated
//!   timestamp, read lazily from the latest snapshot.
//!
//! # Quick Start
//!
//! ```no_run
//! use yandex_climate::{Config, Integration, discover_climate_modules, IotClient};
//!
//! #[tokio::main]
//! async fn main() -> yandex_climate::Result<()> {
//!     // Discover which devices qualify as climate modules.
//!     let client = IotClient::new("y0_AgAAA...")?;
//!     let modules = discover_climate_modules(&client).await?;
//!     for module in &modules {
//!         println!("found: {}", module.label());
//!     }
//!
//!     // Poll the selected devices.
//!     let device_ids = modules.iter().map(|m| m.device.id.clone()).collect();
//!     let integration = Integration::start(Config::new("y0_AgAAA...", device_ids)).await?;
//!
//!     for entity in integration.entities() {
//!         println!("{}: {:?}", entity.unique_id(), entity.value());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Watching for updates
//!
//! ```ignore
//! let mut events = integration.coordinator().subscribe();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         CoordinatorEvent::SnapshotUpdated => { /* re-render entities */ }
//!         CoordinatorEvent::RefreshFailed { message } => { /* log */ }
//!     }
//! }
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod entity;
pub mod error;
pub mod setup;
pub mod value;

pub use client::{DEFAULT_BASE_URL, IotClient, UserInfo, normalize_token};
pub use config::{
    Config, DEFAULT_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL, MIN_UPDATE_INTERVAL,
};
pub use coordinator::{Coordinator, CoordinatorEvent, Snapshot};
pub use device::{Device, Property, PropertyState, SensorKind};
pub use entity::{Entity, EntityKind, build_entities};
pub use error::{Error, ErrorKind, Result};
pub use setup::{DiscoveredModule, Integration, discover_climate_modules};
pub use value::{EntityValue, device_display_name, instance_value, most_recent_update};
