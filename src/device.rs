// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and property types for the Yandex Smart Home API.
//!
//! A [`Device`] is a fresh value produced on every fetch; it is never mutated
//! in place. Its properties carry sensor readings in the provider's wire
//! shape: the capability tag (`instance`) and the raw value live in a nested
//! `state` object, while the update timestamp lives on the property itself.

use serde::Deserialize;

/// A climate sensor kind recognized by this library.
///
/// This is the closed set of property instances a device must expose to
/// qualify as a climate module, plus the formatting rules for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    /// Air temperature, reported in °C.
    Temperature,
    /// Relative humidity, reported in %.
    Humidity,
    /// CO2 concentration, reported in ppm.
    Co2,
}

impl SensorKind {
    /// All recognized sensor kinds. A climate module must expose every one.
    pub const ALL: [SensorKind; 3] = [Self::Temperature, Self::Humidity, Self::Co2];

    /// Returns the provider's property instance tag for this kind.
    #[must_use]
    pub fn instance(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Co2 => "co2_level",
        }
    }

    /// Returns the kind matching a property instance tag, if any.
    #[must_use]
    pub fn from_instance(instance: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.instance() == instance)
    }

    /// Returns the human-readable sensor title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Co2 => "CO2",
        }
    }

    /// Returns the unit of measurement for this kind.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Co2 => "ppm",
        }
    }
}

/// The `state` object of a device property.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PropertyState {
    /// The capability tag, e.g. `"temperature"`.
    #[serde(default)]
    pub instance: Option<String>,

    /// The raw reported value (number, string, or bool).
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// One property of a device, as reported by `GET /devices/{id}`.
///
/// All fields are optional on the wire; a property without a usable
/// `state.instance` is ignored by classification and lookup.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Property {
    /// The current state of the property.
    #[serde(default)]
    pub state: Option<PropertyState>,

    /// When the property was last updated, in epoch seconds.
    #[serde(default)]
    pub last_updated: Option<f64>,
}

impl Property {
    /// Returns the instance tag, if present and non-empty.
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.state
            .as_ref()
            .and_then(|state| state.instance.as_deref())
            .filter(|instance| !instance.is_empty())
    }

    /// Returns the raw reported value, if present.
    #[must_use]
    pub fn value(&self) -> Option<&serde_json::Value> {
        self.state.as_ref().and_then(|state| state.value.as_ref())
    }
}

/// A device as reported by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    /// Provider-assigned stable identifier.
    pub id: String,
    /// Remote-supplied name; falls back to the id when the API omits it.
    pub name: String,
    /// Room identifier, if the device is assigned to one.
    pub room: Option<String>,
    /// Properties in the order the API reported them.
    pub properties: Vec<Property>,
}

impl Device {
    /// Returns `true` if this device qualifies as a climate module.
    ///
    /// A device qualifies iff its observed instance tags are a superset of
    /// the required set (temperature, humidity, CO2). Extra instances are
    /// ignored; a device missing any required instance is rejected, as is a
    /// device with no properties at all.
    #[must_use]
    pub fn is_climate_module(&self) -> bool {
        SensorKind::ALL.iter().all(|kind| {
            self.properties
                .iter()
                .any(|prop| prop.instance() == Some(kind.instance()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(instance: &str) -> Property {
        Property {
            state: Some(PropertyState {
                instance: Some(instance.to_string()),
                value: Some(json!(1.0)),
            }),
            last_updated: None,
        }
    }

    fn device_with(instances: &[&str]) -> Device {
        Device {
            id: "dev-1".to_string(),
            name: "Module".to_string(),
            room: None,
            properties: instances.iter().map(|i| prop(i)).collect(),
        }
    }

    #[test]
    fn sensor_kind_instance_round_trip() {
        for kind in SensorKind::ALL {
            assert_eq!(SensorKind::from_instance(kind.instance()), Some(kind));
        }
        assert_eq!(SensorKind::from_instance("battery_level"), None);
    }

    #[test]
    fn all_three_instances_qualify() {
        let device = device_with(&["temperature", "humidity", "co2_level"]);
        assert!(device.is_climate_module());
    }

    #[test]
    fn extra_instances_are_ignored() {
        let device = device_with(&["temperature", "humidity", "co2_level", "battery_level"]);
        assert!(device.is_climate_module());
    }

    #[test]
    fn subset_is_rejected() {
        let device = device_with(&["temperature", "humidity"]);
        assert!(!device.is_climate_module());
    }

    #[test]
    fn no_properties_is_rejected() {
        let device = device_with(&[]);
        assert!(!device.is_climate_module());
    }

    #[test]
    fn property_without_state_is_ignored() {
        let mut device = device_with(&["temperature", "humidity"]);
        device.properties.push(Property::default());
        assert!(!device.is_climate_module());
    }

    #[test]
    fn empty_instance_tag_is_ignored() {
        let mut device = device_with(&["temperature", "humidity"]);
        device.properties.push(prop(""));
        assert!(!device.is_climate_module());
        device.properties.push(prop("co2_level"));
        assert!(device.is_climate_module());
    }

    #[test]
    fn property_deserializes_wire_shape() {
        let raw = json!({
            "type": "devices.properties.float",
            "state": {"instance": "temperature", "value": 21.36},
            "last_updated": 1_700_000_000.5
        });
        let property: Property = serde_json::from_value(raw).unwrap();
        assert_eq!(property.instance(), Some("temperature"));
        assert_eq!(property.value(), Some(&json!(21.36)));
        assert_eq!(property.last_updated, Some(1_700_000_000.5));
    }
}
