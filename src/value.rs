// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value extraction and formatting for device properties.
//!
//! Lookup is first-match over the property sequence; a missing property or
//! value yields `None`, never zero. Rounding uses [`f64::round`] semantics
//! (half away from zero): one decimal for temperature and humidity, whole
//! numbers for CO2. Values of unrecognized instances pass through raw.

use chrono::{DateTime, Utc};

use crate::device::{Property, SensorKind};

/// A formatted, externally visible sensor value.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    /// A measurement rounded to one decimal place (temperature, humidity).
    Measurement(f64),
    /// A whole-number reading (CO2 ppm).
    Count(i64),
    /// A derived UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// A raw value passed through unformatted.
    Raw(serde_json::Value),
}

/// Returns the first property whose instance tag equals `instance`.
#[must_use]
pub fn find_property<'a>(properties: &'a [Property], instance: &str) -> Option<&'a Property> {
    properties
        .iter()
        .find(|property| property.instance() == Some(instance))
}

/// Computes the formatted value for the requested instance.
///
/// Returns `None` when no property matches or the matching property carries
/// no value. Formatting applies only when the raw value is numeric; numeric
/// values of unknown instances and non-numeric values pass through as
/// [`EntityValue::Raw`].
#[must_use]
pub fn instance_value(properties: &[Property], instance: &str) -> Option<EntityValue> {
    let raw = find_property(properties, instance)?.value()?;

    let Some(kind) = SensorKind::from_instance(instance) else {
        return Some(EntityValue::Raw(raw.clone()));
    };
    match raw.as_f64() {
        Some(value) => Some(format_value(kind, value)),
        None => Some(EntityValue::Raw(raw.clone())),
    }
}

/// Applies the per-kind rounding rule to a numeric reading.
#[must_use]
pub fn format_value(kind: SensorKind, value: f64) -> EntityValue {
    match kind {
        SensorKind::Temperature | SensorKind::Humidity => {
            EntityValue::Measurement((value * 10.0).round() / 10.0)
        }
        #[allow(clippy::cast_possible_truncation)]
        SensorKind::Co2 => EntityValue::Count(value.round() as i64),
    }
}

/// Derives the most recent update instant across all properties.
///
/// Scans every property's `last_updated` epoch-seconds field, ignoring
/// missing and non-finite values, and returns the maximum as a UTC instant
/// (millisecond precision). Returns `None` when no usable timestamp exists.
#[must_use]
pub fn most_recent_update(properties: &[Property]) -> Option<DateTime<Utc>> {
    properties
        .iter()
        .filter_map(|property| property.last_updated)
        .filter(|seconds| seconds.is_finite())
        .reduce(f64::max)
        .and_then(epoch_to_utc)
}

/// Converts fractional epoch seconds to a UTC instant.
#[allow(clippy::cast_possible_truncation)]
fn epoch_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis((seconds * 1000.0) as i64)
}

/// Fallback device name used when a device is absent from the snapshot.
pub const FALLBACK_DEVICE_NAME: &str = "Yandex Climate Module";

/// The generic placeholder name some devices report.
const PLACEHOLDER_NAME: &str = "умное устройство";

/// Human-friendly replacement for the placeholder name.
const PLACEHOLDER_REPLACEMENT: &str = "Климатическая станция";

/// Derives a device's display name.
///
/// The remote name goes through one hardcoded localized substitution (the
/// provider's generic placeholder maps to a friendlier fallback), then gets
/// an optional room suffix and a parenthesized tail of the device id. Purely
/// cosmetic: uniqueness comes from entity ids, not from this string.
#[must_use]
pub fn device_display_name(name: &str, room: Option<&str>, device_id: &str) -> String {
    let base = if name.trim().to_lowercase() == PLACEHOLDER_NAME {
        PLACEHOLDER_REPLACEMENT
    } else {
        name
    };

    let tail = id_tail(device_id);
    match room {
        Some(room) => format!("{base} {room} ({tail})"),
        None => format!("{base} ({tail})"),
    }
}

/// Returns the last five characters of a device id.
fn id_tail(device_id: &str) -> &str {
    let skip = device_id.chars().count().saturating_sub(5);
    match device_id.char_indices().nth(skip) {
        Some((offset, _)) => &device_id[offset..],
        None => device_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PropertyState;
    use serde_json::json;

    fn prop(instance: &str, value: serde_json::Value) -> Property {
        Property {
            state: Some(PropertyState {
                instance: Some(instance.to_string()),
                value: Some(value),
            }),
            last_updated: None,
        }
    }

    #[test]
    fn temperature_rounds_to_one_decimal() {
        let props = [prop("temperature", json!(21.36))];
        assert_eq!(
            instance_value(&props, "temperature"),
            Some(EntityValue::Measurement(21.4))
        );
    }

    #[test]
    fn humidity_rounds_to_one_decimal() {
        let props = [prop("humidity", json!(55.04))];
        assert_eq!(
            instance_value(&props, "humidity"),
            Some(EntityValue::Measurement(55.0))
        );
    }

    #[test]
    fn co2_rounds_to_whole_number() {
        let props = [prop("co2_level", json!(812.6))];
        assert_eq!(
            instance_value(&props, "co2_level"),
            Some(EntityValue::Count(813))
        );
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        let props = [prop("temperature", json!(21.25))];
        assert_eq!(
            instance_value(&props, "temperature"),
            Some(EntityValue::Measurement(21.3))
        );
        let props = [prop("temperature", json!(-21.25))];
        assert_eq!(
            instance_value(&props, "temperature"),
            Some(EntityValue::Measurement(-21.3))
        );
    }

    #[test]
    fn missing_property_yields_none() {
        let props = [prop("humidity", json!(55.0))];
        assert_eq!(instance_value(&props, "temperature"), None);
    }

    #[test]
    fn missing_value_yields_none_not_zero() {
        let props = [Property {
            state: Some(PropertyState {
                instance: Some("temperature".to_string()),
                value: None,
            }),
            last_updated: None,
        }];
        assert_eq!(instance_value(&props, "temperature"), None);
    }

    #[test]
    fn unknown_instance_passes_raw_value_through() {
        let props = [prop("battery_level", json!(87.5))];
        assert_eq!(
            instance_value(&props, "battery_level"),
            Some(EntityValue::Raw(json!(87.5)))
        );
    }

    #[test]
    fn non_numeric_value_passes_through() {
        let props = [prop("temperature", json!("warm"))];
        assert_eq!(
            instance_value(&props, "temperature"),
            Some(EntityValue::Raw(json!("warm")))
        );
    }

    #[test]
    fn first_match_wins_on_duplicate_instances() {
        let props = [
            prop("temperature", json!(20.0)),
            prop("temperature", json!(25.0)),
        ];
        assert_eq!(
            instance_value(&props, "temperature"),
            Some(EntityValue::Measurement(20.0))
        );
    }

    #[test]
    fn most_recent_update_takes_maximum() {
        let props = [
            Property {
                state: None,
                last_updated: Some(100.0),
            },
            Property {
                state: None,
                last_updated: Some(250.0),
            },
            Property {
                state: None,
                last_updated: Some(80.0),
            },
        ];
        let expected = DateTime::from_timestamp_millis(250_000).unwrap();
        assert_eq!(most_recent_update(&props), Some(expected));
    }

    #[test]
    fn most_recent_update_absent_without_timestamps() {
        let props = [prop("temperature", json!(21.0)), Property::default()];
        assert_eq!(most_recent_update(&props), None);
    }

    #[test]
    fn most_recent_update_ignores_non_finite() {
        let props = [
            Property {
                state: None,
                last_updated: Some(f64::NAN),
            },
            Property {
                state: None,
                last_updated: Some(100.5),
            },
        ];
        let expected = DateTime::from_timestamp_millis(100_500).unwrap();
        assert_eq!(most_recent_update(&props), Some(expected));
    }

    #[test]
    fn display_name_substitutes_placeholder() {
        let name = device_display_name("Умное устройство", None, "abcdef123");
        assert_eq!(name, "Климатическая станция (ef123)");
    }

    #[test]
    fn display_name_with_room_and_tail() {
        let name = device_display_name("Станция", Some("Спальня"), "device-00042");
        assert_eq!(name, "Станция Спальня (00042)");
    }

    #[test]
    fn display_name_short_id_keeps_whole_id() {
        let name = device_display_name("Станция", None, "ab");
        assert_eq!(name, "Станция (ab)");
    }
}
