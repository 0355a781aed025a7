// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authenticated client for the Yandex Smart Home REST API.
//!
//! The API has no public list-devices endpoint; device ids are collected from
//! `GET /user/info`, which may report them as a flat device list, a
//! room-to-ids mapping, or both. Per-device detail comes from
//! `GET /devices/{id}`.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::device::{Device, Property};
use crate::error::{Error, Result};

/// Base URL of the Yandex IoT API.
pub const DEFAULT_BASE_URL: &str = "https://api.iot.yandex.net/v1.0";

/// Per-request timeout, fixed for the lifetime of a client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Maximum number of response-body characters carried in error messages.
const ERROR_BODY_LIMIT: usize = 300;

/// Normalizes a bearer token: trims whitespace and strips any
/// case-insensitive `"Bearer "` prefix. Idempotent.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    let token = token.trim();
    match token.split_once(char::is_whitespace) {
        Some((prefix, rest)) if prefix.eq_ignore_ascii_case("bearer") => {
            rest.trim().to_string()
        }
        _ => token.to_string(),
    }
}

/// Truncates a response body for inclusion in an error message.
fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Payload of `GET /user/info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    /// Remote status field; anything but `"ok"` is an error.
    #[serde(default)]
    pub status: Option<String>,

    /// Flat list of devices, present in newer payloads.
    #[serde(default)]
    pub devices: Vec<DeviceRef>,

    /// Room groupings, present in some payloads.
    #[serde(default)]
    pub rooms: Vec<Room>,
}

impl UserInfo {
    /// Collects all device ids, de-duplicated preserving first occurrence.
    ///
    /// The flat device list is scanned first, then room groupings; entries
    /// without an id and empty ids are skipped.
    #[must_use]
    pub fn device_ids(&self) -> Vec<String> {
        let flat = self.devices.iter().filter_map(|device| device.id.as_deref());
        let grouped = self
            .rooms
            .iter()
            .flat_map(|room| room.devices.iter().map(String::as_str));

        let mut out: Vec<String> = Vec::new();
        for id in flat.chain(grouped) {
            if !id.is_empty() && !out.iter().any(|seen| seen == id) {
                out.push(id.to_string());
            }
        }
        out
    }

    /// Collects the room id to room name map.
    #[must_use]
    pub fn room_names(&self) -> HashMap<String, String> {
        self.rooms
            .iter()
            .filter_map(|room| Some((room.id.clone()?, room.name.clone()?)))
            .collect()
    }
}

/// A device reference inside the `/user/info` device list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceRef {
    /// The device id; entries without one are skipped.
    #[serde(default)]
    pub id: Option<String>,
}

/// A room grouping inside the `/user/info` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Room {
    /// The room id.
    #[serde(default)]
    pub id: Option<String>,

    /// The room's display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Ids of the devices assigned to this room.
    #[serde(default)]
    pub devices: Vec<String>,
}

/// Payload of `GET /devices/{id}`.
#[derive(Debug, Clone, Deserialize)]
struct DevicePayload {
    #[serde(default)]
    status: Option<String>,
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    room: Option<String>,
    #[serde(default)]
    properties: Vec<Property>,
}

/// Client for the Yandex IoT API.
///
/// Holds the normalized token and a pooled HTTP transport with a fixed
/// request timeout. Cloning is cheap and clones share the connection pool,
/// so one client can serve concurrent fetches.
///
/// # Examples
///
/// ```no_run
/// use yandex_climate::IotClient;
///
/// # async fn example() -> yandex_climate::Result<()> {
/// let client = IotClient::new("Bearer y0_AgAAA...")?;
/// client.validate_token().await?;
/// for id in client.list_device_ids().await? {
///     let device = client.get_device(&id).await?;
///     println!("{}: {} properties", device.name, device.properties.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IotClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl IotClient {
    /// Creates a client for the given OAuth token.
    ///
    /// The token is normalized before use (whitespace trimmed, any
    /// `"Bearer "` prefix stripped).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingToken`] if the normalized token is empty, or
    /// [`Error::Http`] if the HTTP transport cannot be created.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let token = normalize_token(token.as_ref());
        if token.is_empty() {
            return Err(Error::MissingToken);
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token,
            http,
        })
    }

    /// Overrides the API base URL. Intended for tests and proxies.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Returns the base URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues an authenticated GET and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);

        tracing::debug!(url = %url, "sending GET request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth(truncate_body(&body)));
        }
        if status == StatusCode::FORBIDDEN {
            return Err(Error::Permission(truncate_body(&body)));
        }
        if status.as_u16() >= 400 {
            return Err(Error::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|err| Error::Json {
            message: err.to_string(),
            body: truncate_body(&body),
        })
    }

    /// Fetches `GET /user/info`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedPayload`] if the remote status field is
    /// anything but `"ok"`, or the underlying request error.
    pub async fn user_info(&self) -> Result<UserInfo> {
        let info: UserInfo = self.get_json("/user/info").await?;
        if info.status.as_deref() != Some("ok") {
            return Err(Error::UnexpectedPayload(format!(
                "status = {:?}",
                info.status
            )));
        }
        Ok(info)
    }

    /// Performs a lightweight authenticated call to check the token.
    ///
    /// # Errors
    ///
    /// Fails with the same errors as [`user_info`](Self::user_info); the
    /// error's [`kind`](Error::kind) distinguishes 401, 403, and generic
    /// API failures.
    pub async fn validate_token(&self) -> Result<()> {
        self.user_info().await.map(|_| ())
    }

    /// Returns all device ids visible to the token.
    ///
    /// Ids are collected from the flat device list first, then from room
    /// groupings, de-duplicated preserving first occurrence. Entries without
    /// an id are skipped.
    ///
    /// # Errors
    ///
    /// Fails with the same errors as [`user_info`](Self::user_info).
    pub async fn list_device_ids(&self) -> Result<Vec<String>> {
        Ok(self.user_info().await?.device_ids())
    }

    /// Returns the room id to room name mapping from `/user/info`.
    ///
    /// # Errors
    ///
    /// Fails with the same errors as [`user_info`](Self::user_info).
    pub async fn room_names(&self) -> Result<HashMap<String, String>> {
        Ok(self.user_info().await?.room_names())
    }

    /// Fetches one device's full detail.
    ///
    /// The device name falls back to the requested id when the API omits it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedPayload`] if the remote status field is
    /// anything but `"ok"`, or the underlying request error.
    pub async fn get_device(&self, device_id: &str) -> Result<Device> {
        let payload: DevicePayload = self.get_json(&format!("/devices/{device_id}")).await?;
        if payload.status.as_deref() != Some("ok") {
            return Err(Error::UnexpectedPayload(format!(
                "status = {:?} for device {device_id}",
                payload.status
            )));
        }

        Ok(Device {
            id: payload.id,
            name: payload
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| device_id.to_string()),
            room: payload.room,
            properties: payload.properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_bearer_prefix() {
        assert_eq!(normalize_token("Bearer  abc "), "abc");
        assert_eq!(normalize_token("bearer abc"), "abc");
        assert_eq!(normalize_token(" abc "), "abc");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["Bearer  abc ", " abc ", "abc", "BEARER\tabc"] {
            let once = normalize_token(raw);
            assert_eq!(normalize_token(&once), once);
        }
    }

    #[test]
    fn normalize_keeps_bearer_like_tokens() {
        // A token that merely starts with the letters "bearer" is untouched.
        assert_eq!(normalize_token("bearerabc"), "bearerabc");
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(IotClient::new(""), Err(Error::MissingToken)));
        assert!(matches!(IotClient::new("   "), Err(Error::MissingToken)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = IotClient::new("abc")
            .unwrap()
            .with_base_url("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");
    }

    #[test]
    fn truncate_body_limits_length() {
        let body = "x".repeat(1000);
        assert_eq!(truncate_body(&body).len(), 300);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn collect_ids_unions_both_shapes() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "devices": [{"id": "a"}, {"id": "b"}, {}],
            "rooms": [
                {"id": "r1", "name": "Kitchen", "devices": ["b", "c"]},
                {"id": "r2", "name": "Bedroom", "devices": ["", "a"]}
            ]
        }))
        .unwrap();

        assert_eq!(info.device_ids(), ["a", "b", "c"]);
    }

    #[test]
    fn collect_room_names_skips_incomplete_rooms() {
        let info: UserInfo = serde_json::from_value(serde_json::json!({
            "status": "ok",
            "rooms": [
                {"id": "r1", "name": "Kitchen", "devices": []},
                {"id": "r2", "devices": []},
                {"name": "Orphan", "devices": []}
            ]
        }))
        .unwrap();

        let names = info.room_names();
        assert_eq!(names.len(), 1);
        assert_eq!(names.get("r1").map(String::as_str), Some("Kitchen"));
    }
}
