//! Cloud hotel-management API client.
//!
//! Both endpoints are plain `GET`s authenticated by query parameters and
//! answer with a JSON envelope:
//!
//! ```text
//! GET {base}/hotel/getInfo?clientId=..&clientSecret=..&date=<unix seconds>
//!   -> {"errcode":0,"errmsg":"","hotelId":..,"hotelName":..,"hotelInfo":".."}
//!
//! GET {base}/hotel/getServerDateTime?clientId=..&clientSecret=..&date=..
//!   -> {"errcode":0,"errmsg":"","serverDateTime":1700000000000}
//! ```
//!
//! A nonzero `errcode` is an API error even with HTTP 200; a body without
//! `errcode` is rejected as undecodable. Nothing is retried here.

use crate::{CloudError, Result, cache::CredentialSource};
use chrono::{DateTime, Utc};
use hotelkey_core::{
    CloudConfig,
    constants::{CLOUD_SUCCESS_CODE, CREDENTIAL_VALIDITY_SECS},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

const HOTEL_INFO_PATH: &str = "/hotel/getInfo";
const SERVER_TIME_PATH: &str = "/hotel/getServerDateTime";

/// Hotel credential material fetched from the cloud.
///
/// The payload is opaque: it is passed verbatim to the encoder's
/// credential-bound commands and never interpreted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub hotel_id: String,
    pub hotel_name: String,
    #[serde(skip_serializing)]
    pub payload: String,
    pub fetched_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl CredentialInfo {
    /// Build credential info fetched at `fetched_at`, valid for `validity`.
    pub fn new(
        hotel_id: impl Into<String>,
        hotel_name: impl Into<String>,
        payload: impl Into<String>,
        fetched_at: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        let mut info = Self {
            hotel_id: hotel_id.into(),
            hotel_name: hotel_name.into(),
            payload: payload.into(),
            fetched_at,
            valid_until: fetched_at,
        };
        info.set_validity(validity);
        info
    }

    pub(crate) fn set_validity(&mut self, validity: Duration) {
        self.valid_until = chrono::Duration::from_std(validity)
            .ok()
            .and_then(|delta| self.fetched_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl fmt::Debug for CredentialInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInfo")
            .field("hotel_id", &self.hotel_id)
            .field("hotel_name", &self.hotel_name)
            .field("payload", &format_args!("<{} bytes>", self.payload.len()))
            .field("fetched_at", &self.fetched_at)
            .field("valid_until", &self.valid_until)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HotelInfoBody {
    hotel_id: HotelId,
    #[serde(default)]
    hotel_name: String,
    hotel_info: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTimeBody {
    server_date_time: i64,
}

/// `hotelId` arrives as a string from some regions and a number from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HotelId {
    Text(String),
    Number(i64),
}

impl From<HotelId> for String {
    fn from(id: HotelId) -> Self {
        match id {
            HotelId::Text(text) => text,
            HotelId::Number(number) => number.to_string(),
        }
    }
}

/// Client for the cloud hotel-management API.
#[derive(Debug, Clone)]
pub struct CloudClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
}

impl CloudClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    /// Returns `CloudError::Config` if credentials are missing or the HTTP
    /// client cannot be built.
    pub fn new(config: &CloudConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(CloudError::Config("base URL is empty".into()));
        }
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(CloudError::Config("client credentials are empty".into()));
        }

        let timeout = config.timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CloudError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the hotel's credential material.
    ///
    /// # Errors
    /// `Api` for a nonzero `errcode`, `Transport` for HTTP failures,
    /// `Timeout` when the configured timeout elapses, `Decode` for an
    /// unexpected body.
    pub async fn fetch_credential_info(&self) -> Result<CredentialInfo> {
        let body: HotelInfoBody = self.get(HOTEL_INFO_PATH).await?;
        let info = CredentialInfo::new(
            body.hotel_id,
            body.hotel_name,
            body.hotel_info,
            Utc::now(),
            Duration::from_secs(CREDENTIAL_VALIDITY_SECS),
        );
        debug!(hotel_id = %info.hotel_id, "Fetched hotel credentials");
        Ok(info)
    }

    /// Fetch the cloud server's clock in epoch seconds.
    ///
    /// The server reports milliseconds; the sub-second part is dropped.
    ///
    /// # Errors
    /// Same as [`CloudClient::fetch_credential_info`].
    pub async fn fetch_server_time(&self) -> Result<i64> {
        let body: ServerTimeBody = self.get(SERVER_TIME_PATH).await?;
        Ok(body.server_date_time.div_euclid(1000))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let date = Utc::now().timestamp().to_string();

        debug!(path, "Cloud request");
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("clientId", self.client_id.as_str()),
                ("clientSecret", self.client_secret.as_str()),
                ("date", date.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CloudError::from_reqwest(e.without_url(), timeout_ms))
            .inspect_err(|e| warn!(path, error = %e, "Cloud request failed"))?;

        Self::check_status(&resp)
            .inspect_err(|e| warn!(path, error = %e, "Cloud request rejected"))?;

        let body = resp
            .text()
            .await
            .map_err(|e| CloudError::from_reqwest(e.without_url(), timeout_ms))?;

        parse_envelope(&body).inspect_err(|e| warn!(path, error = %e, "Cloud response error"))
    }

    fn check_status(resp: &reqwest::Response) -> Result<()> {
        let status = resp.status();
        if !status.is_success() {
            return Err(CloudError::transport(
                Some(status.as_u16()),
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }
        Ok(())
    }
}

impl CredentialSource for CloudClient {
    async fn fetch_credential_info(&self) -> Result<CredentialInfo> {
        CloudClient::fetch_credential_info(self).await
    }
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| CloudError::Decode(e.to_string()))?;

    let envelope =
        Envelope::deserialize(&value).map_err(|e| CloudError::Decode(e.to_string()))?;
    if envelope.errcode != CLOUD_SUCCESS_CODE {
        return Err(CloudError::api(envelope.errcode, envelope.errmsg));
    }

    T::deserialize(&value).map_err(|e| CloudError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_with_numeric_hotel_id() {
        let body: HotelInfoBody = parse_envelope(
            r#"{"errcode":0,"errmsg":"","hotelId":1234,"hotelName":"Sea View","hotelInfo":"abc"}"#,
        )
        .unwrap();
        assert_eq!(String::from(body.hotel_id), "1234");
        assert_eq!(body.hotel_name, "Sea View");
        assert_eq!(body.hotel_info, "abc");
    }

    #[test]
    fn test_envelope_without_errcode_is_rejected() {
        assert!(matches!(
            parse_envelope::<ServerTimeBody>(r#"{"serverDateTime":1700000000123}"#),
            Err(CloudError::Decode(_))
        ));
        let body: ServerTimeBody =
            parse_envelope(r#"{"errcode":0,"serverDateTime":1700000000123}"#).unwrap();
        assert_eq!(body.server_date_time, 1_700_000_000_123);
    }

    #[test]
    fn test_envelope_errcode() {
        let err =
            parse_envelope::<ServerTimeBody>(r#"{"errcode":-3,"errmsg":"Invalid Parameter"}"#)
                .unwrap_err();
        assert!(
            matches!(err, CloudError::Api { code: -3, ref message } if message == "Invalid Parameter")
        );
    }

    #[test]
    fn test_envelope_decode_errors() {
        assert!(matches!(
            parse_envelope::<ServerTimeBody>("<html>"),
            Err(CloudError::Decode(_))
        ));
        assert!(matches!(
            parse_envelope::<HotelInfoBody>(r#"{"errcode":0,"hotelId":"7"}"#),
            Err(CloudError::Decode(_))
        ));
    }

    #[test]
    fn test_client_requires_credentials() {
        let config = CloudConfig::new("", "");
        assert!(matches!(CloudClient::new(&config), Err(CloudError::Config(_))));
    }

    #[test]
    fn test_credential_debug_hides_payload() {
        let info = CredentialInfo::new(
            "1",
            "Hotel",
            "SECRET-PAYLOAD",
            Utc::now(),
            Duration::from_secs(600),
        );
        let debug = format!("{info:?}");
        assert!(!debug.contains("SECRET-PAYLOAD"));
        assert_eq!(info.valid_until - info.fetched_at, chrono::Duration::minutes(10));
    }
}
