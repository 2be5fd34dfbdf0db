//! Kakao Local address-search geocoder.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use fitquest_core::defaults::{GEOCODE_TIMEOUT_SECS, KAKAO_BASE_URL};
use fitquest_core::{Coordinates, Error, Geocoder, Result};

/// Path of the address search endpoint, relative to the base URL.
pub const ADDRESS_SEARCH_PATH: &str = "/v2/local/search/address.json";

/// Kakao geocoder configuration.
#[derive(Debug, Clone)]
pub struct KakaoConfig {
    pub base_url: String,
    /// REST API key, sent as `Authorization: KakaoAK {key}`.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl KakaoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: KAKAO_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_secs: GEOCODE_TIMEOUT_SECS,
        }
    }

    /// Read `KAKAO_API_KEY`, `KAKAO_BASE_URL` and `GEOCODE_TIMEOUT_SECS`.
    ///
    /// Returns `None` when no API key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("KAKAO_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let base_url =
            std::env::var("KAKAO_BASE_URL").unwrap_or_else(|_| KAKAO_BASE_URL.to_string());
        let timeout_secs = std::env::var("GEOCODE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(GEOCODE_TIMEOUT_SECS);

        Some(Self {
            base_url,
            api_key,
            timeout_secs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AddressSearchResponse {
    meta: SearchMeta,
    #[serde(default)]
    documents: Vec<AddressDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    total_count: u64,
}

/// Kakao returns coordinates as decimal strings: `x` is longitude, `y` latitude.
#[derive(Debug, Deserialize)]
struct AddressDocument {
    x: String,
    y: String,
}

/// Extract the first match from an address-search response body.
pub fn parse_address_search(body: &str) -> Result<Option<Coordinates>> {
    let response: AddressSearchResponse = serde_json::from_str(body)?;
    if response.meta.total_count == 0 {
        return Ok(None);
    }
    let Some(first) = response.documents.first() else {
        return Ok(None);
    };

    let latitude = first
        .y
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Geocoding(format!("invalid latitude '{}'", first.y)))?;
    let longitude = first
        .x
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Geocoding(format!("invalid longitude '{}'", first.x)))?;

    Ok(Some(Coordinates::new(latitude, longitude)))
}

/// Geocoder backed by the Kakao Local API.
pub struct KakaoGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl KakaoGeocoder {
    pub fn new(config: KakaoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "geocode",
            component = "kakao",
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "Initializing Kakao geocoder"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl Geocoder for KakaoGeocoder {
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url, ADDRESS_SEARCH_PATH);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(&[("query", address)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Geocoding(format!(
                "Kakao address search returned {}: {}",
                status, body
            )));
        }

        let coords = parse_address_search(&body)?;
        debug!(
            subsystem = "geocode",
            component = "kakao",
            op = "lookup",
            matched = coords.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Address lookup finished"
        );
        Ok(coords)
    }

    fn provider(&self) -> &str {
        "kakao"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_document() {
        let body = r#"{
            "meta": {"total_count": 2, "pageable_count": 2, "is_end": true},
            "documents": [
                {"address_name": "충남 천안시 서북구 번영로 208", "x": "127.1139", "y": "36.8151"},
                {"address_name": "other", "x": "0", "y": "0"}
            ]
        }"#;
        let coords = parse_address_search(body).unwrap().unwrap();
        assert_eq!(coords, Coordinates::new(36.8151, 127.1139));
    }

    #[test]
    fn test_parse_zero_matches() {
        let body = r#"{"meta": {"total_count": 0}, "documents": []}"#;
        assert!(parse_address_search(body).unwrap().is_none());
    }

    #[test]
    fn test_parse_bad_coordinate_is_error() {
        let body = r#"{"meta": {"total_count": 1}, "documents": [{"x": "east", "y": "36.8"}]}"#;
        assert!(matches!(
            parse_address_search(body),
            Err(Error::Geocoding(_))
        ));
    }

    #[test]
    fn test_parse_malformed_json_is_error() {
        assert!(parse_address_search("not json").is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = KakaoConfig::new("key");
        assert_eq!(config.base_url, KAKAO_BASE_URL);
        assert_eq!(config.timeout_secs, GEOCODE_TIMEOUT_SECS);
    }
}
