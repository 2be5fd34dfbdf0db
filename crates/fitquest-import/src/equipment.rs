//! Outdoor exercise equipment from the public open-data API.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use fitquest_core::defaults::{EQUIPMENT_API_URL, EQUIPMENT_PAGE_SIZE, EQUIPMENT_SLOTS};
use fitquest_core::{Error, OutdoorEquipment, Result};

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Placeholder facility name the feed emits for template rows.
const DUMMY_NAME: &str = "string";

/// Open-data endpoint settings.
#[derive(Debug, Clone)]
pub struct EquipmentSourceConfig {
    pub url: String,
    pub service_key: String,
    pub page_size: u32,
}

impl EquipmentSourceConfig {
    /// Read `EQUIPMENT_API_URL` and `EQUIPMENT_SERVICE_KEY`.
    pub fn from_env() -> Result<Self> {
        let service_key = std::env::var("EQUIPMENT_SERVICE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("EQUIPMENT_SERVICE_KEY is not set".to_string()))?;
        let url =
            std::env::var("EQUIPMENT_API_URL").unwrap_or_else(|_| EQUIPMENT_API_URL.to_string());

        Ok(Self {
            url,
            service_key,
            page_size: EQUIPMENT_PAGE_SIZE,
        })
    }
}

/// Client for the equipment dataset.
pub struct EquipmentSource {
    client: Client,
    config: EquipmentSourceConfig,
}

impl EquipmentSource {
    pub fn new(config: EquipmentSourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Fetch the first page of raw items.
    pub async fn fetch(&self) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(&self.config.url)
            .query(&[
                ("page", "1".to_string()),
                ("perPage", self.config.page_size.to_string()),
                ("returnType", "JSON".to_string()),
                ("serviceKey", self.config.service_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "equipment API returned {}: {}",
                status, body
            )));
        }

        let body: Value = response.json().await?;
        let items = match body.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        info!(
            subsystem = "import",
            component = "equipment",
            op = "fetch",
            result_count = items.len(),
            "Equipment items fetched"
        );
        Ok(items)
    }
}

fn non_blank(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

/// Convert one feed item. Items without a facility name, or with the
/// placeholder name, yield `None`.
pub fn equipment_from_item(item: &Value) -> Option<OutdoorEquipment> {
    let name = item.get("시설명")?.as_str()?.trim();
    if name.is_empty() || name == DUMMY_NAME {
        return None;
    }

    let mut info = Map::new();
    for slot in 1..=EQUIPMENT_SLOTS {
        let name_key = format!("운동기구{}", slot);
        let count_key = format!("운동기구{} 개수", slot);
        if let Some(equipment) = non_blank(item.get(&name_key)) {
            info.insert(name_key, equipment.clone());
            let count = item.get(&count_key).cloned().unwrap_or(Value::from(0));
            info.insert(count_key, count);
        }
    }

    let address = item
        .get("소재지")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    Some(OutdoorEquipment {
        id: Uuid::nil(),
        name: name.to_string(),
        address,
        equipment_info: Value::Object(info),
        latitude: None,
        longitude: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equipment_from_item_collects_slots() {
        let item = json!({
            "시설명": "쌍용공원",
            "소재지": "충남 천안시 서북구 쌍용동 1",
            "운동기구1": "거꾸리",
            "운동기구1 개수": 2,
            "운동기구2": "",
            "운동기구2 개수": 0,
            "운동기구3": "허리돌리기",
        });
        let equipment = equipment_from_item(&item).unwrap();
        assert_eq!(equipment.name, "쌍용공원");
        assert_eq!(equipment.address, "충남 천안시 서북구 쌍용동 1");
        assert_eq!(
            equipment.equipment_info,
            json!({
                "운동기구1": "거꾸리",
                "운동기구1 개수": 2,
                "운동기구3": "허리돌리기",
                "운동기구3 개수": 0,
            })
        );
    }

    #[test]
    fn test_equipment_from_item_skips_placeholder_and_missing_name() {
        assert!(equipment_from_item(&json!({"시설명": "string"})).is_none());
        assert!(equipment_from_item(&json!({"시설명": "  "})).is_none());
        assert!(equipment_from_item(&json!({"소재지": "천안시"})).is_none());
    }

    #[test]
    fn test_equipment_from_item_without_address() {
        let equipment = equipment_from_item(&json!({"시설명": "공원"})).unwrap();
        assert_eq!(equipment.address, "");
        assert_eq!(equipment.equipment_info, json!({}));
    }
}
