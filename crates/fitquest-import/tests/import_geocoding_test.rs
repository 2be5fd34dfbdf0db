//! Imports geocode parsed records whenever a provider is configured.

use std::sync::Arc;

use fitquest_core::{Coordinates, Geolocated};
use fitquest_geocode::{KakaoConfig, KakaoGeocoder};
use fitquest_import::{geocode_records, import_geocoder, parse_places};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLACES_CSV: &str = "명칭,주소,주요시설,문의처\n\
                          천안종합운동장,충남 천안시 서북구 번영로 208,축구장+육상트랙,041-000-0000\n\
                          주소없는공원,,산책로,\n";

fn kakao_for(server: &MockServer) -> Arc<KakaoGeocoder> {
    Arc::new(
        KakaoGeocoder::new(KakaoConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
        })
        .expect("Failed to create geocoder"),
    )
}

#[tokio::test]
async fn test_configured_geocoder_fills_imported_places() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/local/search/address.json"))
        .and(query_param("query", "충남 천안시 서북구 번영로 208"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "meta": {"total_count": 1},
            "documents": [{"x": "127.1139", "y": "36.8151"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut parsed = parse_places(PLACES_CSV).unwrap();
    let geocoder = import_geocoder(false, kakao_for(&server)).expect("geocoding enabled");

    let filled = geocode_records(Some(geocoder.as_ref()), &mut parsed.records, 0.0).await;

    assert_eq!(filled, 1);
    assert_eq!(
        parsed.records[0].coordinates(),
        Some(Coordinates::new(36.8151, 127.1139))
    );
    // No address, nothing to look up.
    assert_eq!(parsed.records[1].coordinates(), None);
}

#[tokio::test]
async fn test_no_geocode_flag_leaves_coordinates_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut parsed = parse_places(PLACES_CSV).unwrap();
    let geocoder = import_geocoder(true, kakao_for(&server));
    assert!(geocoder.is_none());

    let filled = geocode_records(geocoder.as_deref(), &mut parsed.records, 0.0).await;
    assert_eq!(filled, 0);
    assert!(parsed.records[0].needs_geocoding());
}
