//! Decoding plus parsing of CP949 and UTF-8 exports.

use encoding_rs::EUC_KR;
use fitquest_core::Geolocated;
use fitquest_import::{decode, parse_bike_racks, parse_sports_facilities, SourceEncoding};

#[test]
fn test_cp949_bike_rack_export() {
    let text = "자전거보관소명,소재지도로명주소,소재지지번주소,보관대수\n\
                두정역 보관소,,충남 천안시 서북구 두정동 1,30\n";
    let (bytes, _, _) = EUC_KR.encode(text);

    let decoded = decode(&bytes, SourceEncoding::Cp949).unwrap();
    let parsed = parse_bike_racks(&decoded).unwrap();

    assert_eq!(parsed.records.len(), 1);
    let rack = &parsed.records[0];
    assert_eq!(rack.name, "두정역 보관소");
    assert_eq!(rack.geocode_address(), Some("충남 천안시 서북구 두정동 1"));
    assert!(rack.needs_geocoding());
}

#[test]
fn test_sports_export_with_bom_under_auto() {
    let mut bytes = b"\xEF\xBB\xBF".to_vec();
    bytes.extend_from_slice("위치,장소,예약정보,주소\n서북구,풋살장,전화,천안시 서북구\n".as_bytes());

    let decoded = decode(&bytes, SourceEncoding::Auto).unwrap();
    let parsed = parse_sports_facilities(&decoded).unwrap();

    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.records[0].location, "서북구");
    assert_eq!(parsed.records[0].reservation, "전화");
}
