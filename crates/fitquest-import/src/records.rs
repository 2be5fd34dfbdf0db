//! CSV row parsing for each imported dataset.
//!
//! Header names are matched with all whitespace removed, so columns exported
//! as `법  인  주  소` or `기능 및 목적` are found under `법인주소` and
//! `기능및목적`. Cell values are trimmed; blank cells read as absent.

use std::collections::HashMap;

use csv::ReaderBuilder;
use tracing::trace;
use uuid::Uuid;

use fitquest_core::{BikeRack, Corporation, Error, Place, Result, SportsFacility};

/// Records parsed from one file, plus the number of rows that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// One CSV row keyed by normalized header.
struct CsvRow(HashMap<String, String>);

impl CsvRow {
    fn get(&self, header: &str) -> Option<String> {
        self.0
            .get(&normalize_header(header))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn text(&self, header: &str) -> String {
        self.get(header).unwrap_or_default()
    }

    fn is_blank(&self) -> bool {
        self.0.values().all(|v| v.trim().is_empty())
    }
}

fn read_rows(text: &str) -> Result<Vec<CsvRow>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("unreadable CSV header: {}", e)))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| Error::InvalidInput(format!("CSV row {}: {}", line + 2, e)))?;
        let map = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(CsvRow(map));
    }
    Ok(rows)
}

fn parse_with<T>(text: &str, mut convert: impl FnMut(&CsvRow) -> Option<T>) -> Result<Parsed<T>> {
    let mut parsed = Parsed::default();
    for (index, row) in read_rows(text)?.iter().enumerate() {
        match convert(row) {
            Some(record) => parsed.records.push(record),
            None => {
                trace!(subsystem = "import", row = index + 2, "Row skipped");
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

/// Places: `명칭, 주소, 주요시설, 문의처`. Rows without a name are skipped.
pub fn parse_places(text: &str) -> Result<Parsed<Place>> {
    parse_with(text, |row| {
        Some(Place {
            id: Uuid::nil(),
            name: row.get("명칭")?,
            address: row.text("주소"),
            facilities_raw: row.text("주요시설"),
            contact: row.text("문의처"),
            latitude: None,
            longitude: None,
        })
    })
}

/// Bike racks. Rows without `자전거보관소명` are skipped.
pub fn parse_bike_racks(text: &str) -> Result<Parsed<BikeRack>> {
    parse_with(text, |row| {
        Some(BikeRack {
            name: row.get("자전거보관소명")?,
            road_address: row.get("소재지도로명주소"),
            lot_address: row.get("소재지지번주소"),
            rack_count: row.get("보관대수"),
            has_air_pump: row.get("공기주입기비치여부"),
            has_repair_stand: row.get("수리대설치여부"),
            manager_phone: row.get("관리기관전화번호"),
            manager_name: row.get("관리기관명"),
            data_date: row.get("데이터기준일자"),
            ..Default::default()
        })
    })
}

/// Non-profit corporations. Rows without `법인명칭` are skipped.
pub fn parse_corporations(text: &str) -> Result<Parsed<Corporation>> {
    parse_with(text, |row| {
        Some(Corporation {
            department: row.get("실과명"),
            kind: row.get("법인종류"),
            permit_number: row.get("허가번호"),
            name: row.get("법인명칭")?,
            representative: row.get("대표자"),
            address: row.get("법인주소"),
            permit_year: row.get("허가년도"),
            officers: row.get("임원"),
            purpose: row.get("기능및목적"),
            jurisdiction: row.get("소관분야"),
            note: row.get("비고"),
            ..Default::default()
        })
    })
}

/// Sports facilities: `위치, 장소, 예약정보, 주소`. Entirely blank rows are skipped.
pub fn parse_sports_facilities(text: &str) -> Result<Parsed<SportsFacility>> {
    parse_with(text, |row| {
        if row.is_blank() {
            return None;
        }
        Some(SportsFacility {
            location: row.text("위치"),
            place: row.text("장소"),
            reservation: row.text("예약정보"),
            address: row.text("주소"),
            ..Default::default()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_places() {
        let csv = "\u{feff}명칭,주소,주요시설,문의처\n\
                   천안종합운동장,충남 천안시 서북구 번영로 208,축구장+육상트랙,041-521-0000\n\
                   ,주소만 있음,,\n";
        let parsed = parse_places(csv).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 1);
        let place = &parsed.records[0];
        assert_eq!(place.name, "천안종합운동장");
        assert_eq!(place.facilities(), vec!["축구장", "육상트랙"]);
        assert_eq!(place.contact, "041-521-0000");
        assert_eq!(place.latitude, None);
    }

    #[test]
    fn test_parse_bike_racks_skips_unnamed() {
        let csv = "자전거보관소명,소재지도로명주소,소재지지번주소,보관대수,공기주입기비치여부,수리대설치여부,관리기관전화번호,관리기관명,데이터기준일자\n\
                   천안역 보관소,충남 천안시 동남구 대흥로 239,,40,Y,N,041-521-2000,천안시청,2024-05-01\n\
                   ,충남 천안시,,10,N,N,,,\n";
        let parsed = parse_bike_racks(csv).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 1);
        let rack = &parsed.records[0];
        assert_eq!(rack.rack_count.as_deref(), Some("40"));
        assert_eq!(rack.lot_address, None);
        assert_eq!(rack.data_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_parse_corporations_with_spaced_headers() {
        let csv = "실과명,법인종류,허가번호,법인명칭,대표자,법  인  주  소,허가년도,임원,기능 및 목적,소관분야,비 고\n\
                   체육진흥과,사단법인,12,천안체육회,홍길동,충남 천안시 동남구 중앙로 1,2001,7,생활체육 진흥,체육,없음\n";
        let parsed = parse_corporations(csv).unwrap();
        let corp = &parsed.records[0];
        assert_eq!(corp.name, "천안체육회");
        assert_eq!(corp.address.as_deref(), Some("충남 천안시 동남구 중앙로 1"));
        assert_eq!(corp.purpose.as_deref(), Some("생활체육 진흥"));
        assert_eq!(corp.note.as_deref(), Some("없음"));
    }

    #[test]
    fn test_parse_corporations_with_compact_headers() {
        let csv = "법인명칭,법인주소,기능및목적,비고\n천안체육회,천안시,진흥,\n";
        let corp = &parse_corporations(csv).unwrap().records[0];
        assert_eq!(corp.address.as_deref(), Some("천안시"));
        assert_eq!(corp.note, None);
    }

    #[test]
    fn test_parse_sports_facilities_keeps_partial_rows() {
        let csv = "위치,장소,예약정보,주소\n\
                   서북구,실내수영장,온라인 예약,충남 천안시 서북구 1\n\
                   ,,,\n\
                   동남구,테니스장,,\n";
        let parsed = parse_sports_facilities(csv).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.records[1].place, "테니스장");
        assert_eq!(parsed.records[1].address, "");
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let csv = "명칭,주소,주요시설,문의처\n공원,천안시\n";
        let parsed = parse_places(csv).unwrap();
        assert_eq!(parsed.records[0].facilities_raw, "");
    }
}
