//! Repositories for the imported public-facility datasets: bike racks,
//! corporations, outdoor exercise equipment and sports facilities.

use std::fmt;
use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use fitquest_core::{
    new_v7, BikeRack, Coordinates, Corporation, Error, OutdoorEquipment, Result, SportsFacility,
};

/// Tables whose rows carry geocodable addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodedTable {
    Places,
    BikeRacks,
    Corporations,
    Outdoor,
    Sports,
}

impl GeocodedTable {
    pub const ALL: [GeocodedTable; 5] = [
        GeocodedTable::Corporations,
        GeocodedTable::BikeRacks,
        GeocodedTable::Places,
        GeocodedTable::Outdoor,
        GeocodedTable::Sports,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            GeocodedTable::Places => "place",
            GeocodedTable::BikeRacks => "bike_rack",
            GeocodedTable::Corporations => "corporation",
            GeocodedTable::Outdoor => "outdoor_equipment",
            GeocodedTable::Sports => "sports_facility",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeocodedTable::Places => "places",
            GeocodedTable::BikeRacks => "bike_racks",
            GeocodedTable::Corporations => "corporations",
            GeocodedTable::Outdoor => "outdoor",
            GeocodedTable::Sports => "sports",
        }
    }
}

impl fmt::Display for GeocodedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeocodedTable {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "places" => Ok(GeocodedTable::Places),
            "bike_racks" | "bike-racks" => Ok(GeocodedTable::BikeRacks),
            "corporations" => Ok(GeocodedTable::Corporations),
            "outdoor" => Ok(GeocodedTable::Outdoor),
            "sports" => Ok(GeocodedTable::Sports),
            other => Err(format!(
                "unknown model '{}', expected one of corporations, bike_racks, places, outdoor, sports",
                other
            )),
        }
    }
}

fn bike_rack_from_row(row: &PgRow) -> BikeRack {
    BikeRack {
        id: row.get("id"),
        name: row.get("name"),
        road_address: row.get("road_address"),
        lot_address: row.get("lot_address"),
        rack_count: row.get("rack_count"),
        has_air_pump: row.get("has_air_pump"),
        has_repair_stand: row.get("has_repair_stand"),
        manager_phone: row.get("manager_phone"),
        manager_name: row.get("manager_name"),
        data_date: row.get("data_date"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

fn corporation_from_row(row: &PgRow) -> Corporation {
    Corporation {
        id: row.get("id"),
        department: row.get("department"),
        kind: row.get("kind"),
        permit_number: row.get("permit_number"),
        name: row.get("name"),
        representative: row.get("representative"),
        address: row.get("address"),
        permit_year: row.get("permit_year"),
        officers: row.get("officers"),
        purpose: row.get("purpose"),
        jurisdiction: row.get("jurisdiction"),
        note: row.get("note"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

fn equipment_from_row(row: &PgRow) -> OutdoorEquipment {
    OutdoorEquipment {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        equipment_info: row.get("equipment_info"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

fn sports_facility_from_row(row: &PgRow) -> SportsFacility {
    SportsFacility {
        id: row.get("id"),
        location: row.get("location"),
        place: row.get("place"),
        reservation: row.get("reservation"),
        address: row.get("address"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

/// Outcome of an upsert keyed by natural name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

pub struct PgFacilityRepository {
    pool: Pool<Postgres>,
}

impl PgFacilityRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // BIKE RACKS
    // =========================================================================

    pub async fn insert_bike_rack(&self, rack: &BikeRack) -> Result<Uuid> {
        let id = new_v7();
        sqlx::query(
            "INSERT INTO bike_rack (id, name, road_address, lot_address, rack_count,
                                    has_air_pump, has_repair_stand, manager_phone,
                                    manager_name, data_date, latitude, longitude)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(id)
        .bind(&rack.name)
        .bind(&rack.road_address)
        .bind(&rack.lot_address)
        .bind(&rack.rack_count)
        .bind(&rack.has_air_pump)
        .bind(&rack.has_repair_stand)
        .bind(&rack.manager_phone)
        .bind(&rack.manager_name)
        .bind(&rack.data_date)
        .bind(rack.latitude)
        .bind(rack.longitude)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    pub async fn bike_racks_missing_coordinates(&self, limit: Option<i64>) -> Result<Vec<BikeRack>> {
        let rows = sqlx::query(
            "SELECT * FROM bike_rack
             WHERE latitude IS NULL AND longitude IS NULL
               AND (btrim(coalesce(road_address, '')) <> '' OR btrim(coalesce(lot_address, '')) <> '')
             ORDER BY id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(bike_rack_from_row).collect())
    }

    // =========================================================================
    // CORPORATIONS
    // =========================================================================

    pub async fn insert_corporation(&self, corp: &Corporation) -> Result<Uuid> {
        let id = new_v7();
        sqlx::query(
            "INSERT INTO corporation (id, department, kind, permit_number, name, representative,
                                      address, permit_year, officers, purpose, jurisdiction,
                                      note, latitude, longitude)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(id)
        .bind(&corp.department)
        .bind(&corp.kind)
        .bind(&corp.permit_number)
        .bind(&corp.name)
        .bind(&corp.representative)
        .bind(&corp.address)
        .bind(&corp.permit_year)
        .bind(&corp.officers)
        .bind(&corp.purpose)
        .bind(&corp.jurisdiction)
        .bind(&corp.note)
        .bind(corp.latitude)
        .bind(corp.longitude)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    pub async fn corporations_missing_coordinates(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<Corporation>> {
        let rows = sqlx::query(
            "SELECT * FROM corporation
             WHERE latitude IS NULL AND longitude IS NULL
               AND btrim(coalesce(address, '')) <> ''
             ORDER BY id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(corporation_from_row).collect())
    }

    // =========================================================================
    // OUTDOOR EQUIPMENT
    // =========================================================================

    /// Insert or update equipment by name.
    ///
    /// Existing coordinates are kept when the incoming record has none.
    pub async fn upsert_equipment(&self, equipment: &OutdoorEquipment) -> Result<Upsert> {
        let row = sqlx::query(
            "INSERT INTO outdoor_equipment (id, name, address, equipment_info, latitude, longitude)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (name) DO UPDATE SET
                address = EXCLUDED.address,
                equipment_info = EXCLUDED.equipment_info,
                latitude = COALESCE(EXCLUDED.latitude, outdoor_equipment.latitude),
                longitude = COALESCE(EXCLUDED.longitude, outdoor_equipment.longitude)
             RETURNING (xmax = 0) AS inserted",
        )
        .bind(new_v7())
        .bind(&equipment.name)
        .bind(&equipment.address)
        .bind(&equipment.equipment_info)
        .bind(equipment.latitude)
        .bind(equipment.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let inserted: bool = row.get("inserted");
        Ok(if inserted {
            Upsert::Created
        } else {
            Upsert::Updated
        })
    }

    pub async fn get_equipment_by_name(&self, name: &str) -> Result<Option<OutdoorEquipment>> {
        let row = sqlx::query("SELECT * FROM outdoor_equipment WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(equipment_from_row))
    }

    /// Equipment with both coordinates set.
    pub async fn list_geocoded_equipment(&self) -> Result<Vec<OutdoorEquipment>> {
        let rows = sqlx::query(
            "SELECT * FROM outdoor_equipment
             WHERE latitude IS NOT NULL AND longitude IS NOT NULL
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(equipment_from_row).collect())
    }

    pub async fn equipment_missing_coordinates(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<OutdoorEquipment>> {
        let rows = sqlx::query(
            "SELECT * FROM outdoor_equipment
             WHERE latitude IS NULL AND longitude IS NULL AND btrim(address) <> ''
             ORDER BY id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(equipment_from_row).collect())
    }

    // =========================================================================
    // SPORTS FACILITIES
    // =========================================================================

    /// Replace every sports facility with `facilities` in one transaction.
    pub async fn replace_sports_facilities(&self, facilities: &[SportsFacility]) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let removed = sqlx::query("DELETE FROM sports_facility")
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        for facility in facilities {
            sqlx::query(
                "INSERT INTO sports_facility (id, location, place, reservation, address,
                                              latitude, longitude)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(new_v7())
            .bind(&facility.location)
            .bind(&facility.place)
            .bind(&facility.reservation)
            .bind(&facility.address)
            .bind(facility.latitude)
            .bind(facility.longitude)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "facilities",
            op = "replace_sports_facilities",
            removed,
            result_count = facilities.len(),
            "Sports facilities replaced"
        );
        Ok(facilities.len() as u64)
    }

    pub async fn sports_facilities_missing_coordinates(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<SportsFacility>> {
        let rows = sqlx::query(
            "SELECT * FROM sports_facility
             WHERE latitude IS NULL AND longitude IS NULL AND btrim(address) <> ''
             ORDER BY id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(sports_facility_from_row).collect())
    }

    // =========================================================================
    // COORDINATES
    // =========================================================================

    /// Write coordinates onto a row of any geocoded table.
    pub async fn set_coordinates(
        &self,
        table: GeocodedTable,
        id: Uuid,
        coords: Coordinates,
    ) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET latitude = $1, longitude = $2 WHERE id = $3",
            table.table()
        ))
        .bind(coords.latitude)
        .bind(coords.longitude)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
