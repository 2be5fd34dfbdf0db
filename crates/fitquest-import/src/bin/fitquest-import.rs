//! fitquest-import: load public datasets into the fitquest database.
//!
//! ```text
//! fitquest-import places data/places.csv
//! fitquest-import corporations data/corporations.csv --no-geocode
//! fitquest-import bike-racks data/bike_racks.csv --encoding cp949
//! fitquest-import equipment
//! fitquest-import geocode --model corporations --limit 100
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fitquest_core::defaults::GEOCODE_DELAY_SECS;
use fitquest_core::{
    BikeRack, Corporation, Geocoder, Geolocated, OutdoorEquipment, Place, SportsFacility,
};
use fitquest_db::{Database, GeocodedTable, PoolConfig, Upsert};
use fitquest_geocode::{fill_coordinates, geocoder_from_env};
use fitquest_import::{
    decode, equipment_from_item, geocode_records, import_geocoder, parse_bike_racks,
    parse_corporations, parse_places, parse_sports_facilities, pause, EquipmentSource,
    EquipmentSourceConfig, SourceEncoding,
};

#[derive(Parser)]
#[command(name = "fitquest-import")]
#[command(author, version, about = "Load public datasets into fitquest")]
#[command(propagate_version = true)]
struct Cli {
    /// Database URL (defaults to DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Run pending migrations before importing
    #[arg(long, global = true)]
    migrate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ImportOptions {
    /// CSV file to import
    path: PathBuf,

    /// Source encoding: utf8, cp949 or auto
    #[arg(long)]
    encoding: Option<SourceEncoding>,

    /// Store records without geocoding them (geocoding runs when KAKAO_API_KEY is set)
    #[arg(long)]
    no_geocode: bool,

    /// Seconds to wait between geocoding requests
    #[arg(long, default_value_t = GEOCODE_DELAY_SECS)]
    delay: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Import places (명칭, 주소, 주요시설, 문의처)
    Places(ImportOptions),

    /// Import bike racks (CP949 by default)
    BikeRacks(ImportOptions),

    /// Import non-profit corporations (CP949 by default)
    Corporations(ImportOptions),

    /// Replace all sports facilities (UTF-8, falling back to CP949)
    SportsFacilities(ImportOptions),

    /// Fetch outdoor exercise equipment from the open-data API
    Equipment {
        /// Store equipment without geocoding it
        #[arg(long)]
        no_geocode: bool,

        /// Seconds to wait between geocoding requests
        #[arg(long, default_value_t = GEOCODE_DELAY_SECS)]
        delay: f64,
    },

    /// Back-fill coordinates for records that have an address but none yet
    Geocode {
        /// One of corporations, bike_racks, places, outdoor, sports (default: all)
        #[arg(long)]
        model: Option<GeocodedTable>,

        /// Seconds to wait between requests
        #[arg(long, default_value_t = GEOCODE_DELAY_SECS)]
        delay: f64,

        /// Maximum records per model
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let database_url = match cli.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
    };
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    if cli.migrate {
        db.migrate().await?;
    }

    match cli.command {
        Commands::Places(opts) => import_places(&db, opts).await,
        Commands::BikeRacks(opts) => import_bike_racks(&db, opts).await,
        Commands::Corporations(opts) => import_corporations(&db, opts).await,
        Commands::SportsFacilities(opts) => import_sports_facilities(&db, opts).await,
        Commands::Equipment { no_geocode, delay } => {
            import_equipment(&db, no_geocode, delay).await
        }
        Commands::Geocode {
            model,
            delay,
            limit,
        } => {
            let geocoder = require_geocoder()?;
            let models = match model {
                Some(model) => vec![model],
                None => GeocodedTable::ALL.to_vec(),
            };
            for model in models {
                backfill(&db, geocoder.as_ref(), model, delay, limit).await?;
            }
            Ok(())
        }
    }
}

fn require_geocoder() -> anyhow::Result<Arc<dyn Geocoder>> {
    let geocoder = geocoder_from_env()?;
    if geocoder.provider() == "disabled" {
        bail!("KAKAO_API_KEY must be set to geocode");
    }
    Ok(geocoder)
}

fn read_source(path: &Path, encoding: SourceEncoding) -> anyhow::Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = decode(&bytes, encoding).with_context(|| format!("decoding {}", path.display()))?;
    Ok(text)
}

fn optional_geocoder(no_geocode: bool) -> anyhow::Result<Option<Arc<dyn Geocoder>>> {
    if no_geocode {
        return Ok(None);
    }
    Ok(import_geocoder(false, geocoder_from_env()?))
}

async fn import_places(db: &Database, opts: ImportOptions) -> anyhow::Result<()> {
    let text = read_source(&opts.path, opts.encoding.unwrap_or(SourceEncoding::Utf8))?;
    let mut parsed = parse_places(&text)?;
    let geocoder = optional_geocoder(opts.no_geocode)?;
    let filled = geocode_records(geocoder.as_deref(), &mut parsed.records, opts.delay).await;

    for place in &parsed.records {
        db.places.insert(place).await?;
    }
    report("places", parsed.records.len(), parsed.skipped, filled);
    Ok(())
}

async fn import_bike_racks(db: &Database, opts: ImportOptions) -> anyhow::Result<()> {
    let text = read_source(&opts.path, opts.encoding.unwrap_or(SourceEncoding::Cp949))?;
    let mut parsed = parse_bike_racks(&text)?;
    let geocoder = optional_geocoder(opts.no_geocode)?;
    let filled = geocode_records(geocoder.as_deref(), &mut parsed.records, opts.delay).await;

    for rack in &parsed.records {
        db.facilities.insert_bike_rack(rack).await?;
    }
    report("bike_racks", parsed.records.len(), parsed.skipped, filled);
    Ok(())
}

async fn import_corporations(db: &Database, opts: ImportOptions) -> anyhow::Result<()> {
    let text = read_source(&opts.path, opts.encoding.unwrap_or(SourceEncoding::Cp949))?;
    let mut parsed = parse_corporations(&text)?;
    let geocoder = optional_geocoder(opts.no_geocode)?;
    let filled = geocode_records(geocoder.as_deref(), &mut parsed.records, opts.delay).await;

    for corp in &parsed.records {
        db.facilities.insert_corporation(corp).await?;
    }
    report("corporations", parsed.records.len(), parsed.skipped, filled);
    Ok(())
}

async fn import_sports_facilities(db: &Database, opts: ImportOptions) -> anyhow::Result<()> {
    let text = read_source(&opts.path, opts.encoding.unwrap_or(SourceEncoding::Auto))?;
    let mut parsed = parse_sports_facilities(&text)?;
    let geocoder = optional_geocoder(opts.no_geocode)?;
    let filled = geocode_records(geocoder.as_deref(), &mut parsed.records, opts.delay).await;

    db.facilities
        .replace_sports_facilities(&parsed.records)
        .await?;
    report("sports", parsed.records.len(), parsed.skipped, filled);
    Ok(())
}

async fn import_equipment(db: &Database, no_geocode: bool, delay: f64) -> anyhow::Result<()> {
    let source = EquipmentSource::new(EquipmentSourceConfig::from_env()?)?;
    let items = source.fetch().await?;
    if items.is_empty() {
        warn!(subsystem = "import", component = "equipment", "API returned no data");
        return Ok(());
    }

    let geocoder = optional_geocoder(no_geocode)?;
    let (mut created, mut updated, mut skipped, mut filled) = (0usize, 0usize, 0usize, 0usize);

    for item in &items {
        let Some(mut equipment) = equipment_from_item(item) else {
            skipped += 1;
            continue;
        };

        if let Some(geocoder) = geocoder.as_deref() {
            let stored = db.facilities.get_equipment_by_name(&equipment.name).await?;
            let already_located = stored.is_some_and(|s| s.coordinates().is_some());
            if !already_located && fill_coordinates(geocoder, &mut equipment).await {
                filled += 1;
                pause(delay).await;
            }
        }

        match db.facilities.upsert_equipment(&equipment).await? {
            Upsert::Created => created += 1,
            Upsert::Updated => updated += 1,
        }
    }

    info!(
        subsystem = "import",
        component = "equipment",
        created,
        updated,
        skipped,
        geocoded = filled,
        "Equipment import finished"
    );
    Ok(())
}

/// Geocode stored rows of `table` that have an address but no coordinates.
async fn backfill(
    db: &Database,
    geocoder: &dyn Geocoder,
    table: GeocodedTable,
    delay: f64,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let facilities = &db.facilities;
    let (attempted, filled) = match table {
        GeocodedTable::Places => {
            let records = db.places.list_missing_coordinates(limit).await?;
            store_filled(db, geocoder, table, records, |p: &Place| p.id, delay).await?
        }
        GeocodedTable::BikeRacks => {
            let records = facilities.bike_racks_missing_coordinates(limit).await?;
            store_filled(db, geocoder, table, records, |r: &BikeRack| r.id, delay).await?
        }
        GeocodedTable::Corporations => {
            let records = facilities.corporations_missing_coordinates(limit).await?;
            store_filled(db, geocoder, table, records, |c: &Corporation| c.id, delay).await?
        }
        GeocodedTable::Outdoor => {
            let records = facilities.equipment_missing_coordinates(limit).await?;
            store_filled(db, geocoder, table, records, |e: &OutdoorEquipment| e.id, delay).await?
        }
        GeocodedTable::Sports => {
            let records = facilities.sports_facilities_missing_coordinates(limit).await?;
            store_filled(db, geocoder, table, records, |s: &SportsFacility| s.id, delay).await?
        }
    };

    info!(
        subsystem = "import",
        component = "backfill",
        model = %table,
        attempted,
        filled,
        failed = attempted - filled,
        "Coordinate back-fill finished"
    );
    Ok(())
}

async fn store_filled<R: Geolocated>(
    db: &Database,
    geocoder: &dyn Geocoder,
    table: GeocodedTable,
    records: Vec<R>,
    id_of: impl Fn(&R) -> Uuid,
    delay: f64,
) -> anyhow::Result<(usize, usize)> {
    let attempted = records.len();
    let mut filled = 0;
    for mut record in records {
        if fill_coordinates(geocoder, &mut record).await {
            if let Some(coords) = record.coordinates() {
                db.facilities
                    .set_coordinates(table, id_of(&record), coords)
                    .await?;
                filled += 1;
            }
        }
        pause(delay).await;
    }
    Ok((attempted, filled))
}

fn report(model: &str, imported: usize, skipped: usize, geocoded: usize) {
    info!(
        subsystem = "import",
        component = model,
        imported,
        skipped,
        geocoded,
        "Import finished"
    );
}
