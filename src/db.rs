// Store - SQLite schema, row mapping and the JSON column boundary
//
// Every connection the registry uses comes from `open_database` or
// `open_in_memory`, so the schema, pragmas and SQL functions are always there.

use crate::entities::connectivity::{
    NATIONAL_PLAN_PREFIX, NO_CONNECTIVITY_LISTINGS, PROVINCIAL_PLAN_PREFIX,
};
use crate::entities::{
    ConnectivityCategory, ConnectivityRecord, Contact, Equipment, Establishment,
};
use crate::error::Result;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 1;

pub const ESTABLISHMENT_COLUMNS: &str = "id, code, name, alias, address, district, city, kind, \
     establishment_type, supervisor, scope, premises, lat, lon, observations, level, modality, \
     enrollment, male_enrollment, female_enrollment, sections, shifts, internet_connection, \
     link_plan, infrastructure_plan, created_at, updated_at";

pub const CONTACT_COLUMNS: &str =
    "id, code, first_name, last_name, role, phone, email, district, supervisor, updated_at";

pub const EQUIPMENT_COLUMNS: &str = "id, establishment_id, laptops, tablets, robotics_kits, \
     printers_3d, other_resources, programs_delivered, initial_equipment, primary_equipment, \
     secondary_equipment, updated_at";

pub const CONNECTIVITY_COLUMNS: &str = "id, code, name, district, city, lat, lon, level, \
     modality, enrollment, shifts, internet_connection, link_plan, infrastructure_plan, category";

// ============================================================================
// OPENING
// ============================================================================

/// Open (or create) the registry database at `path`.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;

    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    register_functions(&conn)?;
    setup_database(&conn)?;

    log::debug!("opened registry database at {}", path.display());
    Ok(conn)
}

/// In-memory database with the full schema. Used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    register_functions(&conn)?;
    setup_database(&conn)?;
    Ok(conn)
}

/// `fold_case(text)` - Unicode lowercase, so searches match "JARDÍN" and "jardín".
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|s| s.to_lowercase()))
        },
    )?;
    Ok(())
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Create tables, indexes and the connectivity view. Idempotent.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&connectivity_view_sql())?;

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    if version < CURRENT_VERSION {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_VERSION],
        )?;
        log::info!("registry schema initialised at version {}", CURRENT_VERSION);
    }

    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS establishments (
    id TEXT PRIMARY KEY,
    code INTEGER NOT NULL UNIQUE,
    name TEXT,
    alias TEXT,
    address TEXT,
    district TEXT,
    city TEXT,
    kind TEXT,
    establishment_type TEXT,
    supervisor TEXT,
    scope TEXT,
    premises INTEGER,
    lat REAL,
    lon REAL,
    observations TEXT,
    level TEXT,
    modality TEXT,
    enrollment INTEGER,
    male_enrollment INTEGER,
    female_enrollment INTEGER,
    sections INTEGER,
    shifts TEXT,
    internet_connection TEXT,
    link_plan TEXT,
    infrastructure_plan TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- One contact per business code
CREATE TABLE IF NOT EXISTS contacts (
    id TEXT PRIMARY KEY,
    code INTEGER NOT NULL UNIQUE REFERENCES establishments(code) ON UPDATE CASCADE,
    first_name TEXT,
    last_name TEXT,
    role TEXT,
    phone TEXT,
    email TEXT,
    district TEXT,
    supervisor TEXT,
    updated_at TEXT NOT NULL
);

-- One equipment row per establishment id; per-level records are JSON text
CREATE TABLE IF NOT EXISTS equipment (
    id TEXT PRIMARY KEY,
    establishment_id TEXT NOT NULL UNIQUE REFERENCES establishments(id),
    laptops INTEGER NOT NULL DEFAULT 0,
    tablets INTEGER NOT NULL DEFAULT 0,
    robotics_kits INTEGER NOT NULL DEFAULT 0,
    printers_3d INTEGER NOT NULL DEFAULT 0,
    other_resources TEXT,
    programs_delivered TEXT NOT NULL DEFAULT '[]',
    initial_equipment TEXT,
    primary_equipment TEXT,
    secondary_equipment TEXT,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS program_enrollments (
    id TEXT PRIMARY KEY,
    code INTEGER NOT NULL REFERENCES establishments(code) ON UPDATE CASCADE,
    program TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (code, program)
);

-- Per-level enrollment figures loaded from the provincial export
CREATE TABLE IF NOT EXISTS enrollment_staging (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code INTEGER,
    level TEXT,
    enrollment INTEGER
);

CREATE INDEX IF NOT EXISTS idx_establishments_name ON establishments(name);
CREATE INDEX IF NOT EXISTS idx_establishments_district ON establishments(district);
CREATE INDEX IF NOT EXISTS idx_program_enrollments_code ON program_enrollments(code);
"#;

/// The view is generated from the same constants `ConnectivityCategory::classify` uses.
fn connectivity_view_sql() -> String {
    let listings = NO_CONNECTIVITY_LISTINGS
        .iter()
        .map(|listing| format!("'{}'", listing.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE VIEW IF NOT EXISTS connectivity_view AS
         SELECT id, code, name, alias, district, city, lat, lon, level, modality, enrollment, shifts,
                internet_connection, link_plan, infrastructure_plan,
                CASE
                    WHEN link_plan LIKE '{pba}%' OR infrastructure_plan LIKE '{pba}%' THEN '{provincial}'
                    WHEN link_plan LIKE '{pnce}%' OR infrastructure_plan LIKE '{pnce}%' THEN '{national}'
                    WHEN internet_connection IN ({listings}) THEN '{none}'
                    ELSE '{unknown}'
                END AS category
         FROM establishments;",
        pba = PROVINCIAL_PLAN_PREFIX,
        pnce = NATIONAL_PLAN_PREFIX,
        listings = listings,
        provincial = ConnectivityCategory::ProvincialPlan.as_str(),
        national = ConnectivityCategory::NationalPlan.as_str(),
        none = ConnectivityCategory::NoConnectivity.as_str(),
        unknown = ConnectivityCategory::Unknown.as_str(),
    )
}

// ============================================================================
// JSON COLUMNS
// ============================================================================

/// Decode a JSON text column.
///
/// NULL, blank text and JSON `null` all mean "absent". A JSON string holding
/// JSON (double-encoded legacy rows) is unwrapped once more; anything already
/// structured is taken as is.
///
/// Values that do not fit the target shape (negative or quoted counters) are
/// an error, and fail the whole row read rather than dropping the field.
pub fn decode_json_field<T: DeserializeOwned>(raw: Option<String>) -> serde_json::Result<Option<T>> {
    let Some(text) = raw else {
        return Ok(None);
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(text)? {
        Value::Null => Ok(None),
        Value::String(inner) => decode_json_field(Some(inner)),
        value => serde_json::from_value(value).map(Some),
    }
}

/// Encode an optional value as JSON text; `None` stays NULL.
pub fn encode_json_field<T: Serialize>(value: Option<&T>) -> serde_json::Result<Option<String>> {
    value.map(serde_json::to_string).transpose()
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(column)?;
    decode_json_field(raw).map_err(|e| {
        let index = row.as_ref().column_index(column).unwrap_or_default();
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
    })
}

// ============================================================================
// ROW MAPPING
// ============================================================================

pub fn row_to_establishment(row: &Row<'_>) -> rusqlite::Result<Establishment> {
    Ok(Establishment {
        id: row.get("id")?,
        code: row.get("code")?,
        name: row.get("name")?,
        alias: row.get("alias")?,
        address: row.get("address")?,
        district: row.get("district")?,
        city: row.get("city")?,
        kind: row.get("kind")?,
        establishment_type: row.get("establishment_type")?,
        supervisor: row.get("supervisor")?,
        scope: row.get("scope")?,
        premises: row.get("premises")?,
        lat: row.get("lat")?,
        lon: row.get("lon")?,
        observations: row.get("observations")?,
        level: row.get("level")?,
        modality: row.get("modality")?,
        enrollment: row.get("enrollment")?,
        male_enrollment: row.get("male_enrollment")?,
        female_enrollment: row.get("female_enrollment")?,
        sections: row.get("sections")?,
        shifts: row.get("shifts")?,
        internet_connection: row.get("internet_connection")?,
        link_plan: row.get("link_plan")?,
        infrastructure_plan: row.get("infrastructure_plan")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get("id")?,
        code: row.get("code")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        role: row.get("role")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        district: row.get("district")?,
        supervisor: row.get("supervisor")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn row_to_equipment(row: &Row<'_>) -> rusqlite::Result<Equipment> {
    Ok(Equipment {
        id: row.get("id")?,
        establishment_id: row.get("establishment_id")?,
        laptops: row.get("laptops")?,
        tablets: row.get("tablets")?,
        robotics_kits: row.get("robotics_kits")?,
        printers_3d: row.get("printers_3d")?,
        other_resources: row.get("other_resources")?,
        programs_delivered: json_column(row, "programs_delivered")?.unwrap_or_default(),
        initial: json_column(row, "initial_equipment")?,
        primary: json_column(row, "primary_equipment")?,
        secondary: json_column(row, "secondary_equipment")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn row_to_connectivity(row: &Row<'_>) -> rusqlite::Result<ConnectivityRecord> {
    let category: String = row.get("category")?;

    Ok(ConnectivityRecord {
        id: row.get("id")?,
        code: row.get("code")?,
        name: row.get("name")?,
        district: row.get("district")?,
        city: row.get("city")?,
        lat: row.get("lat")?,
        lon: row.get("lon")?,
        level: row.get("level")?,
        modality: row.get("modality")?,
        enrollment: row.get("enrollment")?,
        shifts: row.get("shifts")?,
        internet_connection: row.get("internet_connection")?,
        link_plan: row.get("link_plan")?,
        infrastructure_plan: row.get("infrastructure_plan")?,
        category: ConnectivityCategory::from_label(&category),
    })
}
