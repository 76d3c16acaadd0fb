// 📥 CSV import - establishments and the enrollment staging table
//
// Headers may use the English field names or the Spanish column names of
// the provincial exports.

use crate::entities::{BusinessCode, NewEstablishment};
use crate::error::{RegistryError, Result};
use crate::updates::create_establishment;
use anyhow::Context;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Rows skipped because their business code already exists
    pub duplicates: usize,
}

pub fn load_establishments_csv(csv_path: &Path) -> anyhow::Result<Vec<NewEstablishment>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let row: NewEstablishment =
            result.with_context(|| format!("Failed to deserialize establishment on row {}", line + 2))?;
        rows.push(row);
    }

    log::debug!("loaded {} establishment rows from {}", rows.len(), csv_path.display());
    Ok(rows)
}

/// Insert every row in one transaction. Duplicate codes are skipped and
/// counted; any other failure aborts the whole import.
pub fn import_establishments(conn: &Connection, rows: &[NewEstablishment]) -> Result<ImportSummary> {
    let tx = conn.unchecked_transaction()?;
    let mut summary = ImportSummary::default();

    for row in rows {
        match create_establishment(&tx, row) {
            Ok(_) => summary.inserted += 1,
            Err(RegistryError::DuplicateCode(code)) => {
                log::warn!("skipping duplicate business code {}", code);
                summary.duplicates += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tx.commit()?;
    log::info!(
        "imported {} establishments ({} duplicates skipped)",
        summary.inserted,
        summary.duplicates
    );
    Ok(summary)
}

/// One enrollment staging row. Every column may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRow {
    #[serde(default, alias = "cue")]
    pub code: Option<BusinessCode>,
    #[serde(default, alias = "nivel")]
    pub level: Option<String>,
    #[serde(default, alias = "matricula")]
    pub enrollment: Option<i64>,
}

pub fn load_enrollment_csv(csv_path: &Path) -> anyhow::Result<Vec<EnrollmentRow>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: EnrollmentRow = result.context("Failed to deserialize enrollment row")?;
        rows.push(row);
    }
    Ok(rows)
}

/// Append rows to the staging table, or replace its contents when `replace`.
pub fn import_enrollment(conn: &Connection, rows: &[EnrollmentRow], replace: bool) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    if replace {
        let cleared = tx.execute("DELETE FROM enrollment_staging", [])?;
        log::debug!("cleared {} staging rows", cleared);
    }

    {
        let mut stmt = tx.prepare(
            "INSERT INTO enrollment_staging (code, level, enrollment) VALUES (?1, ?2, ?3)",
        )?;
        for row in rows {
            stmt.execute(params![row.code, row.level, row.enrollment])?;
        }
    }

    tx.commit()?;
    log::info!("staged {} enrollment rows", rows.len());
    Ok(rows.len())
}
