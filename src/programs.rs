// 📚 Program Membership Manager
//
// Membership is replaced wholesale: the rows for a business code are deleted
// and the new set inserted inside one transaction.

use crate::details::find_by_code;
use crate::entities::{BusinessCode, Program, ProgramEnrollment};
use crate::error::{RegistryError, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;

/// Replace the program set of `code`. Duplicates collapse to one row.
///
/// If any insert fails the previous membership is left untouched.
pub fn set_programs(conn: &Connection, code: BusinessCode, programs: &[Program]) -> Result<()> {
    if find_by_code(conn, code)?.is_none() {
        return Err(RegistryError::NotFound(format!("code {}", code)));
    }

    let unique: BTreeSet<Program> = programs.iter().copied().collect();
    let now = Utc::now();

    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute("DELETE FROM program_enrollments WHERE code = ?1", params![code])?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO program_enrollments (id, code, program, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for program in &unique {
            stmt.execute(params![
                uuid::Uuid::new_v4().to_string(),
                code,
                program.as_str(),
                now
            ])?;
        }
    }

    tx.commit()?;
    log::info!(
        "programs for {}: removed {}, inserted {}",
        code,
        removed,
        unique.len()
    );
    Ok(())
}

/// Membership rows of `code`, ordered by program name.
pub fn get_programs(conn: &Connection, code: BusinessCode) -> Result<Vec<ProgramEnrollment>> {
    let mut stmt = conn.prepare(
        "SELECT id, code, program, created_at
         FROM program_enrollments
         WHERE code = ?1
         ORDER BY program",
    )?;

    let rows = stmt
        .query_map(params![code], |row| {
            Ok(ProgramEnrollment {
                id: row.get("id")?,
                code: row.get("code")?,
                program: row.get("program")?,
                created_at: row.get("created_at")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}
