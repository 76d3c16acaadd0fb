// 📊 Statistics Aggregator - dashboard tiles
//
// Every function here returns zeroed defaults when the store fails; the
// failure is logged at warn and never reaches the caller.

use crate::entities::{ConnectivityCategory, Program};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralStatistics {
    pub total_establishments: i64,
    pub total_laptops: i64,
    pub total_tablets: i64,
    pub total_robotics_kits: i64,
    pub total_printers_3d: i64,
    /// Establishments with no equipment row at all
    pub without_equipment: i64,
    /// `without_equipment` as a percentage of `total_establishments` (0 when empty)
    pub without_equipment_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityStatistics {
    pub total_establishments: i64,
    pub provincial_plan: i64,
    pub national_plan: i64,
    pub no_connectivity: i64,
    pub unknown: i64,
}

impl ConnectivityStatistics {
    pub fn count(&self, category: ConnectivityCategory) -> i64 {
        match category {
            ConnectivityCategory::ProvincialPlan => self.provincial_plan,
            ConnectivityCategory::NationalPlan => self.national_plan,
            ConnectivityCategory::NoConnectivity => self.no_connectivity,
            ConnectivityCategory::Unknown => self.unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramStatistics {
    /// Rows per catalog program; every program is present, zero included
    pub by_program: BTreeMap<String, i64>,
    pub establishments_with_programs: i64,
    pub total_rows: i64,
}

/// Everything the dashboard shows at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub general: GeneralStatistics,
    pub connectivity: ConnectivityStatistics,
    pub programs: ProgramStatistics,
    pub district_count: i64,
    pub total_enrollment: i64,
}

fn or_default<T: Default>(what: &str, result: rusqlite::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        log::warn!("{} statistics unavailable: {}", what, e);
        T::default()
    })
}

pub fn general_statistics(conn: &Connection) -> GeneralStatistics {
    or_default("general", query_general(conn))
}

fn query_general(conn: &Connection) -> rusqlite::Result<GeneralStatistics> {
    let total_establishments: i64 =
        conn.query_row("SELECT COUNT(*) FROM establishments", [], |row| row.get(0))?;

    let (total_laptops, total_tablets, total_robotics_kits, total_printers_3d) = conn.query_row(
        "SELECT COALESCE(SUM(laptops), 0), COALESCE(SUM(tablets), 0),
                COALESCE(SUM(robotics_kits), 0), COALESCE(SUM(printers_3d), 0)
         FROM equipment",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;

    let without_equipment: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM establishments e
         LEFT JOIN equipment q ON q.establishment_id = e.id
         WHERE q.id IS NULL",
        [],
        |row| row.get(0),
    )?;

    let without_equipment_pct = if total_establishments > 0 {
        without_equipment as f64 * 100.0 / total_establishments as f64
    } else {
        0.0
    };

    Ok(GeneralStatistics {
        total_establishments,
        total_laptops,
        total_tablets,
        total_robotics_kits,
        total_printers_3d,
        without_equipment,
        without_equipment_pct,
    })
}

pub fn connectivity_statistics(conn: &Connection) -> ConnectivityStatistics {
    or_default("connectivity", query_connectivity(conn))
}

fn query_connectivity(conn: &Connection) -> rusqlite::Result<ConnectivityStatistics> {
    let mut stmt =
        conn.prepare("SELECT category, COUNT(*) FROM connectivity_view GROUP BY category")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut stats = ConnectivityStatistics::default();
    for row in rows {
        let (label, count) = row?;
        stats.total_establishments += count;
        match ConnectivityCategory::from_label(label.as_deref().unwrap_or_default()) {
            ConnectivityCategory::ProvincialPlan => stats.provincial_plan += count,
            ConnectivityCategory::NationalPlan => stats.national_plan += count,
            ConnectivityCategory::NoConnectivity => stats.no_connectivity += count,
            ConnectivityCategory::Unknown => stats.unknown += count,
        }
    }
    Ok(stats)
}

/// Distinct non-blank districts, compared after trimming.
pub fn district_count(conn: &Connection) -> i64 {
    or_default(
        "district",
        conn.query_row(
            "SELECT COUNT(DISTINCT TRIM(district))
             FROM establishments
             WHERE district IS NOT NULL AND TRIM(district) <> ''",
            [],
            |row| row.get(0),
        ),
    )
}

/// Sum over the enrollment staging table.
pub fn total_enrollment(conn: &Connection) -> i64 {
    or_default(
        "enrollment",
        conn.query_row(
            "SELECT COALESCE(SUM(enrollment), 0) FROM enrollment_staging",
            [],
            |row| row.get(0),
        ),
    )
}

pub fn program_statistics(conn: &Connection) -> ProgramStatistics {
    or_default("program", query_programs(conn))
}

fn query_programs(conn: &Connection) -> rusqlite::Result<ProgramStatistics> {
    let mut by_program: BTreeMap<String, i64> = Program::ALL
        .iter()
        .map(|p| (p.as_str().to_string(), 0))
        .collect();

    let mut stmt =
        conn.prepare("SELECT program, COUNT(*) FROM program_enrollments GROUP BY program")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut total_rows = 0;
    for row in rows {
        let (program, count) = row?;
        total_rows += count;
        *by_program.entry(program).or_insert(0) += count;
    }

    let establishments_with_programs = conn.query_row(
        "SELECT COUNT(DISTINCT code) FROM program_enrollments",
        [],
        |row| row.get(0),
    )?;

    Ok(ProgramStatistics {
        by_program,
        establishments_with_programs,
        total_rows,
    })
}

pub fn dashboard_summary(conn: &Connection) -> DashboardSummary {
    let summary = DashboardSummary {
        general: general_statistics(conn),
        connectivity: connectivity_statistics(conn),
        programs: program_statistics(conn),
        district_count: district_count(conn),
        total_enrollment: total_enrollment(conn),
    };
    log::debug!("dashboard summary: {:?}", summary);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::entities::{Equipment, EstablishmentPatch};
    use crate::programs::set_programs;
    use crate::testing::{insert_school, SchoolSeed};
    use crate::updates::{patch_establishment, upsert_equipment};

    #[test]
    fn test_empty_database_is_all_zero() {
        let conn = open_in_memory().unwrap();
        let summary = dashboard_summary(&conn);

        assert_eq!(summary.general, GeneralStatistics::default());
        assert_eq!(summary.connectivity, ConnectivityStatistics::default());
        assert_eq!(summary.programs.total_rows, 0);
        assert_eq!(summary.programs.by_program.len(), Program::ALL.len());
        assert_eq!(summary.district_count, 0);
        assert_eq!(summary.total_enrollment, 0);
    }

    #[test]
    fn test_store_failure_downgrades_to_defaults() {
        // No schema: every query fails
        let conn = Connection::open_in_memory().unwrap();

        assert_eq!(general_statistics(&conn), GeneralStatistics::default());
        assert_eq!(connectivity_statistics(&conn), ConnectivityStatistics::default());
        assert_eq!(program_statistics(&conn), ProgramStatistics::default());
        assert_eq!(district_count(&conn), 0);
        assert_eq!(total_enrollment(&conn), 0);
    }

    #[test]
    fn test_general_totals_and_without_equipment() {
        let conn = open_in_memory().unwrap();
        let a = insert_school(&conn, SchoolSeed::new(1, "A", "Merlo", "Merlo"));
        let b = insert_school(&conn, SchoolSeed::new(2, "B", "Moreno", "Moreno"));
        insert_school(&conn, SchoolSeed::new(3, "C", "Moreno", "Paso del Rey"));
        insert_school(&conn, SchoolSeed::new(4, "D", "Lujan", "Lujan"));

        let mut eq = Equipment::new(a.id.clone());
        eq.laptops = 10;
        eq.tablets = 4;
        upsert_equipment(&conn, &eq).unwrap();

        let mut eq = Equipment::new(b.id.clone());
        eq.laptops = 5;
        eq.robotics_kits = 2;
        eq.printers_3d = 1;
        upsert_equipment(&conn, &eq).unwrap();

        let stats = general_statistics(&conn);
        assert_eq!(stats.total_establishments, 4);
        assert_eq!(stats.total_laptops, 15);
        assert_eq!(stats.total_tablets, 4);
        assert_eq!(stats.total_robotics_kits, 2);
        assert_eq!(stats.total_printers_3d, 1);
        assert_eq!(stats.without_equipment, 2);
        assert!((stats.without_equipment_pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_district_count_trims_and_skips_blank() {
        let conn = open_in_memory().unwrap();
        insert_school(&conn, SchoolSeed::new(1, "A", "Merlo", "Merlo"));
        let b = insert_school(&conn, SchoolSeed::new(2, "B", "Moreno", "Moreno"));
        let c = insert_school(&conn, SchoolSeed::new(3, "C", "Lujan", "Lujan"));

        conn.execute("UPDATE establishments SET district = ' Merlo ' WHERE id = ?1", [&b.id])
            .unwrap();
        patch_establishment(
            &conn,
            &c.id,
            &EstablishmentPatch {
                district: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(district_count(&conn), 1);
    }

    #[test]
    fn test_connectivity_counts_per_category() {
        let conn = open_in_memory().unwrap();
        let plans = [
            (1, Some("PBA - Enlace"), None),
            (2, None, Some("PNCE 2022")),
            (3, None, None),
            (4, Some("pba fibra"), Some("PNCE")),
        ];
        for (code, link, listing) in plans {
            let school = insert_school(&conn, SchoolSeed::new(code, "Escuela", "Merlo", "Merlo"));
            let patch = EstablishmentPatch {
                link_plan: Some(link.map(str::to_string)),
                infrastructure_plan: Some(listing.map(str::to_string)),
                ..Default::default()
            };
            patch_establishment(&conn, &school.id, &patch).unwrap();
        }
        let offline = insert_school(&conn, SchoolSeed::new(5, "Escuela", "Merlo", "Merlo"));
        patch_establishment(
            &conn,
            &offline.id,
            &EstablishmentPatch {
                internet_connection: Some(Some("Sin conectividad".to_string())),
                ..Default::default()
            },
        )
        .unwrap();

        let stats = connectivity_statistics(&conn);
        assert_eq!(stats.total_establishments, 5);
        assert_eq!(stats.count(ConnectivityCategory::ProvincialPlan), 2);
        assert_eq!(stats.count(ConnectivityCategory::NationalPlan), 1);
        assert_eq!(stats.count(ConnectivityCategory::NoConnectivity), 1);
        assert_eq!(stats.count(ConnectivityCategory::Unknown), 1);
    }

    #[test]
    fn test_total_enrollment_sums_staging() {
        let conn = open_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO enrollment_staging (code, level, enrollment) VALUES
                 (1, 'Primario', 300), (2, 'Inicial', 120), (3, 'Secundario', NULL);",
        )
        .unwrap();

        assert_eq!(total_enrollment(&conn), 420);
    }

    #[test]
    fn test_program_statistics() {
        let conn = open_in_memory().unwrap();
        let a = insert_school(&conn, SchoolSeed::new(1, "A", "Merlo", "Merlo"));
        let b = insert_school(&conn, SchoolSeed::new(2, "B", "Merlo", "Merlo"));
        set_programs(&conn, a.code, &[Program::JuanaManso, Program::PrimariaDigital]).unwrap();
        set_programs(&conn, b.code, &[Program::JuanaManso]).unwrap();

        let stats = program_statistics(&conn);
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.establishments_with_programs, 2);
        assert_eq!(stats.by_program["Juana Manso"], 2);
        assert_eq!(stats.by_program["Primaria Digital"], 1);
        assert_eq!(stats.by_program["Conectar Igualdad"], 0);
    }
}
