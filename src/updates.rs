// ✏️ Update Orchestrator - every write to an establishment and its related rows
//
// Writes that span several statements (delete cascade, composite save) run in
// one SQLite transaction. Contact and equipment use native upserts keyed on
// their unique columns; code uniqueness on create is left to the store.

use crate::db::{
    encode_json_field, row_to_contact, row_to_equipment, row_to_establishment, CONTACT_COLUMNS,
    EQUIPMENT_COLUMNS, ESTABLISHMENT_COLUMNS,
};
use crate::details::{find_by_code, get_establishment};
use crate::entities::{
    BusinessCode, Contact, Equipment, Establishment, EstablishmentId, EstablishmentPatch,
    NewEstablishment,
};
use crate::error::{is_unique_violation, RegistryError, Result};
use chrono::Utc;
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

// ============================================================================
// CREATE
// ============================================================================

/// Create an establishment. A code already in use fails with `DuplicateCode`.
pub fn create_establishment(conn: &Connection, new: &NewEstablishment) -> Result<Establishment> {
    new.validate()?;

    let establishment = new.clone().into_establishment(Utc::now());
    insert_establishment(conn, &establishment)?;

    log::info!(
        "created establishment {} ({})",
        establishment.code,
        establishment.display_name()
    );
    Ok(establishment)
}

/// Raw insert; the UNIQUE(code) violation is the duplicate signal.
pub(crate) fn insert_establishment(conn: &Connection, e: &Establishment) -> Result<()> {
    let result = conn.execute(
        &format!(
            "INSERT INTO establishments ({}) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)",
            ESTABLISHMENT_COLUMNS
        ),
        params![
            e.id,
            e.code,
            e.name,
            e.alias,
            e.address,
            e.district,
            e.city,
            e.kind,
            e.establishment_type,
            e.supervisor,
            e.scope,
            e.premises,
            e.lat,
            e.lon,
            e.observations,
            e.level,
            e.modality,
            e.enrollment,
            e.male_enrollment,
            e.female_enrollment,
            e.sections,
            e.shifts,
            e.internet_connection,
            e.link_plan,
            e.infrastructure_plan,
            e.created_at,
            e.updated_at,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(RegistryError::DuplicateCode(e.code)),
        Err(err) => Err(err.into()),
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Overwrite every mutable field with the given record. The id selects the row.
pub fn update_establishment(conn: &Connection, establishment: &Establishment) -> Result<Establishment> {
    patch_establishment(conn, &establishment.id, &EstablishmentPatch::from(establishment))
}

/// Apply a partial update and return the stored row.
///
/// A new business code is carried over to the contact and program rows by
/// the store (`ON UPDATE CASCADE`).
pub fn patch_establishment(
    conn: &Connection,
    id: &EstablishmentId,
    patch: &EstablishmentPatch,
) -> Result<Establishment> {
    if let Some(code) = patch.code {
        if !code.is_valid() {
            return Err(RegistryError::invalid("code", "must be a positive number"));
        }
    }

    if patch.is_empty() {
        return get_establishment(conn, id);
    }
    let assignments = patch_assignments(patch);

    let mut sets = Vec::with_capacity(assignments.len() + 1);
    let mut values: Vec<Box<dyn ToSql>> = Vec::with_capacity(assignments.len() + 2);
    for (column, value) in assignments {
        values.push(value);
        sets.push(format!("{} = ?{}", column, values.len()));
    }
    values.push(Box::new(Utc::now()));
    sets.push(format!("updated_at = ?{}", values.len()));
    values.push(Box::new(id.clone()));

    let sql = format!(
        "UPDATE establishments SET {} WHERE id = ?{} RETURNING {}",
        sets.join(", "),
        values.len(),
        ESTABLISHMENT_COLUMNS
    );

    let updated = conn
        .query_row(&sql, params_from_iter(values.iter()), row_to_establishment)
        .optional();

    match updated {
        Ok(Some(establishment)) => {
            log::info!("updated establishment {} ({} fields)", establishment.code, sets.len() - 1);
            Ok(establishment)
        }
        Ok(None) => Err(RegistryError::NotFound(id.to_string())),
        Err(err) if is_unique_violation(&err) => {
            Err(RegistryError::DuplicateCode(patch.code.unwrap_or_default()))
        }
        Err(err) => Err(err.into()),
    }
}

type Assignment = (&'static str, Box<dyn ToSql>);

fn patch_assignments(patch: &EstablishmentPatch) -> Vec<Assignment> {
    fn set<T: ToSql + Clone + 'static>(out: &mut Vec<Assignment>, column: &'static str, value: &Option<T>) {
        if let Some(v) = value {
            out.push((column, Box::new(v.clone())));
        }
    }

    let mut out = Vec::new();
    set(&mut out, "code", &patch.code);
    set(&mut out, "name", &patch.name);
    set(&mut out, "alias", &patch.alias);
    set(&mut out, "address", &patch.address);
    set(&mut out, "district", &patch.district);
    set(&mut out, "city", &patch.city);
    set(&mut out, "kind", &patch.kind);
    set(&mut out, "establishment_type", &patch.establishment_type);
    set(&mut out, "supervisor", &patch.supervisor);
    set(&mut out, "scope", &patch.scope);
    set(&mut out, "premises", &patch.premises);
    set(&mut out, "lat", &patch.lat);
    set(&mut out, "lon", &patch.lon);
    set(&mut out, "observations", &patch.observations);
    set(&mut out, "level", &patch.level);
    set(&mut out, "modality", &patch.modality);
    set(&mut out, "enrollment", &patch.enrollment);
    set(&mut out, "male_enrollment", &patch.male_enrollment);
    set(&mut out, "female_enrollment", &patch.female_enrollment);
    set(&mut out, "sections", &patch.sections);
    set(&mut out, "shifts", &patch.shifts);
    set(&mut out, "internet_connection", &patch.internet_connection);
    set(&mut out, "link_plan", &patch.link_plan);
    set(&mut out, "infrastructure_plan", &patch.infrastructure_plan);
    out
}

// ============================================================================
// CONTACT / EQUIPMENT UPSERTS
// ============================================================================

/// Insert or update the contact for `contact.code`. The contact id is kept
/// across updates.
pub fn upsert_contact(conn: &Connection, contact: &Contact) -> Result<Contact> {
    if find_by_code(conn, contact.code)?.is_none() {
        return Err(RegistryError::NotFound(format!("code {}", contact.code)));
    }

    let stored = conn.query_row(
        &format!(
            "INSERT INTO contacts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(code) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name = excluded.last_name,
                 role = excluded.role,
                 phone = excluded.phone,
                 email = excluded.email,
                 district = excluded.district,
                 supervisor = excluded.supervisor,
                 updated_at = excluded.updated_at
             RETURNING {}",
            CONTACT_COLUMNS, CONTACT_COLUMNS
        ),
        params![
            uuid::Uuid::new_v4().to_string(),
            contact.code,
            contact.first_name,
            contact.last_name,
            contact.role,
            contact.phone,
            contact.email,
            contact.district,
            contact.supervisor,
            Utc::now(),
        ],
        row_to_contact,
    )?;

    log::info!("saved contact for {}", stored.code);
    Ok(stored)
}

/// Insert or update the equipment row of `equipment.establishment_id`.
///
/// Per-level records are written only when present; on update an absent one
/// keeps what is stored. Delivered programs are always written.
pub fn upsert_equipment(conn: &Connection, equipment: &Equipment) -> Result<Equipment> {
    get_establishment(conn, &equipment.establishment_id)?;

    let counters = [
        ("laptops", equipment.laptops),
        ("tablets", equipment.tablets),
        ("robotics_kits", equipment.robotics_kits),
        ("printers_3d", equipment.printers_3d),
    ];
    for (field, value) in counters {
        if value < 0 {
            return Err(RegistryError::invalid(field, "must not be negative"));
        }
    }

    let programs = serde_json::to_string(&equipment.programs_delivered)?;
    let initial = encode_json_field(equipment.initial.as_ref())?;
    let primary = encode_json_field(equipment.primary.as_ref())?;
    let secondary = encode_json_field(equipment.secondary.as_ref())?;

    let stored = conn.query_row(
        &format!(
            "INSERT INTO equipment ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(establishment_id) DO UPDATE SET
                 laptops = excluded.laptops,
                 tablets = excluded.tablets,
                 robotics_kits = excluded.robotics_kits,
                 printers_3d = excluded.printers_3d,
                 other_resources = excluded.other_resources,
                 programs_delivered = excluded.programs_delivered,
                 initial_equipment = COALESCE(excluded.initial_equipment, equipment.initial_equipment),
                 primary_equipment = COALESCE(excluded.primary_equipment, equipment.primary_equipment),
                 secondary_equipment = COALESCE(excluded.secondary_equipment, equipment.secondary_equipment),
                 updated_at = excluded.updated_at
             RETURNING {}",
            EQUIPMENT_COLUMNS, EQUIPMENT_COLUMNS
        ),
        params![
            uuid::Uuid::new_v4().to_string(),
            equipment.establishment_id,
            equipment.laptops,
            equipment.tablets,
            equipment.robotics_kits,
            equipment.printers_3d,
            equipment.other_resources,
            programs,
            initial,
            primary,
            secondary,
            Utc::now(),
        ],
        row_to_equipment,
    )?;

    log::info!("saved equipment for establishment {}", stored.establishment_id);
    Ok(stored)
}

// ============================================================================
// COMPOSITE SAVE
// ============================================================================

/// Everything the detail form saves at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub establishment: Establishment,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub equipment: Option<Equipment>,
}

/// Update the establishment and upsert its contact and equipment, all or nothing.
///
/// The contact is re-keyed to the saved business code and the equipment to
/// the establishment id, whatever the request carried.
pub fn save_establishment(conn: &Connection, request: &SaveRequest) -> Result<Establishment> {
    let tx = conn.unchecked_transaction()?;

    let updated = update_establishment(&tx, &request.establishment)?;

    if let Some(contact) = &request.contact {
        let mut contact = contact.clone();
        contact.code = updated.code;
        upsert_contact(&tx, &contact)?;
    }

    if let Some(equipment) = &request.equipment {
        let mut equipment = equipment.clone();
        equipment.establishment_id = updated.id.clone();
        upsert_equipment(&tx, &equipment)?;
    }

    tx.commit()?;
    Ok(updated)
}

// ============================================================================
// DELETE
// ============================================================================

/// Delete an establishment and the rows that reference it.
///
/// Order: program enrollments, equipment, contact, establishment. The first
/// three are best-effort (a failure is logged); the last one is not, and
/// rolls the whole delete back.
pub fn delete_establishment(conn: &Connection, id: &EstablishmentId) -> Result<()> {
    let code: BusinessCode = conn
        .query_row(
            "SELECT code FROM establishments WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

    let tx = conn.unchecked_transaction()?;

    let related: [(&str, &str, &dyn ToSql); 3] = [
        ("program enrollments", "DELETE FROM program_enrollments WHERE code = ?1", &code),
        ("equipment", "DELETE FROM equipment WHERE establishment_id = ?1", id),
        ("contact", "DELETE FROM contacts WHERE code = ?1", &code),
    ];
    for (what, sql, key) in related {
        match tx.execute(sql, [key]) {
            Ok(n) => log::debug!("deleted {} {} row(s) for {}", n, what, code),
            Err(e) => log::warn!("could not delete {} for {}: {}", what, code, e),
        }
    }

    tx.execute("DELETE FROM establishments WHERE id = ?1", params![id])
        .map_err(|e| {
            log::error!("could not delete establishment {}: {}", code, e);
            e
        })?;
    tx.commit()?;

    log::info!("deleted establishment {}", code);
    Ok(())
}
