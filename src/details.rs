// Detail Aggregator - one establishment with its related rows
//
// Contact is looked up by business code, equipment by establishment id.
// Missing related rows are not errors.

use crate::db::{
    row_to_contact, row_to_equipment, row_to_establishment, CONTACT_COLUMNS, EQUIPMENT_COLUMNS,
    ESTABLISHMENT_COLUMNS,
};
use crate::entities::{BusinessCode, Contact, Equipment, Establishment, EstablishmentId};
use crate::error::{RegistryError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentDetails {
    pub establishment: Establishment,
    pub contact: Option<Contact>,
    pub equipment: Option<Equipment>,
}

/// Fetch one establishment; `NotFound` when the id is unknown.
pub fn get_establishment(conn: &Connection, id: &EstablishmentId) -> Result<Establishment> {
    conn.query_row(
        &format!("SELECT {} FROM establishments WHERE id = ?1", ESTABLISHMENT_COLUMNS),
        params![id],
        row_to_establishment,
    )
    .optional()?
    .ok_or_else(|| RegistryError::NotFound(id.to_string()))
}

pub fn find_by_code(conn: &Connection, code: BusinessCode) -> Result<Option<Establishment>> {
    let establishment = conn
        .query_row(
            &format!("SELECT {} FROM establishments WHERE code = ?1", ESTABLISHMENT_COLUMNS),
            params![code],
            row_to_establishment,
        )
        .optional()?;
    Ok(establishment)
}

pub fn get_contact(conn: &Connection, code: BusinessCode) -> Result<Option<Contact>> {
    let contact = conn
        .query_row(
            &format!("SELECT {} FROM contacts WHERE code = ?1", CONTACT_COLUMNS),
            params![code],
            row_to_contact,
        )
        .optional()?;
    Ok(contact)
}

pub fn get_equipment(conn: &Connection, id: &EstablishmentId) -> Result<Option<Equipment>> {
    let equipment = conn
        .query_row(
            &format!("SELECT {} FROM equipment WHERE establishment_id = ?1", EQUIPMENT_COLUMNS),
            params![id],
            row_to_equipment,
        )
        .optional()?;
    Ok(equipment)
}

pub fn get_establishment_details(
    conn: &Connection,
    id: &EstablishmentId,
) -> Result<EstablishmentDetails> {
    let establishment = get_establishment(conn, id)?;
    let contact = get_contact(conn, establishment.code)?;
    let equipment = get_equipment(conn, id)?;

    log::debug!(
        "details for {}: contact={} equipment={}",
        establishment.code,
        contact.is_some(),
        equipment.is_some()
    );

    Ok(EstablishmentDetails {
        establishment,
        contact,
        equipment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::entities::InitialEquipment;
    use crate::testing::{insert_school, SchoolSeed};

    #[test]
    fn test_unknown_id_is_not_found() {
        let conn = open_in_memory().unwrap();
        let result = get_establishment_details(&conn, &EstablishmentId::from("missing"));
        assert!(matches!(result, Err(RegistryError::NotFound(id)) if id == "missing"));
    }

    #[test]
    fn test_details_without_related_rows() {
        let conn = open_in_memory().unwrap();
        let school = insert_school(&conn, SchoolSeed::new(42, "Escuela 42", "Tigre", "Tigre"));

        let details = get_establishment_details(&conn, &school.id).unwrap();
        assert_eq!(details.establishment, school);
        assert_eq!(details.contact, None);
        assert_eq!(details.equipment, None);

        let json = serde_json::to_value(&details).unwrap();
        assert!(json["contact"].is_null());
        assert!(json["equipment"].is_null());
    }

    #[test]
    fn test_details_decode_legacy_json_columns() {
        let conn = open_in_memory().unwrap();
        let school = insert_school(&conn, SchoolSeed::new(43, "Jardín 43", "Tigre", "Tigre"));

        // A row written by an older client: one double-encoded, one blank
        let double = serde_json::to_string(r#"{"tablets": 3, "notebook_docente": 1}"#).unwrap();
        conn.execute(
            "INSERT INTO equipment (id, establishment_id, programs_delivered,
                                    initial_equipment, primary_equipment, updated_at)
             VALUES ('eq1', ?1, '[\"Juana Manso\"]', ?2, '', '2024-03-01 10:00:00+00:00')",
            params![school.id, double],
        )
        .unwrap();

        let equipment = get_establishment_details(&conn, &school.id)
            .unwrap()
            .equipment
            .unwrap();

        assert_eq!(
            equipment.initial,
            Some(InitialEquipment {
                tablets: 3,
                notebook_docente: 1,
                ..Default::default()
            })
        );
        assert_eq!(equipment.primary, None);
        assert_eq!(equipment.secondary, None);
        assert_eq!(equipment.programs_delivered, vec!["Juana Manso".to_string()]);
    }

    #[test]
    fn test_find_by_code() {
        let conn = open_in_memory().unwrap();
        let school = insert_school(&conn, SchoolSeed::new(44, "Escuela 44", "Tigre", "Tigre"));

        assert_eq!(find_by_code(&conn, BusinessCode(44)).unwrap(), Some(school));
        assert_eq!(find_by_code(&conn, BusinessCode(45)).unwrap(), None);
    }
}
