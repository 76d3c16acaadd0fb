// 💻 Equipment Entity - device inventory of one establishment
//
// Joined by establishment id (not by business code).
// The per-level sub-records are fixed-shape counter maps stored as JSON text;
// the store boundary (db.rs) turns them back into these structs.

use super::keys::EstablishmentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// PER-LEVEL SUB-RECORDS
// ============================================================================

/// Initial-level (kindergarten) devices. Keys are the stored JSON keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialEquipment {
    pub tablets: u32,
    pub notebook_docente: u32,
    pub robotitas: u32,
    pub tarjetas_didacticas: u32,
    pub parlante_bluetooth: u32,
    pub disco_externo: u32,
    pub proyector: u32,
    pub pdi: u32,
    pub ecap_servidor: u32,
    pub carro_carga: u32,
}

impl InitialEquipment {
    pub fn total_devices(&self) -> u64 {
        [
            self.tablets,
            self.notebook_docente,
            self.robotitas,
            self.tarjetas_didacticas,
            self.parlante_bluetooth,
            self.disco_externo,
            self.proyector,
            self.pdi,
            self.ecap_servidor,
            self.carro_carga,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }
}

/// Primary and secondary level devices share one shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelEquipment {
    pub netbooks: u32,
    pub adm_aulas_digitales: u32,
    pub kits_robotica: u32,
    pub impresora_3d: u32,
    pub pdi: u32,
    pub tablets: u32,
}

// ============================================================================
// EQUIPMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Assigned by the store on first insert; ignored on upsert input.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub establishment_id: EstablishmentId,

    #[serde(default)]
    pub laptops: i64,
    #[serde(default)]
    pub tablets: i64,
    #[serde(default)]
    pub robotics_kits: i64,
    #[serde(default)]
    pub printers_3d: i64,
    #[serde(default)]
    pub other_resources: Option<String>,
    #[serde(default)]
    pub programs_delivered: Vec<String>,

    #[serde(default)]
    pub initial: Option<InitialEquipment>,
    #[serde(default)]
    pub primary: Option<LevelEquipment>,
    #[serde(default)]
    pub secondary: Option<LevelEquipment>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Equipment {
    pub fn new(establishment_id: EstablishmentId) -> Self {
        Equipment {
            id: String::new(),
            establishment_id,
            laptops: 0,
            tablets: 0,
            robotics_kits: 0,
            printers_3d: 0,
            other_resources: None,
            programs_delivered: Vec::new(),
            initial: None,
            primary: None,
            secondary: None,
            updated_at: None,
        }
    }

    /// Primary and secondary are edited together; set both from one record.
    pub fn set_primary_and_secondary(&mut self, devices: LevelEquipment) {
        self.primary = Some(devices);
        self.secondary = Some(devices);
    }
}
