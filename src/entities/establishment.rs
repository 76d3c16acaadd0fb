// 🏫 Establishment Entity - the root record of the registry
//
// Identity: EstablishmentId (never changes)
// Business key: BusinessCode (unique, used by contacts and programs)
// Everything else is a value that can be edited from the dashboard.

use super::keys::{BusinessCode, EstablishmentId};
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// OPTION CATALOGS (values offered by the dashboard forms)
// ============================================================================

pub const CONNECTION_LISTING_OPTIONS: [&str; 6] = [
    "Sin enlace",
    "Sin conectividad",
    "Sin piso tecnologico",
    "Sin piso tecnologico ni enlace",
    "Con conectividad",
    "No informado",
];

pub const LINK_PLAN_OPTIONS: [&str; 5] = [
    "PBA - Plan Enlace",
    "PNCE - Conectar Igualdad",
    "PNCE - Primaria Digital",
    "Sin plan",
    "No informado",
];

pub const INFRASTRUCTURE_PLAN_OPTIONS: [&str; 4] = [
    "PBA - Piso Tecnológico",
    "PNCE - Piso Tecnológico",
    "Sin piso tecnológico",
    "No informado",
];

pub const EDUCATION_LEVEL_OPTIONS: [&str; 8] = [
    "Inicial",
    "Primario",
    "Secundario",
    "Inicial y Primario",
    "Primario y Secundario",
    "Inicial, Primario y Secundario",
    "Técnico",
    "Especial",
];

pub const MODALITY_OPTIONS: [&str; 6] = ["Común", "Técnica", "Artística", "Especial", "Adultos", "Rural"];

// ============================================================================
// ESTABLISHMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
    /// Server-managed; a saved form may leave it and the timestamps out.
    #[serde(default)]
    pub id: EstablishmentId,
    pub code: BusinessCode,

    // General data
    pub name: Option<String>,
    /// Short display name
    pub alias: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub kind: Option<String>,
    pub establishment_type: Option<String>,
    /// Administrative assignment (who is in charge)
    pub supervisor: Option<String>,
    /// Urban / rural ambit
    pub scope: Option<String>,
    /// Plot number the building sits on
    pub premises: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub observations: Option<String>,

    // Academic data
    pub level: Option<String>,
    pub modality: Option<String>,
    pub enrollment: Option<i64>,
    pub male_enrollment: Option<i64>,
    pub female_enrollment: Option<i64>,
    pub sections: Option<i64>,
    pub shifts: Option<String>,

    // Connectivity
    pub internet_connection: Option<String>,
    pub link_plan: Option<String>,
    pub infrastructure_plan: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Establishment {
    /// Alias when present, otherwise the official name.
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .or(self.name.as_deref())
            .unwrap_or("(unnamed)")
    }
}

// ============================================================================
// NEW ESTABLISHMENT (creation form / CSV import row)
// ============================================================================

/// Fields accepted when creating an establishment.
///
/// The six required fields mirror the creation form; the rest are optional
/// so a CSV import can carry a full record. Spanish column names from the
/// provincial exports are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEstablishment {
    #[serde(alias = "cue")]
    pub code: BusinessCode,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "distrito")]
    pub district: String,
    #[serde(alias = "ciudad")]
    pub city: String,
    #[serde(alias = "direccion")]
    pub address: String,
    #[serde(alias = "nivel")]
    pub level: String,

    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, alias = "modalidad")]
    pub modality: Option<String>,
    #[serde(default, alias = "turnos")]
    pub shifts: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default, alias = "tipo")]
    pub kind: Option<String>,
    #[serde(default, alias = "tipo_establecimiento")]
    pub establishment_type: Option<String>,
    #[serde(default, alias = "fed_a_cargo")]
    pub supervisor: Option<String>,
    #[serde(default, alias = "ambito")]
    pub scope: Option<String>,
    #[serde(default, alias = "predio")]
    pub premises: Option<i64>,
    #[serde(default, alias = "matricula")]
    pub enrollment: Option<i64>,
    #[serde(default, alias = "varones")]
    pub male_enrollment: Option<i64>,
    #[serde(default, alias = "mujeres")]
    pub female_enrollment: Option<i64>,
    #[serde(default, alias = "secciones")]
    pub sections: Option<i64>,
    #[serde(default, alias = "listado_conexion_internet")]
    pub internet_connection: Option<String>,
    #[serde(default, alias = "plan_enlace")]
    pub link_plan: Option<String>,
    #[serde(default, alias = "plan_piso_tecnologico")]
    pub infrastructure_plan: Option<String>,
}

impl NewEstablishment {
    /// Required-field checks done before touching the store.
    pub fn validate(&self) -> Result<()> {
        if !self.code.is_valid() {
            return Err(RegistryError::invalid("code", "must be a positive number"));
        }

        let required = [
            ("name", &self.name),
            ("district", &self.district),
            ("city", &self.city),
            ("address", &self.address),
            ("level", &self.level),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(RegistryError::invalid(field, "is required"));
            }
        }

        Ok(())
    }

    /// Build the stored record. Blank optional strings become `None`.
    pub fn into_establishment(self, now: DateTime<Utc>) -> Establishment {
        Establishment {
            id: EstablishmentId::generate(),
            code: self.code,
            name: Some(self.name.trim().to_string()),
            alias: non_blank(self.alias),
            address: Some(self.address.trim().to_string()),
            district: Some(self.district.trim().to_string()),
            city: Some(self.city.trim().to_string()),
            kind: non_blank(self.kind),
            establishment_type: non_blank(self.establishment_type),
            supervisor: non_blank(self.supervisor),
            scope: non_blank(self.scope),
            premises: self.premises,
            lat: self.lat,
            lon: self.lon,
            observations: None,
            level: Some(self.level.trim().to_string()),
            modality: non_blank(self.modality),
            enrollment: self.enrollment,
            male_enrollment: self.male_enrollment,
            female_enrollment: self.female_enrollment,
            sections: self.sections,
            shifts: non_blank(self.shifts),
            internet_connection: non_blank(self.internet_connection),
            link_plan: non_blank(self.link_plan),
            infrastructure_plan: non_blank(self.infrastructure_plan),
            created_at: now,
            updated_at: now,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ============================================================================
// PATCH (partial update)
// ============================================================================

/// Partial update of an establishment.
///
/// Outer `None` = field absent, keep the stored value.
/// `Some(None)` = explicit `null`, clear the stored value.
/// `Some(Some(v))` = set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstablishmentPatch {
    #[serde(default)]
    pub code: Option<BusinessCode>,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub alias: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub district: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub kind: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub establishment_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub supervisor: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub scope: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub premises: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lat: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub lon: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub observations: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub level: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub modality: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub enrollment: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub male_enrollment: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub female_enrollment: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sections: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub shifts: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub internet_connection: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub link_plan: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub infrastructure_plan: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl EstablishmentPatch {
    pub fn is_empty(&self) -> bool {
        *self == EstablishmentPatch::default()
    }
}

/// A full record as a patch that overwrites every mutable field.
impl From<&Establishment> for EstablishmentPatch {
    fn from(e: &Establishment) -> Self {
        EstablishmentPatch {
            code: Some(e.code),
            name: Some(e.name.clone()),
            alias: Some(e.alias.clone()),
            address: Some(e.address.clone()),
            district: Some(e.district.clone()),
            city: Some(e.city.clone()),
            kind: Some(e.kind.clone()),
            establishment_type: Some(e.establishment_type.clone()),
            supervisor: Some(e.supervisor.clone()),
            scope: Some(e.scope.clone()),
            premises: Some(e.premises),
            lat: Some(e.lat),
            lon: Some(e.lon),
            observations: Some(e.observations.clone()),
            level: Some(e.level.clone()),
            modality: Some(e.modality.clone()),
            enrollment: Some(e.enrollment),
            male_enrollment: Some(e.male_enrollment),
            female_enrollment: Some(e.female_enrollment),
            sections: Some(e.sections),
            shifts: Some(e.shifts.clone()),
            internet_connection: Some(e.internet_connection.clone()),
            link_plan: Some(e.link_plan.clone()),
            infrastructure_plan: Some(e.infrastructure_plan.clone()),
        }
    }
}
