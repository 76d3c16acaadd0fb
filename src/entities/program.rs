// 📚 Program Entity - fixed catalog of educational programs
// An establishment's membership is the full set of rows for its business code.

use super::keys::BusinessCode;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Program {
    #[serde(rename = "Aprender Conectados – Nivel Inicial")]
    AprenderConectadosInicial,
    #[serde(rename = "Primaria Digital")]
    PrimariaDigital,
    #[serde(rename = "Programa de Alfabetización Digital (PAD)")]
    AlfabetizacionDigital,
    #[serde(rename = "Conectar Igualdad")]
    ConectarIgualdad,
    #[serde(rename = "Juana Manso")]
    JuanaManso,
    #[serde(rename = "Conectar Igualdad 2023")]
    ConectarIgualdad2023,
}

impl Program {
    pub const ALL: [Program; 6] = [
        Program::AprenderConectadosInicial,
        Program::PrimariaDigital,
        Program::AlfabetizacionDigital,
        Program::ConectarIgualdad,
        Program::JuanaManso,
        Program::ConectarIgualdad2023,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Program::AprenderConectadosInicial => "Aprender Conectados – Nivel Inicial",
            Program::PrimariaDigital => "Primaria Digital",
            Program::AlfabetizacionDigital => "Programa de Alfabetización Digital (PAD)",
            Program::ConectarIgualdad => "Conectar Igualdad",
            Program::JuanaManso => "Juana Manso",
            Program::ConectarIgualdad2023 => "Conectar Igualdad 2023",
        }
    }

    /// Exact catalog name lookup (surrounding whitespace ignored).
    pub fn from_name(name: &str) -> Option<Program> {
        let name = name.trim();
        Program::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a list of names against the catalog.
/// Fails on the first name that is not in it.
pub fn parse_programs<S: AsRef<str>>(names: &[S]) -> Result<Vec<Program>> {
    names
        .iter()
        .map(|name| {
            Program::from_name(name.as_ref())
                .ok_or_else(|| RegistryError::UnknownProgram(name.as_ref().to_string()))
        })
        .collect()
}

/// One membership row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEnrollment {
    pub id: String,
    pub code: BusinessCode,
    pub program: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_round_trip() {
        for program in Program::ALL {
            assert_eq!(Program::from_name(program.as_str()), Some(program));
            let json = serde_json::to_string(&program).unwrap();
            assert_eq!(json, format!("\"{}\"", program.as_str()));
        }
    }

    #[test]
    fn test_parse_programs_rejects_unknown() {
        let ok = parse_programs(&["Juana Manso", " Conectar Igualdad "]).unwrap();
        assert_eq!(ok, vec![Program::JuanaManso, Program::ConectarIgualdad]);

        match parse_programs(&["Juana Manso", "Plan Sarmiento"]) {
            Err(RegistryError::UnknownProgram(name)) => assert_eq!(name, "Plan Sarmiento"),
            other => panic!("expected unknown program, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_list_is_valid() {
        let empty: [&str; 0] = [];
        assert!(parse_programs(&empty).unwrap().is_empty());
    }
}
