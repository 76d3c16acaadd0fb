// Keys - the two ways rows point at an establishment
//
// Contacts and program enrollments join on the business code,
// equipment joins on the opaque establishment id. Keeping them as
// distinct types stops one from being passed where the other is expected.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ESTABLISHMENT ID (storage identity)
// ============================================================================

/// Opaque establishment identifier (UUID v4). Never changes once created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstablishmentId(pub String);

impl EstablishmentId {
    pub fn generate() -> Self {
        EstablishmentId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EstablishmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EstablishmentId {
    fn from(s: &str) -> Self {
        EstablishmentId(s.to_string())
    }
}

impl From<String> for EstablishmentId {
    fn from(s: String) -> Self {
        EstablishmentId(s)
    }
}

impl ToSql for EstablishmentId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for EstablishmentId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(EstablishmentId)
    }
}

// ============================================================================
// BUSINESS CODE (provincial establishment number)
// ============================================================================

/// Provincial business code of an establishment. Unique, positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessCode(pub i64);

impl BusinessCode {
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for BusinessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BusinessCode {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(BusinessCode)
    }
}

impl ToSql for BusinessCode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for BusinessCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(BusinessCode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_code_parsing() {
        assert_eq!("60001234".parse::<BusinessCode>().unwrap(), BusinessCode(60001234));
        assert_eq!(" 42 ".parse::<BusinessCode>().unwrap(), BusinessCode(42));
        assert!("12abc".parse::<BusinessCode>().is_err());
        assert!(!BusinessCode(0).is_valid());
        assert!(BusinessCode(1).is_valid());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = EstablishmentId::generate();
        let b = EstablishmentId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_keys_serialize_transparently() {
        let json = serde_json::to_string(&BusinessCode(7)).unwrap();
        assert_eq!(json, "7");
        let id: EstablishmentId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id, EstablishmentId::from("abc"));
    }
}
