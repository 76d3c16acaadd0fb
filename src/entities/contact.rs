// 📇 Contact Entity - the establishment's contact person
// Joined to the establishment by business code, at most one per code.

use super::keys::BusinessCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Assigned by the store on first insert; ignored on upsert input.
    #[serde(default)]
    pub id: String,
    /// Taken from the establishment when saved through it
    #[serde(default)]
    pub code: BusinessCode,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub supervisor: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn new(code: BusinessCode) -> Self {
        Contact {
            id: String::new(),
            code,
            first_name: None,
            last_name: None,
            role: None,
            phone: None,
            email: None,
            district: None,
            supervisor: None,
            updated_at: None,
        }
    }

    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
