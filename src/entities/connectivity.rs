// 📡 Connectivity - derived, read-only classification of an establishment
//
// The same rule backs the `connectivity_view` SQL view (see db.rs), so
// dashboard counts and per-row labels always agree.

use super::establishment::Establishment;
use super::keys::{BusinessCode, EstablishmentId};
use serde::{Deserialize, Serialize};

/// Connection listings that mean the school has no working link.
pub const NO_CONNECTIVITY_LISTINGS: [&str; 4] = [
    "Sin enlace",
    "Sin conectividad",
    "Sin piso tecnologico",
    "Sin piso tecnologico ni enlace",
];

/// Plan prefixes, provincial first (it wins when both are present).
pub const PROVINCIAL_PLAN_PREFIX: &str = "PBA";
pub const NATIONAL_PLAN_PREFIX: &str = "PNCE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectivityCategory {
    #[serde(rename = "CON_PBA")]
    ProvincialPlan,
    #[serde(rename = "CON_PNCE")]
    NationalPlan,
    #[serde(rename = "SIN_CONECTIVIDAD")]
    NoConnectivity,
    #[serde(rename = "SIN_DATO")]
    Unknown,
}

impl ConnectivityCategory {
    pub const ALL: [ConnectivityCategory; 4] = [
        ConnectivityCategory::ProvincialPlan,
        ConnectivityCategory::NationalPlan,
        ConnectivityCategory::NoConnectivity,
        ConnectivityCategory::Unknown,
    ];

    /// Stored label, as produced by the view.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityCategory::ProvincialPlan => "CON_PBA",
            ConnectivityCategory::NationalPlan => "CON_PNCE",
            ConnectivityCategory::NoConnectivity => "SIN_CONECTIVIDAD",
            ConnectivityCategory::Unknown => "SIN_DATO",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectivityCategory::ProvincialPlan => "Provincial plan",
            ConnectivityCategory::NationalPlan => "National plan",
            ConnectivityCategory::NoConnectivity => "No connectivity",
            ConnectivityCategory::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> ConnectivityCategory {
        ConnectivityCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == label)
            .unwrap_or(ConnectivityCategory::Unknown)
    }

    pub fn classify(
        internet_connection: Option<&str>,
        link_plan: Option<&str>,
        infrastructure_plan: Option<&str>,
    ) -> ConnectivityCategory {
        let has_plan = |prefix: &str| {
            [link_plan, infrastructure_plan]
                .into_iter()
                .flatten()
                .any(|plan| starts_with_ignore_ascii_case(plan, prefix))
        };

        if has_plan(PROVINCIAL_PLAN_PREFIX) {
            return ConnectivityCategory::ProvincialPlan;
        }
        if has_plan(NATIONAL_PLAN_PREFIX) {
            return ConnectivityCategory::NationalPlan;
        }
        match internet_connection {
            Some(listing) if NO_CONNECTIVITY_LISTINGS.contains(&listing) => {
                ConnectivityCategory::NoConnectivity
            }
            _ => ConnectivityCategory::Unknown,
        }
    }

    pub fn of(establishment: &Establishment) -> ConnectivityCategory {
        ConnectivityCategory::classify(
            establishment.internet_connection.as_deref(),
            establishment.link_plan.as_deref(),
            establishment.infrastructure_plan.as_deref(),
        )
    }
}

// SQLite LIKE is ASCII case-insensitive, so the view matches this.
fn starts_with_ignore_ascii_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// One row of the connectivity view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityRecord {
    pub id: EstablishmentId,
    pub code: BusinessCode,
    pub name: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub level: Option<String>,
    pub modality: Option<String>,
    pub enrollment: Option<i64>,
    pub shifts: Option<String>,
    pub internet_connection: Option<String>,
    pub link_plan: Option<String>,
    pub infrastructure_plan: Option<String>,
    pub category: ConnectivityCategory,
}
