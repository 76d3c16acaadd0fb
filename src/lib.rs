// School Registry - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod entities;
pub mod db;
pub mod search;         // Query Layer
pub mod details;        // Detail Aggregator
pub mod updates;        // Update Orchestrator
pub mod statistics;     // Dashboard tiles
pub mod programs;       // Program membership
pub mod classification; // Education levels and initial kits
pub mod import;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{RegistryError, Result};
pub use entities::{
    parse_programs, BusinessCode, ConnectivityCategory, ConnectivityRecord, Contact, Equipment,
    Establishment, EstablishmentId, EstablishmentPatch, InitialEquipment, LevelEquipment,
    NewEstablishment, Program, ProgramEnrollment,
};
pub use db::{open_database, open_in_memory, setup_database};
pub use search::{search_connectivity, search_establishments, SearchFilter, SEARCH_LIMIT};
pub use details::{
    find_by_code, get_contact, get_equipment, get_establishment, get_establishment_details,
    EstablishmentDetails,
};
pub use updates::{
    create_establishment, delete_establishment, patch_establishment, save_establishment,
    update_establishment, upsert_contact, upsert_equipment, SaveRequest,
};
pub use statistics::{
    connectivity_statistics, dashboard_summary, district_count, general_statistics,
    program_statistics, total_enrollment, ConnectivityStatistics, DashboardSummary,
    GeneralStatistics, ProgramStatistics,
};
pub use programs::{get_programs, set_programs};
pub use classification::{
    infer_education_levels, recommended_initial_kit, EducationLevel, Kit, KITS,
};
pub use import::{
    import_enrollment, import_establishments, load_enrollment_csv, load_establishments_csv,
    EnrollmentRow, ImportSummary,
};
pub use config::{init_logging, Config};
