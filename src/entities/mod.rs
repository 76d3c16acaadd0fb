// Entity Models
//
// Establishment is the root. Two keys point at it:
// - EstablishmentId (storage identity) - used by Equipment
// - BusinessCode (provincial code)     - used by Contact and ProgramEnrollment

pub mod keys;
pub mod establishment;
pub mod contact;
pub mod equipment;
pub mod program;
pub mod connectivity;

pub use keys::{BusinessCode, EstablishmentId};
pub use establishment::{Establishment, EstablishmentPatch, NewEstablishment};
pub use contact::Contact;
pub use equipment::{Equipment, InitialEquipment, LevelEquipment};
pub use program::{parse_programs, Program, ProgramEnrollment};
pub use connectivity::{ConnectivityCategory, ConnectivityRecord};
