// Test fixtures shared by the unit test modules

use crate::entities::{BusinessCode, Establishment, NewEstablishment};
use crate::updates::create_establishment;
use rusqlite::Connection;

pub struct SchoolSeed(pub NewEstablishment);

impl SchoolSeed {
    pub fn new(code: i64, name: &str, district: &str, city: &str) -> Self {
        SchoolSeed(NewEstablishment {
            code: BusinessCode(code),
            name: name.to_string(),
            district: district.to_string(),
            city: city.to_string(),
            address: "Calle 1 100".to_string(),
            level: "Primario".to_string(),
            ..Default::default()
        })
    }

    pub fn level(mut self, level: &str) -> Self {
        self.0.level = level.to_string();
        self
    }
}

pub fn insert_school(conn: &Connection, seed: SchoolSeed) -> Establishment {
    create_establishment(conn, &seed.0).unwrap()
}
