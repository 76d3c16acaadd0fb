// 🧰 Equipment Classification - education level inference and initial-level kits
//
// Both tables are fixed; nothing here touches the store.

use crate::entities::InitialEquipment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Initial,
    Primary,
    Secondary,
    Technical,
    Special,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 5] = [
        EducationLevel::Initial,
        EducationLevel::Primary,
        EducationLevel::Secondary,
        EducationLevel::Technical,
        EducationLevel::Special,
    ];

    /// Lowercase fragments that mark the level in a free-text level field.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            EducationLevel::Initial => &["inicial", "jardín", "jardin"],
            EducationLevel::Primary => &["primari"],
            EducationLevel::Secondary => &["secundari", "media"],
            EducationLevel::Technical => &["técnic", "tecnic"],
            EducationLevel::Special => &["especial"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EducationLevel::Initial => "initial",
            EducationLevel::Primary => "primary",
            EducationLevel::Secondary => "secondary",
            EducationLevel::Technical => "technical",
            EducationLevel::Special => "special",
        }
    }
}

/// Levels mentioned in a free-text level field, in canonical order.
///
/// "Inicial y Primario" gives `[Initial, Primary]`; `None` gives nothing.
pub fn infer_education_levels(level: Option<&str>) -> Vec<EducationLevel> {
    let Some(text) = level else {
        return Vec::new();
    };
    let text = text.to_lowercase();

    EducationLevel::ALL
        .into_iter()
        .filter(|lvl| lvl.keywords().iter().any(|k| text.contains(k)))
        .collect()
}

/// A fixed device bundle for an initial-level establishment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kit {
    code: char,
    /// Largest section count the kit covers; `None` for the open-ended last kit
    pub max_sections: Option<i64>,
    pub equipment: InitialEquipment,
}

impl Kit {
    pub fn code(&self) -> char {
        self.code
    }
}

const fn bundle(scale: u32, pdi: u32, servers: u32) -> InitialEquipment {
    InitialEquipment {
        tablets: 10 * scale,
        notebook_docente: scale + 1,
        robotitas: 2 * scale,
        tarjetas_didacticas: 2 * scale,
        parlante_bluetooth: scale,
        disco_externo: 1,
        proyector: 1,
        pdi,
        ecap_servidor: servers,
        carro_carga: scale,
    }
}

/// Ordered by threshold; lookup takes the first kit whose range covers the count.
pub static KITS: [Kit; 5] = [
    Kit { code: 'A', max_sections: Some(3), equipment: bundle(1, 0, 1) },
    Kit { code: 'B', max_sections: Some(5), equipment: bundle(2, 1, 1) },
    Kit { code: 'C', max_sections: Some(10), equipment: bundle(3, 1, 1) },
    Kit { code: 'D', max_sections: Some(15), equipment: bundle(4, 2, 2) },
    Kit { code: 'E', max_sections: None, equipment: bundle(5, 2, 2) },
];

/// Kit for an initial-level establishment with `sections` sections.
/// No kit for a missing or non-positive count.
pub fn recommended_initial_kit(sections: Option<i64>) -> Option<&'static Kit> {
    let sections = sections.filter(|&n| n > 0)?;
    KITS.iter()
        .find(|kit| kit.max_sections.map_or(true, |max| sections <= max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kit(sections: Option<i64>) -> Option<char> {
        recommended_initial_kit(sections).map(Kit::code)
    }

    #[test]
    fn test_kit_thresholds() {
        assert_eq!(kit(Some(1)), Some('A'));
        assert_eq!(kit(Some(3)), Some('A'));
        assert_eq!(kit(Some(4)), Some('B'));
        assert_eq!(kit(Some(5)), Some('B'));
        assert_eq!(kit(Some(6)), Some('C'));
        assert_eq!(kit(Some(10)), Some('C'));
        assert_eq!(kit(Some(11)), Some('D'));
        assert_eq!(kit(Some(15)), Some('D'));
        assert_eq!(kit(Some(16)), Some('E'));
        assert_eq!(kit(Some(400)), Some('E'));
    }

    #[test]
    fn test_no_kit_without_sections() {
        assert_eq!(kit(Some(0)), None);
        assert_eq!(kit(Some(-2)), None);
        assert_eq!(kit(None), None);
    }

    #[test]
    fn test_kits_grow_with_size() {
        for pair in KITS.windows(2) {
            assert!(pair[0].equipment.total_devices() < pair[1].equipment.total_devices());
        }
        assert_eq!(KITS[0].equipment.tablets, 10);
        assert_eq!(KITS[4].equipment.tablets, 50);
    }

    #[test]
    fn test_infer_levels() {
        assert_eq!(
            infer_education_levels(Some("Inicial y Primario")),
            vec![EducationLevel::Initial, EducationLevel::Primary]
        );
        assert_eq!(infer_education_levels(None), vec![]);
        assert_eq!(infer_education_levels(Some("")), vec![]);
        assert_eq!(
            infer_education_levels(Some("JARDÍN de infantes")),
            vec![EducationLevel::Initial]
        );
        assert_eq!(
            infer_education_levels(Some("Escuela de Educación Secundaria Técnica")),
            vec![EducationLevel::Secondary, EducationLevel::Technical]
        );
        assert_eq!(
            infer_education_levels(Some("Media / Especial")),
            vec![EducationLevel::Secondary, EducationLevel::Special]
        );
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&EducationLevel::Technical).unwrap();
        assert_eq!(json, "\"technical\"");
        assert_eq!(EducationLevel::Special.as_str(), "special");
    }
}
