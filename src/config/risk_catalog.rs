use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Weight used for categories that are not in the catalog.
pub const DEFAULT_WEIGHT: i32 = 2;

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 5;

/// A risk category offered on the upload form.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RiskType {
    pub name: &'static str,
    pub description: &'static str,
    pub weight: i32,
    #[serde(skip)]
    pub keywords: &'static [(&'static str, i32)],
}

pub static RISK_TYPES: [RiskType; 10] = [
    RiskType {
        name: "Incendio",
        description: "Fuego, humo o materiales inflamables expuestos",
        weight: 5,
        keywords: &[("fuego", 2), ("humo", 1), ("llama", 2), ("explosi", 2), ("quemad", 1)],
    },
    RiskType {
        name: "Electrico",
        description: "Cables pelados, tableros abiertos o chispas",
        weight: 4,
        keywords: &[("cable", 1), ("chispa", 2), ("descarga", 2), ("enchufe", 1)],
    },
    RiskType {
        name: "Estructural",
        description: "Grietas, techos o muros con riesgo de colapso",
        weight: 4,
        keywords: &[("grieta", 1), ("derrumbe", 2), ("colapso", 2), ("fisura", 1)],
    },
    RiskType {
        name: "Quimico",
        description: "Derrames, fugas o sustancias peligrosas",
        weight: 4,
        keywords: &[("derrame", 1), ("toxico", 2), ("fuga", 2), ("gas", 2)],
    },
    RiskType {
        name: "Caida",
        description: "Superficies resbaladizas, huecos o trabajo en altura",
        weight: 3,
        keywords: &[("escalera", 1), ("resbal", 1), ("altura", 2), ("hueco", 1)],
    },
    RiskType {
        name: "Mecanico",
        description: "Maquinaria sin protecciones o piezas en movimiento",
        weight: 3,
        keywords: &[("maquina", 1), ("atrapa", 2), ("engranaje", 1), ("cuchilla", 2)],
    },
    RiskType {
        name: "Transito",
        description: "Circulacion de vehiculos y peatones",
        weight: 3,
        keywords: &[("choque", 2), ("vehiculo", 1), ("atropell", 2), ("semaforo", 1)],
    },
    RiskType {
        name: "Biologico",
        description: "Residuos organicos, plagas o fluidos",
        weight: 3,
        keywords: &[("sangre", 1), ("residuo", 1), ("plaga", 1), ("moho", 1)],
    },
    RiskType {
        name: "Ergonomico",
        description: "Posturas forzadas, cargas o tareas repetitivas",
        weight: 2,
        keywords: &[("postura", 1), ("carga", 1), ("repetitiv", 1)],
    },
    RiskType {
        name: "Ambiental",
        description: "Ruido, polvo, basura u olores",
        weight: 1,
        keywords: &[("ruido", 1), ("polvo", 1), ("basura", 1), ("olor", 1)],
    },
];

/// Lower-cases and strips diacritics, so "Químico" and "quimico" compare equal.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Lookup by category name, ignoring case and accents.
pub fn find(name: &str) -> Option<&'static RiskType> {
    let name = fold(name.trim());
    RISK_TYPES.iter().find(|risk| fold(risk.name) == name)
}

/// Canonical spelling of a known category, or the trimmed input otherwise.
pub fn canonical_name(name: &str) -> String {
    match find(name) {
        Some(risk) => risk.name.to_string(),
        None => name.trim().to_string(),
    }
}
