//! Report profile: the fixed text blocks printed on every page
//!
//! Defaults reproduce the budget-allocation program layout. A TOML file can
//! override any part of it:
//!
//! ```toml
//! title_lines = ["PROGRAMA DE ASIGNACIÓN PRESUPUESTAL", "Dirección Comercial"]
//!
//! [[signatures]]
//! role = "Usuario Elaboró"
//! name = "PÉREZ Ana"
//! position = "Analista"
//!
//! [columns]
//! Director = ["Gerente", "Responsable"]
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ColumnResolver, Field};

/// One signature block of the footer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// e.g. `Usuario Elaboró`
    pub role: String,
    pub name: String,
    pub position: String,
}

impl Signature {
    pub fn new(role: &str, name: &str, position: &str) -> Self {
        Self {
            role: role.to_string(),
            name: name.to_string(),
            position: position.to_string(),
        }
    }

    /// First line of the block: `<role>: <name>`
    pub fn heading(&self) -> String {
        format!("{}: {}", self.role, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportProfile {
    /// Centered header lines
    pub title_lines: Vec<String>,
    /// Footer signature blocks, printed side by side
    pub signatures: Vec<Signature>,
    /// Optional PNG or JPEG logo shown at the right of the header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<PathBuf>,
    /// Extra column names per field label, tried before the built-in ones
    pub columns: BTreeMap<String, Vec<String>>,
}

impl Default for ReportProfile {
    fn default() -> Self {
        Self {
            title_lines: vec![
                "PROGRAMA DE ASIGNACIÓN PRESUPUESTAL".into(),
                "AXA COLPATRIA".into(),
                "Dirección de Distribución".into(),
                "SISTEMA DE INTELIGENCIA COMERCIAL".into(),
            ],
            signatures: vec![
                Signature::new(
                    "Usuario Elaboró",
                    "SANCHEZ GUERRERO Eduin Danilo",
                    "Líder SIC VID BTA Torre Colpatria",
                ),
                Signature::new(
                    "Usuario Revisó",
                    "DIAZ LOPEZ Angel Alberto",
                    "Líder CEAC VID BTA Torre Colpatria",
                ),
                Signature::new(
                    "Usuario Aprobó",
                    "ROMERO FERNANDEZ Guiovanna Andrea",
                    "Líder Canal Multilinea SEG BTA Torre Colpatria",
                ),
            ],
            logo: None,
            columns: BTreeMap::new(),
        }
    }
}

impl ReportProfile {
    /// Column resolver with this profile's extra candidates.
    ///
    /// Returns the labels that do not name a known field.
    pub fn column_resolver(&self) -> (ColumnResolver, Vec<String>) {
        let mut resolver = ColumnResolver::default();
        let mut unknown = Vec::new();
        for (label, names) in &self.columns {
            match Field::from_label(label) {
                Some(field) => resolver = resolver.with_candidates(field, names.clone()),
                None => unknown.push(label.clone()),
            }
        }
        (resolver, unknown)
    }
}
