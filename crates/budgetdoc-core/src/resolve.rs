//! Column resolution
//!
//! Budget spreadsheets arrive with headers spelled in many ways
//! (`"Línea de Negocio "`, `"LINEA DE NEGOCIO"`, `"Linea negocio 2024"`).
//! Resolution maps each canonical [`Field`] onto one actual column:
//!
//! 1. every name is normalized (diacritics removed, trimmed, lower-cased);
//!    when several columns normalize to the same name, the last one stands
//!    for it;
//! 2. candidates are tried in priority order for an exact normalized match;
//! 3. failing that, the field's hint is searched as a substring, skipping
//!    auto-generated `Unnamed: n` columns, and the lexicographically first
//!    matching column name wins.
//!
//! Exact candidate matches always beat substring matches.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::ResolveError;

/// Prefix of placeholder names given to blank header cells
const PLACEHOLDER_PREFIX: &str = "unnamed";

/// Strip diacritics, trim and lower-case a column name
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.trim().to_lowercase()
}

/// Find the column matching a list of candidates, or a substring hint.
///
/// Returns the actual (un-normalized) column name.
pub fn resolve_column<S: AsRef<str>>(
    available: &[S],
    candidates: &[S],
    hint: Option<&str>,
) -> Option<String> {
    // Later columns replace earlier ones with the same normalized name
    let normalized: BTreeMap<String, &str> = available
        .iter()
        .map(|name| (normalize_name(name.as_ref()), name.as_ref()))
        .collect();

    for candidate in candidates {
        if let Some(real) = normalized.get(&normalize_name(candidate.as_ref())) {
            return Some((*real).to_string());
        }
    }

    let sub = normalize_name(hint?);
    if sub.is_empty() {
        return None;
    }
    normalized
        .iter()
        .filter(|(norm, _)| norm.contains(&sub) && !norm.starts_with(PLACEHOLDER_PREFIX))
        .map(|(_, real)| *real)
        .min()
        .map(str::to_string)
}

// ============================================================================
// Canonical fields
// ============================================================================

/// Semantic column required by the report
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Director,
    Month,
    Year,
    BusinessLine,
    Ramo,
    Zone,
    Channel,
    SubChannel,
    Office,
    TeamLead,
    Amount,
}

impl Field {
    /// All fields in report order
    pub const ALL: [Field; 11] = [
        Field::Director,
        Field::Month,
        Field::Year,
        Field::BusinessLine,
        Field::Ramo,
        Field::Zone,
        Field::Channel,
        Field::SubChannel,
        Field::Office,
        Field::TeamLead,
        Field::Amount,
    ];

    /// Label shown to users and used in error messages
    pub fn label(self) -> &'static str {
        match self {
            Field::Director => "Director",
            Field::Month => "Mes",
            Field::Year => "Año",
            Field::BusinessLine => "Línea de negocio",
            Field::Ramo => "Ramo",
            Field::Zone => "Zona",
            Field::Channel => "Canal",
            Field::SubChannel => "Sub-Canal",
            Field::Office => "Oficina",
            Field::TeamLead => "Líder Equipo",
            Field::Amount => "Valor",
        }
    }

    /// Look a field up by its label, ignoring accents and case
    pub fn from_label(label: &str) -> Option<Field> {
        let wanted = normalize_name(label);
        Field::ALL
            .into_iter()
            .find(|f| normalize_name(f.label()) == wanted)
    }

    fn default_candidates(self) -> &'static [&'static str] {
        match self {
            Field::Director => &[
                "Director",
                "Franquicia",
                "Nombre Director",
                "Director Comercial",
            ],
            Field::Month => &["Mes"],
            Field::Year => &["Año", "Ano", "Year"],
            Field::BusinessLine => &["Línea de negocio", "Linea de negocio"],
            Field::Ramo => &["Ramo"],
            Field::Zone => &["Zona"],
            Field::Channel => &["Canal"],
            Field::SubChannel => &["Sub-Canal", "Subcanal", "Sub Canal"],
            Field::Office => &["Oficina"],
            Field::TeamLead => &["Lider Equipo", "Líder Equipo", "Lider"],
            Field::Amount => &["Valor", "Presupuesto", "Valor Total"],
        }
    }

    fn default_hint(self) -> &'static str {
        match self {
            Field::Director => "director",
            Field::Month => "mes",
            Field::Year => "an",
            Field::BusinessLine => "linea",
            Field::Ramo => "ramo",
            Field::Zone => "zona",
            Field::Channel => "canal",
            Field::SubChannel => "sub",
            Field::Office => "oficina",
            Field::TeamLead => "lider",
            Field::Amount => "valor",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How to find one field among the headers
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    /// Exact names, in priority order
    pub candidates: Vec<String>,
    /// Substring fallback
    pub hint: Option<String>,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            candidates: field
                .default_candidates()
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
            hint: Some(field.default_hint().to_string()),
            required: true,
        }
    }

    /// Try these names before the defaults
    pub fn prepend_candidates(mut self, names: impl IntoIterator<Item = String>) -> Self {
        let mut merged: Vec<String> = names.into_iter().collect();
        merged.append(&mut self.candidates);
        self.candidates = merged;
        self
    }

    pub fn hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

// ============================================================================
// Column map
// ============================================================================

/// A field bound to an actual column
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    /// Column name as it appears in the source
    pub name: String,
    /// Position in the header row
    pub index: usize,
}

/// Canonical field -> actual column, fixed once built
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: BTreeMap<Field, ResolvedColumn>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<&ResolvedColumn> {
        self.columns.get(&field)
    }

    pub fn name(&self, field: Field) -> Option<&str> {
        self.get(field).map(|c| c.name.as_str())
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.get(field).map(|c| c.index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &ResolvedColumn)> {
        self.columns.iter().map(|(f, c)| (*f, c))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Resolves every canonical field against a header row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnResolver {
    pub specs: Vec<FieldSpec>,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self {
            specs: Field::ALL.into_iter().map(FieldSpec::new).collect(),
        }
    }
}

impl ColumnResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add higher-priority candidate names for a field
    pub fn with_candidates(mut self, field: Field, names: Vec<String>) -> Self {
        if let Some(spec) = self.specs.iter_mut().find(|s| s.field == field) {
            *spec = spec.clone().prepend_candidates(names);
        }
        self
    }

    /// Look up every field without failing, in field order
    pub fn lookup<S: AsRef<str>>(&self, headers: &[S]) -> Vec<(&FieldSpec, Option<ResolvedColumn>)> {
        let names: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
        self.specs
            .iter()
            .map(|spec| {
                let candidates: Vec<&str> = spec.candidates.iter().map(String::as_str).collect();
                let column = resolve_column(&names, &candidates, spec.hint.as_deref()).map(|name| {
                    let index = names.iter().rposition(|h| *h == name).unwrap_or_default();
                    ResolvedColumn { name, index }
                });
                (spec, column)
            })
            .collect()
    }

    /// Resolve all fields.
    ///
    /// Fails with every missing required label at once.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Result<ColumnMap, ResolveError> {
        let mut columns = BTreeMap::new();
        let mut missing = Vec::new();

        for (spec, column) in self.lookup(headers) {
            match column {
                Some(column) => {
                    columns.insert(spec.field, column);
                }
                None if spec.required => missing.push(spec.field.label().to_string()),
                None => {}
            }
        }

        if missing.is_empty() {
            Ok(ColumnMap { columns })
        } else {
            Err(ResolveError::MissingColumns { labels: missing })
        }
    }
}
