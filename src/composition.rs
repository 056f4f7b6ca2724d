use std::path::Path;

use crate::error::TapatiteError;

/// Number of fields in one input record
pub const FIELD_COUNT: usize = 18;
/// Leading oxide fields (SiO2 through P2O5)
pub const OXIDE_COUNT: usize = 14;

/// Input record layout, in order.
pub static FIELDS: [&str; FIELD_COUNT] = [
    "SiO2", "TiO2", "Al2O3", "Fe2O3", "Cr2O3", "FeO", "MnO", "MgO", "NiO", "CoO", "CaO", "Na2O",
    "K2O", "P2O5", "CO2", "H2O", "Zr", "Kv",
];

const SIO2: usize = 0;
const P2O5: usize = 13;
const KV: usize = 17;

/// One whole-rock composition, immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    fields: [f64; FIELD_COUNT],
}

impl Composition {
    pub fn new(fields: [f64; FIELD_COUNT]) -> Self {
        Self { fields }
    }

    /// SiO2 through P2O5, wt%
    pub fn oxides(&self) -> &[f64] {
        &self.fields[..OXIDE_COUNT]
    }

    /// Oxides plus CO2 and H2O, the part handed to the simulator
    pub fn melts_components(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FIELDS[..16].iter().copied().zip(self.fields[..16].iter().copied())
    }

    pub fn sio2(&self) -> f64 {
        self.fields[SIO2]
    }

    pub fn p2o5(&self) -> f64 {
        self.fields[P2O5]
    }

    /// Caller-assigned identifier, used only for labeling
    pub fn kv(&self) -> f64 {
        self.fields[KV]
    }

    /// Tab-separated raw fields
    pub fn echo(&self) -> String {
        self.fields
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// Ordered compositions; identity is the row index.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub compositions: Vec<Composition>,
}

impl Batch {
    pub fn load(path: &Path) -> Result<Self, TapatiteError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse comma-separated rows of exactly [`FIELD_COUNT`] numbers.
    ///
    /// Blank lines are skipped. A first line with no numeric cell at all is
    /// taken as a header; any other unparseable line is an error.
    pub fn parse(content: &str) -> Result<Self, TapatiteError> {
        let mut compositions = Vec::new();
        let mut seen_first = false;

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let cells: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            let parsed: Result<Vec<f64>, _> = cells.iter().map(|c| c.parse::<f64>()).collect();

            let values = match parsed {
                Ok(v) => v,
                Err(_) if !seen_first && is_header(&cells) => {
                    seen_first = true;
                    continue;
                }
                Err(e) => {
                    return Err(TapatiteError::BadBatch {
                        line: line_no,
                        reason: format!("non-numeric field: {e}"),
                    })
                }
            };
            seen_first = true;

            let fields: [f64; FIELD_COUNT] =
                values.try_into().map_err(|v: Vec<f64>| TapatiteError::BadBatch {
                    line: line_no,
                    reason: format!("expected {FIELD_COUNT} fields, found {}", v.len()),
                })?;
            compositions.push(Composition::new(fields));
        }

        Ok(Self { compositions })
    }

    pub fn len(&self) -> usize {
        self.compositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compositions.is_empty()
    }

    pub fn first(&self) -> Option<&Composition> {
        self.compositions.first()
    }
}

fn is_header(cells: &[&str]) -> bool {
    cells.iter().all(|c| c.parse::<f64>().is_err())
}
