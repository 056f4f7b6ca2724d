use std::path::Path;

use crate::config::MELT_PHASE;
use crate::error::TapatiteError;

/// One labeled column of a phase table
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub values: Vec<f64>,
}

/// All samples of one phase, column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Phase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Append a column, builder style
    pub fn with_column(mut self, label: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push(Column {
            label: label.into(),
            values,
        });
        self
    }

    pub fn column(&self, label: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.values.as_slice())
    }

    fn require(&self, label: &str) -> Result<&[f64], TapatiteError> {
        self.column(label)
            .ok_or_else(|| TapatiteError::MissingColumn {
                phase: self.name.clone(),
                column: label.to_string(),
            })
    }
}

/// Simulated cooling path of one composition, phases in simulator order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoolingTrace {
    pub phases: Vec<Phase>,
}

impl CoolingTrace {
    pub fn new(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Read a MELTS `Phase_main_tbl.txt`.
    pub fn load(path: &Path) -> Result<Self, TapatiteError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Parse blank-line-separated phase blocks: a line starting with the
    /// phase name, a line of column labels, then numeric rows. Blocks that
    /// do not have this shape are skipped.
    pub fn parse(content: &str) -> Self {
        let mut phases = Vec::new();
        let mut block: Vec<&str> = Vec::new();

        for line in content.lines().chain(std::iter::once("")) {
            if line.trim().is_empty() {
                if let Some(phase) = parse_block(&block) {
                    phases.push(phase);
                }
                block.clear();
            } else {
                block.push(line);
            }
        }

        Self::new(phases)
    }

    /// The melt phase, which must come first.
    pub fn melt(&self) -> Result<MeltTrace<'_>, TapatiteError> {
        let phase = self
            .phases
            .first()
            .ok_or_else(|| TapatiteError::NoLiquid("no phases in output".into()))?;
        if phase.name != MELT_PHASE {
            return Err(TapatiteError::NoLiquid(format!(
                "first phase is {}",
                phase.name
            )));
        }
        MeltTrace::new(phase)
    }
}

fn parse_block(block: &[&str]) -> Option<Phase> {
    let (name_line, rest) = block.split_first()?;
    let (label_line, rows) = rest.split_first()?;
    let name = name_line.split_whitespace().next()?;
    let labels: Vec<&str> = label_line.split_whitespace().collect();
    if labels.is_empty() || rows.is_empty() {
        return None;
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); labels.len()];
    for row in rows {
        let values: Vec<f64> = row
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if values.len() != labels.len() {
            return None;
        }
        for (col, v) in columns.iter_mut().zip(values) {
            col.push(v);
        }
    }

    Some(
        labels
            .into_iter()
            .zip(columns)
            .fold(Phase::new(name), |phase, (label, values)| {
                phase.with_column(label, values)
            }),
    )
}

/// Melt-phase columns the saturation scan reads.
#[derive(Debug, Clone, Copy)]
pub struct MeltTrace<'a> {
    pub temperature: &'a [f64],
    pub mass: &'a [f64],
    pub sio2: &'a [f64],
    pub p2o5: &'a [f64],
}

impl<'a> MeltTrace<'a> {
    fn new(phase: &'a Phase) -> Result<Self, TapatiteError> {
        let melt = Self {
            temperature: phase.require("Temperature")?,
            mass: phase.require("mass")?,
            sio2: phase.require("SiO2")?,
            p2o5: phase.require("P2O5")?,
        };
        if melt.len() == 0 {
            return Err(TapatiteError::EmptyTrace);
        }
        Ok(melt)
    }

    /// Samples present in every required column
    pub fn len(&self) -> usize {
        self.temperature
            .len()
            .min(self.mass.len())
            .min(self.sio2.len())
            .min(self.p2o5.len())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Melt phase with the given per-row (T, mass, SiO2, P2O5)
    pub fn melt_phase(rows: &[(f64, f64, f64, f64)]) -> Phase {
        Phase::new(MELT_PHASE)
            .with_column("Pressure", vec![600.0; rows.len()])
            .with_column("Temperature", rows.iter().map(|r| r.0).collect())
            .with_column("mass", rows.iter().map(|r| r.1).collect())
            .with_column("SiO2", rows.iter().map(|r| r.2).collect())
            .with_column("P2O5", rows.iter().map(|r| r.3).collect())
    }

    const TABLE: &str = "\
Title: tapatite Kv 3

liquid_0 thermodynamic data and composition:
Pressure Temperature mass S H V Cp viscosity SiO2 TiO2 P2O5 H2O
600 1180 100 0 0 0 0 0 58.1 0.9 0.25 3.0
600 1170 95.5 0 0 0 0 0 58.9 0.9 0.26 3.1

olivine_0 thermodynamic data and composition:
Pressure Temperature mass S H V Cp SiO2 MgO
600 1170 4.5 0 0 0 0 40.1 49.0
";

    #[test]
    fn parse_melts_table() {
        let trace = CoolingTrace::parse(TABLE);
        assert_eq!(trace.phases.len(), 2);
        assert_eq!(trace.phases[0].name, "liquid_0");
        assert_eq!(trace.phases[0].columns.len(), 12);
        assert_eq!(trace.phases[1].name, "olivine_0");
        assert_eq!(trace.phases[0].column("SiO2"), Some(&[58.1, 58.9][..]));
        assert_eq!(
            trace.phases[1],
            Phase::new("olivine_0")
                .with_column("Pressure", vec![600.0])
                .with_column("Temperature", vec![1170.0])
                .with_column("mass", vec![4.5])
                .with_column("S", vec![0.0])
                .with_column("H", vec![0.0])
                .with_column("V", vec![0.0])
                .with_column("Cp", vec![0.0])
                .with_column("SiO2", vec![40.1])
                .with_column("MgO", vec![49.0])
        );

        let melt = trace.melt().unwrap();
        assert_eq!(melt.len(), 2);
        assert_eq!(melt.temperature, &[1180.0, 1170.0]);
        assert_eq!(melt.p2o5, &[0.25, 0.26]);
    }

    #[test]
    fn first_phase_must_be_liquid() {
        let trace = CoolingTrace::new(vec![Phase::new("olivine_0").with_column("mass", vec![1.0])]);
        assert!(matches!(trace.melt(), Err(TapatiteError::NoLiquid(_))));
        assert!(matches!(
            CoolingTrace::default().melt(),
            Err(TapatiteError::NoLiquid(_))
        ));
    }

    #[test]
    fn missing_column_is_reported() {
        let trace = CoolingTrace::new(vec![Phase::new(MELT_PHASE)
            .with_column("Temperature", vec![1000.0])
            .with_column("mass", vec![100.0])
            .with_column("SiO2", vec![60.0])]);
        match trace.melt() {
            Err(TapatiteError::MissingColumn { column, .. }) => assert_eq!(column, "P2O5"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_melt_is_rejected() {
        let trace = CoolingTrace::new(vec![melt_phase(&[])]);
        assert!(matches!(trace.melt(), Err(TapatiteError::EmptyTrace)));
    }

    #[test]
    fn ragged_block_is_skipped() {
        let trace = CoolingTrace::parse("liquid_0\nTemperature mass\n1000 100\n990\n");
        assert!(trace.phases.is_empty());
    }
}
