//! Apatite saturation along a simulated cooling path.
//!
//! The scan walks the melt phase from the first sample while the trace is
//! still physically valid: SiO2 must not fall by more than
//! [`SIO2_TOLERANCE`] between samples and the remaining melt must stay at or
//! above the minimum melt percentage. The last valid sample is the stopping
//! row. The path saturation temperature is the instantaneous saturation
//! temperature at the first sample that is colder than its own saturation
//! temperature, or the highest instantaneous value seen if that never
//! happens.

use crate::apatite::{melts_m, tapatite, tapatite_p2o5};
use crate::composition::Composition;
use crate::config::SIO2_TOLERANCE;
use crate::trace::MeltTrace;

/// Outcome of scanning one melt trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// Index of the last valid sample
    pub stop_row: usize,
    /// First sample whose saturation temperature exceeds its temperature,
    /// with that saturation temperature
    pub crossing: Option<(usize, f64)>,
    /// Running maximum of the instantaneous saturation temperature
    pub t_max: f64,
    /// Instantaneous saturation temperature of every scanned sample
    pub instantaneous: Vec<f64>,
}

impl Scan {
    pub fn saturation_temperature(&self) -> f64 {
        match self.crossing {
            Some((_, ts)) => ts,
            None => self.t_max,
        }
    }
}

/// Scan `melt` until it stops being valid. `melt` must hold at least one row.
pub fn scan(melt: &MeltTrace<'_>, min_percent_melt: f64) -> Scan {
    let mut crossing = None;
    // f64::max ignores NaN, so undefined samples never lower or poison this.
    let mut t_max = f64::NAN;
    let mut instantaneous = Vec::with_capacity(melt.len());
    let mut stop_row = 0;

    for row in 0..melt.len() {
        if row > 0 {
            let silica_fell = melt.sio2[row - 1] > melt.sio2[row] + SIO2_TOLERANCE;
            let melt_exhausted = melt.mass[row] < min_percent_melt;
            if silica_fell || melt_exhausted {
                break;
            }
        }

        let ts = tapatite(melt.sio2[row], melt.p2o5[row]);
        instantaneous.push(ts);
        t_max = t_max.max(ts);
        if crossing.is_none() && ts > melt.temperature[row] {
            crossing = Some((row, ts));
        }
        stop_row = row;
    }

    Scan {
        stop_row,
        crossing,
        t_max,
        instantaneous,
    }
}

/// Everything reported for one composition
#[derive(Debug, Clone, PartialEq)]
pub struct SaturationResult {
    pub kv: f64,
    /// Bulk M cation ratio
    pub m_bulk: f64,
    /// Temperature of the first trace sample
    pub t_liquidus: f64,
    /// Saturation temperature of the bulk composition
    pub t_sat_bulk: f64,
    /// Temperature at the stopping row
    pub t_final: f64,
    /// Saturation temperature along the cooling path
    pub t_sat: f64,
    /// Equilibrium P2O5 at the stopping row
    pub p2o5_sat: f64,
    /// Melt P2O5 at the stopping row
    pub p2o5_final: f64,
    /// Melt mass percentage at the stopping row
    pub melt_final: f64,
    pub sio2_bulk: f64,
    pub p2o5_bulk: f64,
    /// Mass of apatite saturated at the stopping row
    pub apatite_mass: f64,
}

/// Column names of the result stream, in row order
pub const RESULT_HEADER: [&str; 12] = [
    "Kv", "Mbulk", "Tliq", "Tsatbulk", "Tf", "Tsat", "P2O5sat", "P2O5f", "Ff", "SiO2",
    "P2O5bulk", "MAp",
];

impl SaturationResult {
    pub fn header() -> String {
        RESULT_HEADER.join("\t")
    }

    /// Tab-separated result row. Undefined values print as `NaN`.
    pub fn to_row(&self) -> String {
        [
            self.kv,
            self.m_bulk,
            self.t_liquidus,
            self.t_sat_bulk,
            self.t_final,
            self.t_sat,
            self.p2o5_sat,
            self.p2o5_final,
            self.melt_final,
            self.sio2_bulk,
            self.p2o5_bulk,
            self.apatite_mass,
        ]
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\t")
    }
}

/// Figures that need no trace
pub fn bulk_figures(composition: &Composition) -> (f64, f64) {
    (
        melts_m(composition.oxides()),
        tapatite(composition.sio2(), composition.p2o5()),
    )
}

/// Analyze one composition against its melt trace.
pub fn analyze(
    composition: &Composition,
    melt: &MeltTrace<'_>,
    min_percent_melt: f64,
) -> SaturationResult {
    let scan = scan(melt, min_percent_melt);
    let row = scan.stop_row;

    let t_final = melt.temperature[row];
    let p2o5_final = melt.p2o5[row];
    let melt_final = melt.mass[row];
    let p2o5_sat = tapatite_p2o5(melt.sio2[row], t_final);
    let apatite_mass = if p2o5_final > p2o5_sat {
        melt_final / 100.0 * (p2o5_final - p2o5_sat)
    } else {
        0.0
    };

    let (m_bulk, t_sat_bulk) = bulk_figures(composition);

    SaturationResult {
        kv: composition.kv(),
        m_bulk,
        t_liquidus: melt.temperature[0],
        t_sat_bulk,
        t_final,
        t_sat: scan.saturation_temperature(),
        p2o5_sat,
        p2o5_final,
        melt_final,
        sio2_bulk: composition.sio2(),
        p2o5_bulk: composition.p2o5(),
        apatite_mass,
    }
}
