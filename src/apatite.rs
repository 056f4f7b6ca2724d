//! Closed-form apatite saturation relations of Harrison and Watson
//! (1984, GCA 48, 1467-1477) and the bulk M cation ratio.
//!
//! The forward relation uses 2.65e4 and the inverse 2.64e4, as published in
//! the source formulas. They are kept distinct on purpose; see DESIGN.md.

const FORWARD_SIO2_COEFF: f64 = 2.65e4;
const INVERSE_SIO2_COEFF: f64 = 2.64e4;

/// Apatite saturation temperature in °C for a melt with the given SiO2 and
/// P2O5 (wt%). NaN when P2O5 <= 0.
pub fn tapatite(sio2: f64, p2o5: f64) -> f64 {
    if p2o5 <= 0.0 {
        return f64::NAN;
    }
    let x = sio2 / 100.0 - 0.5;
    (8400.0 + x * FORWARD_SIO2_COEFF) / ((41.82 / p2o5).ln() + 3.1 + 12.4 * x) - 273.15
}

/// P2O5 (wt%) at apatite saturation for a melt with the given SiO2 at
/// temperature `t` (°C).
pub fn tapatite_p2o5(sio2: f64, t: f64) -> f64 {
    let x = sio2 / 100.0 - 0.5;
    41.82 / ((8400.0 + x * INVERSE_SIO2_COEFF) / (t + 273.15) - (3.1 + 12.4 * x)).exp()
}

/// Oxide molar masses (g/mol per cation), in input order SiO2..P2O5.
const CATION_MOLAR_MASS: [f64; 14] = [
    28.0844 + 15.9994 * 2.0, // SiO2
    47.867 + 15.9994 * 2.0,  // TiO2
    26.9815 + 15.9994 * 1.5, // Al2O3
    55.845 + 15.9994 * 1.5,  // Fe2O3
    51.9961 + 15.9994 * 1.5, // Cr2O3
    55.845 + 15.9994,        // FeO
    54.9380 + 15.9994,       // MnO
    24.3050 + 15.9994,       // MgO
    58.6934 + 15.9994,       // NiO
    58.9332 + 15.9994,       // CoO
    40.078 + 15.9994,        // CaO
    22.9898 + 15.9994 / 2.0, // Na2O
    39.0983 + 15.9994 / 2.0, // K2O
    30.9738 + 15.9994 * 2.5, // P2O5
];

/// M = (Na + K + 2Ca) / (Al · Si) · total cation moles.
///
/// `oxides` holds SiO2..P2O5 in input order. Missing trailing oxides count
/// as zero.
pub fn melts_m(oxides: &[f64]) -> f64 {
    let mut moles = [0.0; 14];
    for (i, (wt, mass)) in oxides.iter().zip(CATION_MOLAR_MASS.iter()).enumerate() {
        moles[i] = wt / mass;
    }
    let si = moles[0];
    let al = moles[2];
    let ca = moles[10];
    let na = moles[11];
    let k = moles[12];
    let total: f64 = moles.iter().sum();
    (na + k + 2.0 * ca) / (al * si) * total
}
