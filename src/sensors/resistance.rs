//! Voltage-divider model for the MQ-135 sensing element.
//!
//! The sensor sits between the supply and the ADC node, with the load
//! resistor to ground, so `Rs = RL × (Vsupply − Vout) / Vout`.  The supply is
//! taken as a fixed 5.0 V logical scale regardless of the board's actual
//! rail; every stored R0 and curve constant was derived against that scale.

/// Logical supply voltage used by the divider equation.
pub const SUPPLY_VOLTS: f32 = 5.0;

/// Sensor resistance (kΩ) for an output voltage across `load_kohm`.
///
/// Returns `None` when the voltage is non-positive or the resulting
/// resistance is not strictly positive (output at or above the supply).
pub fn to_rs(volts: f32, load_kohm: f32) -> Option<f32> {
    if !(volts > 0.0) {
        return None;
    }
    let rs = load_kohm * (SUPPLY_VOLTS - volts) / volts;
    (rs > 0.0 && rs.is_finite()).then_some(rs)
}

/// Reference resistance R0 from a clean-air average Rs.
pub fn to_r0(average_rs: f32, clean_air_ratio: f32) -> Option<f32> {
    if !(average_rs > 0.0) || !(clean_air_ratio > 0.0) {
        return None;
    }
    let r0 = average_rs / clean_air_ratio;
    r0.is_finite().then_some(r0)
}
