//! Gas concentration curves and alert classification.
//!
//! Each supported gas has an empirical power-law fit of the MQ-135
//! sensitivity curve, inverted to `ppm = (Rs/R0 ÷ A) ^ (1/B)`.  The
//! constants are the widely used datasheet curve fits; no accuracy beyond
//! those fits is claimed.

use serde::Serialize;

/// Closed set of gases the engine reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum GasId {
    Nh3 = 0,
    Nox = 1,
    Co2 = 2,
    Alcohol = 3,
    Benzene = 4,
}

impl GasId {
    pub const COUNT: usize = 5;

    /// Every gas, in report order.
    pub const ALL: [GasId; Self::COUNT] = [
        GasId::Nh3,
        GasId::Nox,
        GasId::Co2,
        GasId::Alcohol,
        GasId::Benzene,
    ];

    pub fn profile(self) -> &'static GasProfile {
        &GAS_PROFILES[self as usize]
    }
}

/// Alert severity, ordered `Ok < Warning < Danger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Level {
    Ok,
    Warning,
    Danger,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
        }
    }
}

/// Static curve and threshold data for one gas.
#[derive(Debug)]
pub struct GasProfile {
    pub id: GasId,
    pub name: &'static str,
    pub unit: &'static str,
    /// Curve scale `A`.
    pub a: f32,
    /// Curve exponent `B` (negative: resistance falls as gas rises).
    pub b: f32,
    pub warning: f32,
    pub danger: f32,
}

/// Indexed by `GasId as usize`.
pub static GAS_PROFILES: [GasProfile; GasId::COUNT] = [
    GasProfile {
        id: GasId::Nh3,
        name: "NH3",
        unit: "ppm",
        a: 102.2,
        b: -2.473,
        warning: 25.0,
        danger: 50.0,
    },
    GasProfile {
        id: GasId::Nox,
        name: "NOx",
        unit: "ppm",
        a: 34.668,
        b: -3.369,
        warning: 5.0,
        danger: 20.0,
    },
    GasProfile {
        id: GasId::Co2,
        name: "CO2",
        unit: "ppm",
        a: 110.47,
        b: -2.862,
        warning: 1000.0,
        danger: 5000.0,
    },
    GasProfile {
        id: GasId::Alcohol,
        name: "Alcohol",
        unit: "ppm",
        a: 77.255,
        b: -3.18,
        warning: 200.0,
        danger: 1000.0,
    },
    GasProfile {
        id: GasId::Benzene,
        name: "Benzene",
        unit: "ppm",
        a: 44.947,
        b: -3.445,
        warning: 5.0,
        danger: 10.0,
    },
];

/// Display-only scale applied to CO2 ppm to derive its percentage figure.
pub const CO2_PERCENT_DIVISOR: f32 = 10_000.0;

impl GasProfile {
    /// Concentration for a given Rs/R0 ratio, never negative.
    pub fn ppm(&self, ratio: f32) -> f32 {
        (ratio / self.a).powf(1.0 / self.b).max(0.0)
    }

    /// Inclusive thresholds: the boundary value takes the higher severity.
    pub fn classify(&self, ppm: f32) -> Level {
        if ppm >= self.danger {
            Level::Danger
        } else if ppm >= self.warning {
            Level::Warning
        } else {
            Level::Ok
        }
    }
}

/// CO2 percentage as shown on the console.
pub fn co2_percent(ppm: f32) -> f32 {
    ppm / CO2_PERCENT_DIVISOR * 100.0
}

/// One gas's share of a [`Concentrations`] result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GasReading {
    pub gas: GasId,
    pub ppm: f32,
    pub level: Level,
    /// Present only for CO2.
    pub percent: Option<f32>,
}

/// Output of the concentration engine for one (Rs, R0) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Concentrations {
    pub ratio: f32,
    pub gases: [GasReading; GasId::COUNT],
}

impl Concentrations {
    pub fn get(&self, gas: GasId) -> &GasReading {
        &self.gases[gas as usize]
    }

    /// Highest severity across all gases.
    pub fn worst_level(&self) -> Level {
        self.gases
            .iter()
            .map(|g| g.level)
            .max()
            .unwrap_or(Level::Ok)
    }
}

/// Evaluate every gas curve for a valid `rs_kohm` / `r0_kohm` pair.
///
/// Callers guarantee both are positive; an invalid Rs must stop the read
/// cycle before this point.
pub fn evaluate(rs_kohm: f32, r0_kohm: f32) -> Concentrations {
    let ratio = rs_kohm / r0_kohm;
    let gases = GasId::ALL.map(|gas| {
        let profile = gas.profile();
        let ppm = profile.ppm(ratio);
        GasReading {
            gas,
            ppm,
            level: profile.classify(ppm),
            percent: (gas == GasId::Co2).then(|| co2_percent(ppm)),
        }
    });
    Concentrations { ratio, gases }
}
