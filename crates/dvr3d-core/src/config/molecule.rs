//! Isotope masses and the coordinate type (IDIA) derived from the molecule definition.
//!
//! Masses are in units of the electron mass. Atomic weights follow R. D. Vocke, Jr.,
//! Atomic Weights of the Elements 1997.

use super::ParameterSet;
use super::positions::{DVR3DRJZ_INPUT, MOLECULE};
use crate::domain::{DvrError, DvrResult, SolverKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isotope {
    pub symbol: &'static str,
    pub atomic_number: u32,
    pub atomic_mass: f64,
}

impl Isotope {
    /// Atomic mass, or the bare nuclear mass with the `Z` electrons removed.
    pub fn mass(&self, atomic_masses: bool) -> f64 {
        if atomic_masses {
            self.atomic_mass
        } else {
            self.atomic_mass - f64::from(self.atomic_number)
        }
    }
}

const fn isotope(symbol: &'static str, atomic_number: u32, atomic_mass: f64) -> Isotope {
    Isotope {
        symbol,
        atomic_number,
        atomic_mass,
    }
}

pub const ISOTOPES: [Isotope; 10] = [
    isotope("H", 1, 1837.1526406),
    isotope("D", 1, 3671.4829282),
    isotope("T", 1, 5497.9214642),
    isotope("16O", 8, 29156.9455997),
    isotope("17O", 8, 30987.520976),
    isotope("18O", 8, 32810.46214),
    isotope("32S", 16, 58281.51933),
    isotope("33S", 16, 60103.29186),
    isotope("34S", 16, 61919.63312),
    isotope("36S", 16, 65563.97739),
];

pub fn lookup_isotope(symbol: &str) -> DvrResult<&'static Isotope> {
    ISOTOPES
        .iter()
        .find(|isotope| isotope.symbol == symbol.trim())
        .ok_or_else(|| {
            DvrError::lookup(
                "LOOKUP.ISOTOPE",
                format!("unknown isotope '{}'", symbol.trim()),
            )
        })
}

/// Masses in the order the DVR3DRJZ input expects: `[left, right, center]`.
///
/// An explicit `isotope_*_mass` wins over the table; table masses are atomic or nuclear
/// depending on `DVR3DRJZ_INPUT.atomic_masses`.
pub fn resolve_masses(params: &ParameterSet) -> DvrResult<[f64; 3]> {
    let atomic_masses = params.require_bool(DVR3DRJZ_INPUT, "atomic_masses")?;
    let mass_of = |position: &str| -> DvrResult<f64> {
        let mass_key = format!("isotope_{position}_mass");
        if let Some(mass) = params.float_value(MOLECULE, &mass_key) {
            return Ok(mass);
        }
        let symbol = params.require_str(MOLECULE, &format!("isotope_{position}"))?;
        Ok(lookup_isotope(symbol)?.mass(atomic_masses))
    };
    Ok([mass_of("left")?, mass_of("right")?, mass_of("center")?])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    Radau,
    Scattering,
}

impl CoordinateSystem {
    pub fn parse(text: &str) -> DvrResult<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "radau" => Ok(Self::Radau),
            "scattering" | "jacobi" => Ok(Self::Scattering),
            _ => Err(DvrError::lookup(
                "LOOKUP.COORDINATES",
                format!("invalid coordinates: '{}'", text.trim()),
            )),
        }
    }
}

/// IDIA control key: radau -2/-1 and scattering 2/1 for equal/unequal end atoms.
pub fn derive_idia(coordinates: CoordinateSystem, masses: &[f64; 3]) -> i64 {
    let homonuclear = masses[0].to_bits() == masses[1].to_bits();
    match (coordinates, homonuclear) {
        (CoordinateSystem::Radau, true) => -2,
        (CoordinateSystem::Radau, false) => -1,
        (CoordinateSystem::Scattering, true) => 2,
        (CoordinateSystem::Scattering, false) => 1,
    }
}

/// Restricted-basis solver matching the DVR3DRJZ coordinate type.
pub fn rotlev_variant(idia: i64) -> DvrResult<SolverKind> {
    match idia {
        -2 => Ok(SolverKind::Rotlev3b),
        -1 => Ok(SolverKind::Rotlev3),
        other => Err(DvrError::lookup(
            "LOOKUP.ROTLEV_VARIANT",
            format!("no restricted-basis solver is configured for IDIA={}", other),
        )),
    }
}
