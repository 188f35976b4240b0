//! Input records and starter scripts of the DVR3D programs.

mod dipole3b;
mod dvr3drjz;
mod rotlev;
mod spectra;
mod starter;
pub mod traits;

pub use dipole3b::Dipole3bInput;
pub use dvr3drjz::{DUMMY_PARFILE, Dvr3drjzInput, MorseParameters};
pub use rotlev::RotlevInput;
pub use spectra::SpectraInput;
pub use starter::{DUMMY_PES_FILE, DUMMY_PES_PARAMETERS, StarterScript};
pub use traits::InputRecord;

use crate::domain::{DvrError, DvrResult};

/// The legacy scripts carried two diverging default tables per record; callers pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultsProfile {
    Lite,
    Heavy,
}

impl DefaultsProfile {
    pub fn parse(text: &str) -> DvrResult<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "lite" => Ok(Self::Lite),
            "heavy" => Ok(Self::Heavy),
            _ => Err(DvrError::lookup(
                "LOOKUP.DEFAULTS_PROFILE",
                format!("unknown defaults profile '{}' (expected lite or heavy)", text.trim()),
            )),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lite => "lite",
            Self::Heavy => "heavy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DefaultsProfile;

    #[test]
    fn profile_names_are_case_insensitive() {
        assert_eq!(
            DefaultsProfile::parse(" Heavy ").expect("known profile"),
            DefaultsProfile::Heavy
        );
        assert_eq!(DefaultsProfile::Lite.as_str(), "lite");
        let error = DefaultsProfile::parse("medium").expect_err("unknown profile");
        assert_eq!(error.placeholder(), "LOOKUP.DEFAULTS_PROFILE");
    }
}
