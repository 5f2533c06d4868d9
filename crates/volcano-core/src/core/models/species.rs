use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CLEAN_SITE_LABEL: &str = "*";
const ADSORBED_PREFIX: char = '*';
const PROTON_ELECTRON_PAIR_LABEL: &str = "PEP";
const PHASE_SEPARATOR: char = '_';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeciesParseError {
    #[error("Species label is empty")]
    Empty,
    #[error("Species label '{0}' has an empty name after stripping its phase suffix")]
    EmptyName(String),
}

/// A symbolic participant in a reaction step.
///
/// Labels follow the pathway-file conventions: `*` is a clean site, `*X` is adsorbate `X`,
/// `PEP` is a proton-electron pair, anything else is a free molecule whose optional phase
/// suffix (`_g`, `_l`, ...) is dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Species {
    CleanSite,
    Adsorbed(String),
    ProtonElectronPair,
    Free(String),
}

impl Species {
    pub fn parse(label: &str) -> Result<Self, SpeciesParseError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(SpeciesParseError::Empty);
        }
        if label == CLEAN_SITE_LABEL {
            return Ok(Self::CleanSite);
        }
        if let Some(adsorbate) = label.strip_prefix(ADSORBED_PREFIX) {
            return Ok(Self::Adsorbed(adsorbate.to_string()));
        }
        if label.eq_ignore_ascii_case(PROTON_ELECTRON_PAIR_LABEL) {
            return Ok(Self::ProtonElectronPair);
        }

        let name = match label.rsplit_once(PHASE_SEPARATOR) {
            Some((name, _phase)) => name,
            None => label,
        };
        if name.is_empty() {
            return Err(SpeciesParseError::EmptyName(label.to_string()));
        }
        Ok(Self::Free(name.to_string()))
    }
}

impl FromStr for Species {
    type Err = SpeciesParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CleanSite => write!(f, "{}", CLEAN_SITE_LABEL),
            Self::Adsorbed(name) => write!(f, "{}{}", ADSORBED_PREFIX, name),
            Self::ProtonElectronPair => write!(f, "{}", PROTON_ELECTRON_PAIR_LABEL),
            Self::Free(name) => write!(f, "{}", name),
        }
    }
}
