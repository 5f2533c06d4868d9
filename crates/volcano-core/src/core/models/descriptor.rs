use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const MAX_RATIO: u8 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Descriptor pair must name two distinct adsorbates, got '{0}' twice")]
    NotDistinct(String),
    #[error("Descriptor name cannot be empty")]
    EmptyName,
    #[error("Mixing ratio {0} is outside 0..=100")]
    RatioOutOfRange(u8),
    #[error("Fixed mixing ratio ({x}, {y}) must sum to 100")]
    RatioSum { x: u8, y: u8 },
}

/// The two reference adsorbates used as independent variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DescriptorPair {
    x: String,
    y: String,
}

impl DescriptorPair {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Result<Self, DescriptorError> {
        let (x, y) = (x.into(), y.into());
        if x.is_empty() || y.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if x == y {
            return Err(DescriptorError::NotDistinct(x));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &str {
        &self.x
    }

    pub fn y(&self) -> &str {
        &self.y
    }

    pub fn contains(&self, adsorbate: &str) -> bool {
        self.x == adsorbate || self.y == adsorbate
    }
}

impl fmt::Display for DescriptorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Percentage weight of the x descriptor in the hybrid descriptor; y gets the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MixingRatio(u8);

impl MixingRatio {
    pub fn new(x_percent: u8) -> Result<Self, DescriptorError> {
        if x_percent > MAX_RATIO {
            return Err(DescriptorError::RatioOutOfRange(x_percent));
        }
        Ok(Self(x_percent))
    }

    /// Accepts an explicit `(x, y)` weight pair, which must sum to 100.
    pub fn from_pair(x: u8, y: u8) -> Result<Self, DescriptorError> {
        if u16::from(x) + u16::from(y) != u16::from(MAX_RATIO) {
            return Err(DescriptorError::RatioSum { x, y });
        }
        Self::new(x)
    }

    /// Every ratio from 0 to 100 inclusive, ascending.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=MAX_RATIO).map(Self)
    }

    pub fn x_percent(&self) -> u8 {
        self.0
    }

    pub fn y_percent(&self) -> u8 {
        MAX_RATIO - self.0
    }

    pub fn x_weight(&self) -> f64 {
        f64::from(self.0) / f64::from(MAX_RATIO)
    }

    pub fn y_weight(&self) -> f64 {
        f64::from(self.y_percent()) / f64::from(MAX_RATIO)
    }

    /// Hybrid descriptor value `w·G_x + (1 - w)·G_y`.
    #[inline]
    pub fn blend(&self, g_x: f64, g_y: f64) -> f64 {
        self.x_weight() * g_x + self.y_weight() * g_y
    }
}

impl fmt::Display for MixingRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x_percent(), self.y_percent())
    }
}
