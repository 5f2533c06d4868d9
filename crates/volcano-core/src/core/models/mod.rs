//! # Core Models Module
//!
//! Data structures describing what the engine fits and evaluates.
//!
//! ## Key Components
//!
//! - [`table`] - sample × adsorbate free-energy tables and row-disambiguated stacking
//! - [`descriptor`] - the descriptor pair and the integer mixing ratio between its members
//! - [`energies`] - standalone free energies and thermal corrections
//! - [`species`] - symbolic species appearing in reaction steps
//! - [`pathway`] - reaction steps, pathways and the network of named reactions
//!
//! All models are immutable once built; operations that transform a table return a new one.

pub mod descriptor;
pub mod energies;
pub mod pathway;
pub mod species;
pub mod table;
