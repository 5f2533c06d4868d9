//! # Engine Module
//!
//! Turns fitted scaling relations and reaction pathways into volcano maps.
//!
//! - **Reaction scaling** ([`reaction`]) - translates each reaction step into a linear function
//!   of the two descriptors
//! - **Mesh evaluation** ([`mesh`]) - evaluates step functions over a descriptor grid and reduces
//!   them to limiting potential, rate-determining step and selectivity
//! - **Sample evaluation** ([`sample`]) - the same reaction algebra applied to each real sample's
//!   adsorption free energies
//! - **Configuration** ([`config`]) - builders for fitting and volcano-mapping runs
//! - **Progress Monitoring** ([`progress`]) - phase and task events for front-ends
//! - **Error Handling** ([`error`]) - the error type every workflow returns

pub mod config;
pub mod error;
pub mod mesh;
pub mod progress;
pub mod reaction;
pub mod sample;
