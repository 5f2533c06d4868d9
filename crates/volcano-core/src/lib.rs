//! # Volcano Core Library
//!
//! Thermodynamic scaling relations and reaction volcano maps for electrocatalyst screening.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable data models (`EnergyTable`, `ReactionPathway`,
//!   `Species`), file I/O for energy tables and reaction pathways, and the pure scaling
//!   machinery: linear descriptor terms, least-squares regression and the mixing-ratio
//!   `ScalingRelationFitter`.
//!
//! - **[`engine`]: The Logic Core.** Translates reaction pathways into linear step functions
//!   of the descriptors (`ReactionScalingCalculator`), evaluates them over a descriptor grid
//!   (`VolcanoMeshEvaluator`) and evaluates real samples with their own free energies. It also
//!   holds configuration, progress reporting and the engine error type.
//!
//! - **[`workflows`]: The Public API.** Complete procedures tying `core` and `engine`
//!   together: fitting scaling relations from raw tables, and producing volcano maps for
//!   a set of reactions.

pub mod core;
pub mod engine;
pub mod workflows;
