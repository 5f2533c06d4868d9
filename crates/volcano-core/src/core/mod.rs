//! # Core Module
//!
//! Stateless building blocks of the volcano engine.
//!
//! - **Data models** ([`models`]) - energy tables, descriptor pairs, mixing ratios, symbolic
//!   species and reaction pathways
//! - **File I/O** ([`io`]) - CSV energy tables, JSON reaction pathways and mesh/table export
//! - **Scaling machinery** ([`scaling`]) - linear descriptor terms, simple linear regression and
//!   the mixing-ratio scaling-relation fitter
//! - **Diagnostics** ([`diagnostics`]) - non-fatal data-quality warnings carried alongside results
//!
//! Nothing in this module holds state between calls; every loader and fitter is a pure
//! function of its inputs.

pub mod diagnostics;
pub mod io;
pub mod models;
pub mod scaling;
