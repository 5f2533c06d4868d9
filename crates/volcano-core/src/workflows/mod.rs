//! # Workflows Module
//!
//! Top-level entry points that run a complete study from input files to results.
//!
//! - **Scaling Workflow** ([`scaling`]) - loads substrate tables, applies thermal corrections,
//!   stacks them and fits scaling relations over the chosen descriptor pair.
//! - **Volcano Workflow** ([`volcano`]) - runs the scaling workflow, translates reaction
//!   pathways into step functions and maps limiting potential, rate-determining step and
//!   selectivity over the descriptor grid.
//!
//! Both report progress through a [`ProgressReporter`](crate::engine::progress::ProgressReporter)
//! and return a structured [`Diagnostics`](crate::core::diagnostics::Diagnostics) value with
//! every non-fatal warning raised along the way.

pub mod scaling;
pub mod volcano;
