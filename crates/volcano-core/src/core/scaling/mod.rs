//! Linear scaling relations over a two-descriptor basis.
//!
//! [`term::LinearTerm`] is the `(a, b, c)` triple shared by fitted scaling relations and
//! reaction-step functions, [`regression`] provides ordinary least squares on one variable,
//! and [`fitter::ScalingRelationFitter`] runs the mixing-ratio search over a stacked table.

pub mod fitter;
pub mod regression;
pub mod term;
