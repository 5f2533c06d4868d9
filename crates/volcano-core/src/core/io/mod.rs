//! Reading and writing the tabular and structured files the engine consumes and produces.
//!
//! Energy tables, thermal corrections and standalone free energies are CSV files
//! ([`tables`]); reaction pathways are JSON documents ([`pathway`]); meshes, fitted scaling
//! relations and step functions are written back out as CSV ([`export`]).

pub mod export;
pub mod pathway;
pub mod tables;
