//! pharmacy-types: domain model and store ports shared by every other crate.

pub mod domain;
pub mod ports;
