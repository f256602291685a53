//! pharmacy-hex: hexagonal pharmacy API library (catalog + ledger core, inbound HTTP)

pub mod config;
pub mod errors;

pub mod application;

pub use pharmacy_types::{domain, ports};

pub mod inbound; // HTTP adapter (server + handlers)
pub mod outbound; // tracing-backed event sink
