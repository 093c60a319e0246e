//! Core data models for the address scanner.

pub mod address;

pub use address::{AddressRecord, Coordinate, ParsedAddress, NOT_AVAILABLE};
