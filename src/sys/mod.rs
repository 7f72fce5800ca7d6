//! System Definitions.
//!
//! Contém os tipos de erro que atravessam as camadas do firmware
//! (barramento → EEPROM → cache → consumidores).

pub mod error;

pub use error::{CacheError, CacheResult};
