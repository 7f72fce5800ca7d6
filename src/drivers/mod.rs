//! # Firmware Driver Layer
//!
//! O módulo `drivers` contém os drivers usados pelo cache de configuração.
//!
//! ## Drivers Implementados
//!
//! | Driver   | Arquivo      | Status |
//! |----------|--------------|--------|
//! | Serial   | `serial.rs`  | Sink de logs (registrado pela placa) |
//! | I2C      | `i2c/`       | Trait do barramento TWI |
//! | EEPROM   | `eeprom/`    | AT24 via I2C + backend em RAM |
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        PageCache (mm::cache)                │
//! └─────────────────────────────────────────────┘
//!                      ↓ PageBackend
//! ┌─────────────────────────────────────────────┐
//! │  eeprom::At24Eeprom  |  eeprom::RamEeprom   │
//! └─────────────────────────────────────────────┘
//!            ↓ I2cBus
//! ┌─────────────────────────────────────────────┐
//! │  Periférico TWI da placa                    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod eeprom; // Backends de página
pub mod i2c; // Barramento I2C
pub mod serial; // Sink de log
