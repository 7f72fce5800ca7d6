//! # Barramento I2C (TWI)
//!
//! Abstração mínima do controlador I2C usado pela EEPROM. A placa implementa
//! [`I2cBus`] sobre o periférico TWI; o driver da EEPROM só conhece esta trait.
//!
//! ```text
//! ┌──────────────────────────┐
//! │   At24Eeprom (páginas)   │
//! └────────────┬─────────────┘
//!              ↓  write / write_read
//! ┌──────────────────────────┐
//! │   I2cBus (placa)         │
//! └──────────────────────────┘
//! ```

use core::fmt;

/// Tipos de erro do barramento I2C
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cError {
    /// O dispositivo não reconheceu o endereço ou um byte
    Nack,
    /// Outro mestre assumiu o barramento
    ArbitrationLost,
    /// O controlador não concluiu a transação no prazo
    Timeout,
    /// Erro genérico de barramento (start/stop ilegal, etc)
    Bus,
}

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            I2cError::Nack => write!(f, "NACK do dispositivo"),
            I2cError::ArbitrationLost => write!(f, "Arbitragem perdida"),
            I2cError::Timeout => write!(f, "Timeout no barramento"),
            I2cError::Bus => write!(f, "Erro de barramento"),
        }
    }
}

/// Controlador I2C em modo mestre (endereços de 7 bits)
pub trait I2cBus {
    /// START, endereço+W, `bytes`, STOP.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), I2cError>;

    /// START, endereço+W, `bytes`, REPEATED START, endereço+R, lê
    /// `buf.len()` bytes, STOP.
    fn write_read(&mut self, address: u8, bytes: &[u8], buf: &mut [u8]) -> Result<(), I2cError>;
}
