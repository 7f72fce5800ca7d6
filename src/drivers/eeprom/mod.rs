//! # Camada de Abstração de Armazenamento por Páginas
//!
//! Fornece a trait e os tipos que o cache usa para falar com a memória não
//! volátil.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              PageCache (mm::cache)                  │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              PageBackend Trait                      │
//! │   read_page() write_page() page_count()             │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │     DRIVERS (At24Eeprom via I2C, RamEeprom)         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Backends Suportados
//!
//! | Driver      | Descrição                                  |
//! |-------------|--------------------------------------------|
//! | At24Eeprom  | EEPROM I2C de 64/128/256 KiB, páginas 256B |
//! | RamEeprom   | Memória em RAM instrumentada (host/testes) |

pub mod at24;
pub mod ram;

pub use at24::{At24Capacity, At24Eeprom, DelayMs, DeviceSelect, WriteProtect};
pub use ram::RamEeprom;

use core::fmt;

use crate::config::PAGE_SIZE;
use crate::drivers::i2c::I2cError;

/// Uma página completa
pub type PageBuf = [u8; PAGE_SIZE];

/// Tipos de erro do backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendError {
    /// Página além da capacidade do dispositivo
    OutOfRange,
    /// Erro no barramento durante a transação
    Bus(I2cError),
    /// Pino de proteção contra escrita ativo
    WriteProtected,
    /// Erro genérico de I/O
    Io,
}

impl From<I2cError> for BackendError {
    fn from(err: I2cError) -> Self {
        BackendError::Bus(err)
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::OutOfRange => write!(f, "Página fora da capacidade do dispositivo"),
            BackendError::Bus(err) => write!(f, "Erro de barramento ({})", err),
            BackendError::WriteProtected => write!(f, "Dispositivo protegido contra escrita"),
            BackendError::Io => write!(f, "Erro de I/O"),
        }
    }
}

/// Trait para armazenamento endereçado por página de 256 bytes
///
/// Cada chamada é uma transação bloqueante de exatamente uma página, com
/// latência de pior caso limitada (alguns ms para escrita). Não há
/// cancelamento nem timeout além do que o transporte garante.
pub trait PageBackend {
    /// Lê uma página inteira
    ///
    /// # Argumentos
    /// * `page` - Número da página (`address >> 8`)
    /// * `buf` - Destino dos 256 bytes
    fn read_page(&mut self, page: u32, buf: &mut PageBuf) -> Result<(), BackendError>;

    /// Grava uma página inteira
    fn write_page(&mut self, page: u32, data: &PageBuf) -> Result<(), BackendError>;

    /// Número total de páginas do dispositivo
    fn page_count(&self) -> u32;

    /// Rejeita páginas fora da capacidade
    fn check_page(&self, page: u32) -> Result<(), BackendError> {
        if page >= self.page_count() {
            return Err(BackendError::OutOfRange);
        }
        Ok(())
    }
}

impl<B: PageBackend + ?Sized> PageBackend for &mut B {
    fn read_page(&mut self, page: u32, buf: &mut PageBuf) -> Result<(), BackendError> {
        (**self).read_page(page, buf)
    }

    fn write_page(&mut self, page: u32, data: &PageBuf) -> Result<(), BackendError> {
        (**self).write_page(page, data)
    }

    fn page_count(&self) -> u32 {
        (**self).page_count()
    }
}
