//! EEPROM Page Cache Library.
//!
//! Ponto central de exportação dos módulos do cache de configuração.
//! Define a estrutura hierárquica do firmware.

#![cfg_attr(not(test), no_std)]

// --- Módulos de Baixo Nível (Hardware) ---
pub mod arch; // Controle de interrupções
pub mod drivers; // Serial (log), I2C, EEPROM

// --- Módulos Centrais ---
pub mod config; // Constantes de configuração
pub mod core; // Logging, Scheduler (ticks)
pub mod mm; // Cache de páginas
pub mod sync; // Spinlock com máscara de IRQ
pub mod sys; // Erros

// Re-exportar a API de consumo para acesso fácil
pub use crate::config::CacheConfig;
pub use crate::core::tick::{TickError, TickHandler, TickObserver};
pub use crate::drivers::eeprom::{BackendError, PageBackend};
pub use crate::mm::cache::{PageCache, PageCacheStats, SharedPageCache, SlotInfo};
pub use crate::sys::error::{CacheError, CacheResult};
