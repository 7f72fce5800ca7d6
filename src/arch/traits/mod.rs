//! Traits do Hardware Abstraction Layer (HAL).
//! Interfaces que a placa implementa para o núcleo do firmware.

pub mod cpu;

// Re-exportar para facilitar uso: `use crate::arch::traits::InterruptControl;`
pub use cpu::InterruptControl;
