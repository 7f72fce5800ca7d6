//! # Configuração
//!
//! Constantes de compilação do cache e do barramento.
//!
//! O tempo até uma página suja ser gravada por envelhecimento é
//! `MAX_AGE * TICK_INTERVAL_MEM_CACHE_US`. Com os valores padrão:
//! 128 * 40ms = ~5s. A EEPROM aguenta ~1M ciclos por página, então
//! gravação contínua a cada 5s dura ~58 dias no pior caso; o uso real
//! (ajuste de parâmetros) é muito mais esparso.

use crate::sys::error::{CacheError, CacheResult};

/// Tamanho de uma página (cache e EEPROM)
pub const PAGE_SIZE: usize = 256;

/// `page = address >> PAGE_SHIFT`
pub const PAGE_SHIFT: u32 = 8;

/// Máscara do offset dentro da página
pub const PAGE_MASK: u32 = (PAGE_SIZE as u32) - 1;

/// Número padrão de slots. Limita o uso de RAM (16 * 256 = 4 KiB).
pub const NUM_CACHED_PAGES: usize = 16;

/// Idade máxima de um slot
pub const MAX_AGE: u8 = 128;

/// Intervalo (µs) de manutenção do cache no scheduler
pub const TICK_INTERVAL_MEM_CACHE_US: u32 = 40_000;

/// Pior caso de gravação de uma página segundo o datasheet
pub const EEPROM_WRITE_CYCLE_MS: u32 = 10;

/// Configuração em tempo de execução do cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Idade em que um slot sujo é gravado pelo tick
    pub max_age: u8,
    /// Período do tick de manutenção (µs)
    pub tick_interval_us: u32,
}

impl CacheConfig {
    pub const DEFAULT: Self = Self {
        max_age: MAX_AGE,
        tick_interval_us: TICK_INTERVAL_MEM_CACHE_US,
    };

    /// Valida a configuração.
    ///
    /// `max_age == 0` faria todo slot sujo ser elegível no mesmo tick em que
    /// foi escrito; `tick_interval_us == 0` é o marcador de timer livre no
    /// scheduler.
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_age == 0 || self.tick_interval_us == 0 {
            return Err(CacheError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
