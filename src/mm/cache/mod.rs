//! # Page Cache
//!
//! Cache de páginas da EEPROM de configuração em RAM.
//!
//! ## Visão Geral
//!
//! O Page Cache fica entre os clientes de configuração e o armazenamento
//! físico. Mantém páginas em RAM para evitar transações lentas no barramento
//! e, principalmente, ciclos de gravação desnecessários.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │           Clientes (parâmetros, calibração, log)            │
//! └───────────────────────────┬─────────────────────────────────┘
//!                             │ read/write por endereço
//! ┌───────────────────────────▼─────────────────────────────────┐
//! │                      PAGE CACHE                             │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐                   │
//! │  │ Slot 0   │  │ Slot 1   │  │ Slot N-1 │  ...              │
//! │  │ (clean)  │  │ (dirty)  │  │ (free)   │                   │
//! │  └──────────┘  └──────────┘  └──────────┘                   │
//! └───────────────────────────┬─────────────────────────────────┘
//!                             │ read_page / write_page
//! ┌───────────────────────────▼─────────────────────────────────┐
//! │                     PageBackend                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Características
//!
//! - **Load-through**: Toda página é lida inteira antes de qualquer escrita
//!   parcial, para preservar os bytes não tocados
//! - **Write-back**: Páginas sujas são gravadas pelo tick de manutenção, no
//!   máximo uma por tick
//! - **NRU Eviction**: Remove o slot limpo mais velho quando sob pressão

pub mod pagecache;
pub mod shared;
pub mod span;


pub use pagecache::{PageCache, PageCacheStats, SlotInfo};
pub use shared::SharedPageCache;
pub use span::{PageSpan, Span};
