//! # Synchronization Primitives
//!
//! ## Modelo de Concorrência
//!
//! O cache roda em um único fluxo cooperativo. Os dois pontos de entrada
//! (chamadas da aplicação e o tick de manutenção) nunca podem se intercalar:
//!
//! ```text
//! Spinlock → Seção crítica com interrupções mascaradas
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: Protege o estado do cache. Nunca re-adquirir dentro da
//!   mesma seção (não é reentrante).

/// Spinlock (busy-wait, mascara IRQ)
pub mod spinlock;

pub use spinlock::{Spinlock, SpinlockGuard};
