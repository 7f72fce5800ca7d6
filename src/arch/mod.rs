//! # Hardware Abstraction Layer (HAL)
//!
//! O módulo `arch` é a **única** ponte entre o núcleo (cache, scheduler) e o
//! controle de interrupções da placa.
//!
//! ## 🏗️ Arquitetura e Fluxo
//! 1. A placa chama [`install`] uma vez no boot com sua implementação de
//!    [`InterruptControl`].
//! 2. O núcleo usa `crate::arch::Cpu` (ex: dentro do `Spinlock`).
//! 3. Sem implementação instalada (host, testes) as operações viram no-op e
//!    `interrupts_enabled()` retorna `false`.

pub mod traits;

pub use traits::*;

use spin::Once;

static INTERRUPT_CONTROL: Once<&'static dyn InterruptControl> = Once::new();

/// Registra o controle de interrupções da placa.
///
/// Apenas a primeira chamada tem efeito. Retorna `false` se já havia um
/// controle instalado.
pub fn install(control: &'static dyn InterruptControl) -> bool {
    let mut installed = false;
    INTERRUPT_CONTROL.call_once(|| {
        installed = true;
        control
    });
    if !installed {
        crate::kwarn!("(Arch) InterruptControl ja instalado, ignorando");
    }
    installed
}

/// Fachada de CPU usada pelo núcleo
pub struct Cpu;

impl Cpu {
    #[inline]
    pub fn interrupts_enabled() -> bool {
        INTERRUPT_CONTROL
            .get()
            .map_or(false, |ctl| ctl.are_interrupts_enabled())
    }

    #[inline]
    pub fn disable_interrupts() {
        if let Some(ctl) = INTERRUPT_CONTROL.get() {
            ctl.disable_interrupts();
        }
    }

    #[inline]
    pub fn enable_interrupts() {
        if let Some(ctl) = INTERRUPT_CONTROL.get() {
            ctl.enable_interrupts();
        }
    }
}
