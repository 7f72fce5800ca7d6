//! Interface Abstrata de controle de interrupções (HAL).
//! Define as operações que a placa (Cortex-M, AVR, host) deve fornecer.

/// Controle global de interrupções.
///
/// A implementação da placa mascara a fonte de interrupção do timer que
/// dispara o scheduler (ou todas, via PRIMASK). O cache depende disso para
/// garantir exclusão mútua entre o tick de manutenção e chamadas da aplicação.
pub trait InterruptControl: Sync {
    /// Desabilita interrupções (ex: `cpsid i`).
    fn disable_interrupts(&self);

    /// Habilita interrupções (ex: `cpsie i`).
    fn enable_interrupts(&self);

    /// Verifica se as interrupções estão habilitadas.
    fn are_interrupts_enabled(&self) -> bool;
}
