//! # Memory Management Subsystem (MM)
//!
//! Gerencia a memória não volátil de configuração vista pelo firmware.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Espaço linear:** Clientes leem e escrevem por endereço absoluto de 32 bits,
//!   sem saber de páginas ou do barramento.
//! - **Poucas gravações:** A EEPROM tem ciclos de escrita limitados; o cache
//!   agrupa escritas na mesma página e só grava por envelhecimento ou flush.
//! - **Latência limitada:** Nenhuma chamada de caminho quente grava mais de uma
//!   página (exceto `flush_all`).
//!
//! ## 🏗️ Arquitetura dos Módulos
//!
//! | Módulo  | Responsabilidade | Estado Atual |
//! |---------|------------------|--------------|
//! | `cache` | Slots de 256 bytes, envelhecimento, write-back. | **Funcional:** associativo completo, scan linear O(N). |
//!
//! ## 🔍 Análise Crítica
//!
//! ### ⚠️ Pontos de Atenção
//! - **Sem atomicidade multi-página:** Uma escrita que cruza páginas pode ficar
//!   aplicada pela metade (`PartialWriteFailure`).
//! - **Sem wear-leveling:** O mapeamento página → endereço físico é fixo.

pub mod cache;
