//! # Error Codes
//!
//! Define os códigos de erro retornados pelo cache de páginas.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Uniformidade:** Toda operação do cache retorna `CacheResult<T>`; não há
//!   transferência de controle "estilo exceção" para fora do cache.
//! - **Propagação:** `From<BackendError>` permite usar `?` direto sobre o backend.
//! - **Sem retry:** Falhas não são repetidas dentro do cache. Política de retry
//!   é responsabilidade de quem chama.
//!
//! ## ⚠️ Limitação documentada
//! Uma escrita multi-página que falha no meio deixa aplicados os bytes das
//! páginas anteriores e retorna apenas `PartialWriteFailure`, sem contagem.

use core::fmt;

use crate::drivers::eeprom::BackendError;

/// Erros do cache de páginas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// Não foi possível obter um slot utilizável (nem livre, nem limpo após flush)
    SlotUnavailable,
    /// O backend reportou falha em uma leitura ou gravação de página
    BackendTransactionFailed(BackendError),
    /// Escrita multi-página falhou após aplicar bytes em páginas anteriores
    PartialWriteFailure,
    /// `address + len` ultrapassa o espaço de endereçamento de 32 bits
    AddressOverflow,
    /// Configuração inválida (ex: `max_age == 0`)
    InvalidConfig,
}

impl From<BackendError> for CacheError {
    fn from(err: BackendError) -> Self {
        CacheError::BackendTransactionFailed(err)
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::SlotUnavailable => write!(f, "Nenhum slot de cache disponível"),
            CacheError::BackendTransactionFailed(err) => {
                write!(f, "Falha na transação com o backend: {}", err)
            }
            CacheError::PartialWriteFailure => write!(f, "Escrita parcial (páginas anteriores aplicadas)"),
            CacheError::AddressOverflow => write!(f, "Intervalo ultrapassa o espaço de endereços"),
            CacheError::InvalidConfig => write!(f, "Configuração de cache inválida"),
        }
    }
}

impl CacheError {
    /// Código numérico curto para os macros de log (que só imprimem hex)
    pub const fn code(&self) -> u64 {
        match self {
            CacheError::SlotUnavailable => 1,
            CacheError::BackendTransactionFailed(_) => 2,
            CacheError::PartialWriteFailure => 3,
            CacheError::AddressOverflow => 4,
            CacheError::InvalidConfig => 5,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
