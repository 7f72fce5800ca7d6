//! Decomposição de um intervalo `[address, address + len)` em trechos de
//! uma única página.
//!
//! ```text
//!  address = 0x01F0, len = 0x30
//!
//!  página 0x01           página 0x02
//!  ┌──────────────┬────┐┌──────┬─────────────┐
//!  │              │0x10││ 0x20 │             │
//!  └──────────────┴────┘└──────┴─────────────┘
//!        offset 0xF0 ──┘  └── offset 0x00
//! ```

use crate::config::{PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};
use crate::sys::error::{CacheError, CacheResult};

/// Um trecho contido em uma página
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Número da página
    pub page: u32,
    /// Offset dentro da página
    pub offset: usize,
    /// Bytes neste trecho
    pub len: usize,
    /// Posição correspondente no buffer do cliente
    pub pos: usize,
}

impl Span {
    /// Faixa dentro da página
    #[inline]
    pub fn page_range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }

    /// Faixa dentro do buffer do cliente
    #[inline]
    pub fn buf_range(&self) -> core::ops::Range<usize> {
        self.pos..self.pos + self.len
    }
}

/// Iterador sobre os trechos de página de um intervalo
#[derive(Debug, Clone)]
pub struct PageSpan {
    address: u32,
    remaining: usize,
    pos: usize,
}

impl PageSpan {
    /// Rejeita intervalos cujo último byte não cabe em 32 bits.
    pub fn new(address: u32, len: usize) -> CacheResult<Self> {
        if len > 0 {
            let last = (address as u64).checked_add(len as u64 - 1);
            if last.map_or(true, |l| l > u32::MAX as u64) {
                return Err(CacheError::AddressOverflow);
            }
        }
        Ok(Self {
            address,
            remaining: len,
            pos: 0,
        })
    }
}

impl Iterator for PageSpan {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.remaining == 0 {
            return None;
        }

        let offset = (self.address & PAGE_MASK) as usize;
        let len = core::cmp::min(PAGE_SIZE - offset, self.remaining);
        let span = Span {
            page: self.address >> PAGE_SHIFT,
            offset,
            len,
            pos: self.pos,
        };

        self.remaining -= len;
        self.pos += len;
        // Só dá a volta depois do último trecho do espaço de endereços
        self.address = self.address.wrapping_add(len as u32);
        Some(span)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let offset = (self.address & PAGE_MASK) as usize;
        let n = (offset + self.remaining).div_ceil(PAGE_SIZE);
        (n, Some(n))
    }
}
