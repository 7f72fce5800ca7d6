//! RAM EEPROM
//!
//! Backend em memória com o mesmo contrato de página da EEPROM real.
//! Começa apagado (0xFF), conta transações e permite injetar falhas.
//! Usado no host (simulação) e na suíte de testes do cache.

use super::{BackendError, PageBackend, PageBuf};
use crate::config::{PAGE_SHIFT, PAGE_SIZE};

/// Valor de uma célula apagada
pub const ERASED: u8 = 0xFF;

pub struct RamEeprom<const PAGES: usize> {
    pages: [PageBuf; PAGES],
    reads: u32,
    writes: u32,
    last_write: Option<u32>,
    fail_reads: bool,
    fail_writes: bool,
    fail_page: Option<u32>,
}

impl<const PAGES: usize> RamEeprom<PAGES> {
    pub const fn new() -> Self {
        Self {
            pages: [[ERASED; PAGE_SIZE]; PAGES],
            reads: 0,
            writes: 0,
            last_write: None,
            fail_reads: false,
            fail_writes: false,
            fail_page: None,
        }
    }

    /// Número de `read_page` bem-sucedidos
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Número de `write_page` bem-sucedidos
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Última página gravada
    pub fn last_write(&self) -> Option<u32> {
        self.last_write
    }

    pub fn reset_counters(&mut self) {
        self.reads = 0;
        self.writes = 0;
        self.last_write = None;
    }

    /// Faz todas as leituras falharem com `Io`
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Faz todas as gravações falharem com `Io`
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Faz leituras e gravações de uma página específica falharem
    pub fn set_fail_page(&mut self, page: Option<u32>) {
        self.fail_page = page;
    }

    /// Lê um byte direto do armazenamento, sem passar pelo cache
    pub fn peek(&self, address: u32) -> Option<u8> {
        let page = (address >> PAGE_SHIFT) as usize;
        let offset = (address as usize) & (PAGE_SIZE - 1);
        self.pages.get(page).map(|p| p[offset])
    }

    /// Escreve um byte direto no armazenamento, sem passar pelo cache
    pub fn poke(&mut self, address: u32, value: u8) -> Result<(), BackendError> {
        let page = (address >> PAGE_SHIFT) as usize;
        let offset = (address as usize) & (PAGE_SIZE - 1);
        let p = self.pages.get_mut(page).ok_or(BackendError::OutOfRange)?;
        p[offset] = value;
        Ok(())
    }

    fn fails(&self, page: u32) -> bool {
        self.fail_page == Some(page)
    }
}

impl<const PAGES: usize> Default for RamEeprom<PAGES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PAGES: usize> PageBackend for RamEeprom<PAGES> {
    fn read_page(&mut self, page: u32, buf: &mut PageBuf) -> Result<(), BackendError> {
        self.check_page(page)?;
        if self.fail_reads || self.fails(page) {
            return Err(BackendError::Io);
        }
        buf.copy_from_slice(&self.pages[page as usize]);
        self.reads += 1;
        Ok(())
    }

    fn write_page(&mut self, page: u32, data: &PageBuf) -> Result<(), BackendError> {
        self.check_page(page)?;
        if self.fail_writes || self.fails(page) {
            return Err(BackendError::Io);
        }
        self.pages[page as usize].copy_from_slice(data);
        self.writes += 1;
        self.last_write = Some(page);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        PAGES as u32
    }
}
