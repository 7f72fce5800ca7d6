//! # Page Cache
//!
//! Cache totalmente associativo de `N` slots de 256 bytes com write-back.
//!
//! ## Política
//!
//! - **Envelhecimento (NRU):** `tick()` incrementa a idade de todo slot
//!   mapeado até `max_age`. Acesso a um slot limpo zera a idade.
//! - **Evicção:** slot livre, senão o slot limpo mais velho (empate: o último
//!   na ordem dos slots). Sem slot limpo, o primeiro slot sujo é gravado de
//!   forma síncrona antes de tentar de novo.
//! - **Write-back:** cada `tick()` grava no máximo uma página suja que tenha
//!   atingido `max_age`.
//!
//! Escrever em um slot já sujo não zera a idade: escritas contínuas na mesma
//! página não adiam a gravação para sempre.

use crate::config::{CacheConfig, NUM_CACHED_PAGES, PAGE_SHIFT, PAGE_SIZE};
use crate::drivers::eeprom::{PageBackend, PageBuf};
use crate::sys::error::{CacheError, CacheResult};

use super::span::PageSpan;

#[derive(Clone, Copy)]
struct Slot {
    page: Option<u32>,
    data: PageBuf,
    age: u8,
    dirty: bool,
}

impl Slot {
    const EMPTY: Self = Self {
        page: None,
        data: [0; PAGE_SIZE],
        age: 0,
        dirty: false,
    };
}

/// Estado de um slot (diagnóstico)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInfo {
    pub page: Option<u32>,
    pub age: u8,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Páginas lidas do backend
    pub loads: u64,
    /// Páginas gravadas no backend
    pub flushes: u64,
    /// Slots limpos reaproveitados para outra página
    pub evictions: u64,
    pub dirty_slots: usize,
}

/// Cache de páginas sobre um [`PageBackend`]
pub struct PageCache<B, const N: usize = NUM_CACHED_PAGES> {
    backend: B,
    slots: [Slot; N],
    config: CacheConfig,
    stats: PageCacheStats,
}

impl<B: PageBackend, const N: usize> PageCache<B, N> {
    /// Cria um cache vazio com a configuração padrão.
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            slots: [Slot::EMPTY; N],
            config: CacheConfig::DEFAULT,
            stats: PageCacheStats {
                hits: 0,
                misses: 0,
                loads: 0,
                flushes: 0,
                evictions: 0,
                dirty_slots: 0,
            },
        }
    }

    pub fn with_config(backend: B, config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let mut cache = Self::new(backend);
        cache.config = config;
        crate::kinfo!("(Cache) Inicializado, slots=", N);
        Ok(cache)
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Número de slots
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Acesso direto ao backend. Escrever por aqui em uma página residente
    /// deixa o cache desatualizado até `invalidate_page`.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Descarta o cache e devolve o backend. Slots sujos são perdidos;
    /// chame `flush_all` antes.
    pub fn into_backend(self) -> B {
        self.backend
    }

    // =========================================================================
    // LEITURA / ESCRITA
    // =========================================================================

    /// Lê `buf.len()` bytes a partir de `address`.
    ///
    /// Em caso de erro o conteúdo de `buf` é indefinido.
    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> CacheResult<()> {
        for span in PageSpan::new(address, buf.len())? {
            let idx = self.resolve(span.page)?;
            let slot = &mut self.slots[idx];
            buf[span.buf_range()].copy_from_slice(&slot.data[span.page_range()]);
            if !slot.dirty {
                slot.age = 0;
            }
        }
        Ok(())
    }

    /// Escreve `data` a partir de `address`.
    ///
    /// Se uma página depois da primeira falhar, os bytes das páginas
    /// anteriores ficam aplicados e o retorno é `PartialWriteFailure`.
    pub fn write(&mut self, address: u32, data: &[u8]) -> CacheResult<()> {
        let mut applied = false;
        for span in PageSpan::new(address, data.len())? {
            let idx = match self.resolve(span.page) {
                Ok(idx) => idx,
                Err(_) if applied => {
                    crate::kwarn!("(Cache) Escrita parcial, parou na pagina=", span.page);
                    return Err(CacheError::PartialWriteFailure);
                }
                Err(err) => return Err(err),
            };

            let slot = &mut self.slots[idx];
            slot.data[span.page_range()].copy_from_slice(&data[span.buf_range()]);
            if !slot.dirty {
                slot.dirty = true;
                slot.age = 0;
            }
            applied = true;
        }
        Ok(())
    }

    pub fn read_u8(&mut self, address: u32) -> CacheResult<u8> {
        let mut buf = [0u8; 1];
        self.read(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Valores multi-byte são little-endian.
    pub fn read_u16(&mut self, address: u32) -> CacheResult<u16> {
        let mut buf = [0u8; 2];
        self.read(address, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self, address: u32) -> CacheResult<u32> {
        let mut buf = [0u8; 4];
        self.read(address, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn write_u8(&mut self, address: u32, value: u8) -> CacheResult<()> {
        self.write(address, &[value])
    }

    pub fn write_u16(&mut self, address: u32, value: u16) -> CacheResult<()> {
        self.write(address, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, address: u32, value: u32) -> CacheResult<()> {
        self.write(address, &value.to_le_bytes())
    }

    // =========================================================================
    // MANUTENÇÃO
    // =========================================================================

    /// Tick de manutenção: envelhece todos os slots mapeados e grava no
    /// máximo uma página suja que atingiu `max_age`.
    ///
    /// Retorna `true` se uma página foi gravada.
    pub fn tick(&mut self) -> CacheResult<bool> {
        let max_age = self.config.max_age;
        for slot in self.slots.iter_mut().filter(|s| s.page.is_some()) {
            if slot.age < max_age {
                slot.age += 1;
            }
        }

        let due = self
            .slots
            .iter()
            .position(|s| s.page.is_some() && s.dirty && s.age >= max_age);
        match due {
            Some(idx) => {
                self.flush_index(idx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Grava o primeiro slot sujo encontrado. Retorna `true` se gravou.
    pub fn flush_dirty(&mut self) -> CacheResult<bool> {
        match self.slots.iter().position(|s| s.page.is_some() && s.dirty) {
            Some(idx) => {
                self.flush_index(idx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Grava todos os slots sujos, um após o outro.
    ///
    /// Bloqueia por uma gravação de página para cada slot sujo. Não chamar
    /// do loop de controle; use só em caminhos sem prazo (ex: desligamento).
    /// Tenta todos os slots e retorna o primeiro erro.
    pub fn flush_all(&mut self) -> CacheResult<usize> {
        let mut flushed = 0;
        let mut first_err = None;
        for idx in 0..N {
            if !self.slots[idx].dirty {
                continue;
            }
            match self.flush_index(idx) {
                Ok(()) => flushed += 1,
                Err(err) => {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(flushed),
        }
    }

    /// Grava um slot pelo índice. Índice inválido ou slot limpo: `Ok(false)`.
    pub fn flush_slot(&mut self, index: usize) -> CacheResult<bool> {
        match self.slots.get(index) {
            Some(slot) if slot.page.is_some() && slot.dirty => {
                self.flush_index(index)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Força a idade do slot da página para `max_age`: ele será gravado no
    /// próximo tick sem bloquear quem chamou.
    ///
    /// Retorna `false` se a página não está no cache.
    pub fn age_fully_page(&mut self, page: u32) -> bool {
        match self.lookup(page) {
            Some(idx) => self.age_fully_slot(idx),
            None => false,
        }
    }

    pub fn age_fully_address(&mut self, address: u32) -> bool {
        self.age_fully_page(address >> PAGE_SHIFT)
    }

    pub fn age_fully_slot(&mut self, index: usize) -> bool {
        let max_age = self.config.max_age;
        match self.slots.get_mut(index) {
            Some(slot) if slot.page.is_some() => {
                slot.age = max_age;
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // INVALIDAÇÃO
    // =========================================================================

    /// Remove a página do cache, gravando-a antes se estiver suja.
    ///
    /// O slot fica livre mesmo se a gravação falhar; nesse caso o conteúdo
    /// não gravado é perdido e o erro é retornado.
    pub fn invalidate_page(&mut self, page: u32) -> CacheResult<()> {
        match self.lookup(page) {
            Some(idx) => self.invalidate_index(idx),
            None => Ok(()),
        }
    }

    pub fn invalidate_address(&mut self, address: u32) -> CacheResult<()> {
        self.invalidate_page(address >> PAGE_SHIFT)
    }

    /// Índice inválido é ignorado.
    pub fn invalidate_slot(&mut self, index: usize) -> CacheResult<()> {
        if index >= N {
            return Ok(());
        }
        self.invalidate_index(index)
    }

    /// Invalida todos os slots e retorna o primeiro erro de gravação.
    pub fn invalidate_all(&mut self) -> CacheResult<()> {
        let mut result = Ok(());
        for idx in 0..N {
            if let Err(err) = self.invalidate_index(idx) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    // =========================================================================
    // DIAGNÓSTICO
    // =========================================================================

    pub fn stats(&self) -> PageCacheStats {
        PageCacheStats {
            dirty_slots: self.slots.iter().filter(|s| s.dirty).count(),
            ..self.stats
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = PageCacheStats::default();
    }

    pub fn slot_info(&self, index: usize) -> Option<SlotInfo> {
        self.slots.get(index).map(|s| SlotInfo {
            page: s.page,
            age: s.age,
            dirty: s.dirty,
        })
    }

    /// A página está em algum slot?
    pub fn contains_page(&self, page: u32) -> bool {
        self.lookup(page).is_some()
    }

    // =========================================================================
    // INTERNOS
    // =========================================================================

    fn lookup(&self, page: u32) -> Option<usize> {
        self.slots.iter().position(|s| s.page == Some(page))
    }

    /// Slot que contém `page`, carregando do backend em caso de miss.
    fn resolve(&mut self, page: u32) -> CacheResult<usize> {
        if let Some(idx) = self.lookup(page) {
            self.stats.hits += 1;
            return Ok(idx);
        }
        self.stats.misses += 1;

        // Não despeja nada por uma página que o backend vai recusar
        self.backend.check_page(page)?;

        let idx = self.find_victim()?;
        self.load(idx, page)?;
        Ok(idx)
    }

    fn find_victim(&mut self) -> CacheResult<usize> {
        if let Some(idx) = self.slots.iter().position(|s| s.page.is_none()) {
            return Ok(idx);
        }
        if let Some(idx) = self.oldest_clean() {
            self.evict(idx);
            return Ok(idx);
        }

        // Todos sujos: grava um para liberar
        let Some(dirty) = self.slots.iter().position(|s| s.dirty) else {
            return Err(CacheError::SlotUnavailable);
        };
        crate::kdebug!("(Cache) Sem slot limpo, gravando slot=", dirty);
        self.flush_index(dirty)?;

        match self.oldest_clean() {
            Some(idx) => {
                self.evict(idx);
                Ok(idx)
            }
            None => {
                crate::kerror!("(Cache) Nenhum slot utilizavel apos flush");
                Err(CacheError::SlotUnavailable)
            }
        }
    }

    /// Slot limpo e mapeado de maior idade; empate fica com o último.
    fn oldest_clean(&self) -> Option<usize> {
        let mut victim = None;
        let mut oldest = 0;
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.page.is_none() || slot.dirty {
                continue;
            }
            if victim.is_none() || slot.age >= oldest {
                victim = Some(idx);
                oldest = slot.age;
            }
        }
        victim
    }

    fn evict(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];
        if let Some(page) = slot.page.take() {
            crate::kdebug!("(Cache) Despejando pagina=", page);
            self.stats.evictions += 1;
        }
    }

    fn load(&mut self, idx: usize, page: u32) -> CacheResult<()> {
        let slot = &mut self.slots[idx];
        slot.page = None;
        slot.dirty = false;
        slot.age = 0;

        if let Err(err) = self.backend.read_page(page, &mut slot.data) {
            crate::kerror!("(Cache) Falha ao carregar pagina=", page);
            return Err(err.into());
        }
        slot.page = Some(page);
        self.stats.loads += 1;
        crate::kdebug!("(Cache) Pagina carregada=", page);
        Ok(())
    }

    /// Grava o slot se estiver sujo; em sucesso fica limpo com idade 0.
    fn flush_index(&mut self, idx: usize) -> CacheResult<()> {
        let slot = &mut self.slots[idx];
        let Some(page) = slot.page else {
            return Ok(());
        };
        if !slot.dirty {
            return Ok(());
        }

        crate::kinfo!("(Cache) Gravando pagina=", page);
        if let Err(err) = self.backend.write_page(page, &slot.data) {
            crate::kerror!("(Cache) Falha ao gravar pagina=", page);
            return Err(err.into());
        }
        slot.dirty = false;
        slot.age = 0;
        self.stats.flushes += 1;
        Ok(())
    }

    fn invalidate_index(&mut self, idx: usize) -> CacheResult<()> {
        let result = self.flush_index(idx);
        let slot = &mut self.slots[idx];
        if let (Err(_), Some(page)) = (&result, slot.page) {
            crate::kwarn!("(Cache) Invalidando pagina suja nao gravada=", page);
        }
        slot.page = None;
        slot.dirty = false;
        slot.age = 0;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::eeprom::{BackendError, RamEeprom};

    type Cache = PageCache<RamEeprom<16>, 4>;

    fn cache() -> Cache {
        PageCache::new(RamEeprom::new())
    }

    #[test]
    fn test_new_cache_is_empty() {
        let c = cache();
        assert_eq!(c.capacity(), 4);
        for i in 0..4 {
            assert_eq!(c.slot_info(i).unwrap().page, None);
        }
        assert_eq!(c.slot_info(4), None);
    }

    #[test]
    fn test_with_config_validates() {
        let bad = CacheConfig {
            max_age: 0,
            ..CacheConfig::DEFAULT
        };
        assert_eq!(
            PageCache::<_, 4>::with_config(RamEeprom::<16>::new(), bad).err(),
            Some(CacheError::InvalidConfig)
        );
    }

    #[test]
    fn test_read_loads_once() {
        let mut c = cache();
        assert_eq!(c.read_u8(0x0105).unwrap(), 0xFF);
        assert_eq!(c.read_u8(0x0106).unwrap(), 0xFF);
        assert_eq!(c.backend().reads(), 1);
        let s = c.stats();
        assert_eq!((s.hits, s.misses, s.loads), (1, 1, 1));
    }

    #[test]
    fn test_write_marks_dirty_without_backend_write() {
        let mut c = cache();
        c.write_u16(0x0010, 0xBEEF).unwrap();
        assert_eq!(c.backend().writes(), 0);
        assert_eq!(c.stats().dirty_slots, 1);
        assert_eq!(c.read_u16(0x0010).unwrap(), 0xBEEF);
        assert_eq!(c.read_u8(0x0010).unwrap(), 0xEF);
    }

    #[test]
    fn test_clean_access_resets_age_dirty_keeps_it() {
        let mut c = cache();
        c.read_u8(0x0000).unwrap();
        c.write_u8(0x0100, 1).unwrap();
        for _ in 0..5 {
            c.tick().unwrap();
        }
        c.read_u8(0x0000).unwrap();
        c.write_u8(0x0101, 2).unwrap();
        assert_eq!(c.slot_info(0).unwrap().age, 0);
        assert_eq!(c.slot_info(1).unwrap().age, 5);
    }

    #[test]
    fn test_victim_is_oldest_clean_last_on_tie() {
        let mut c = cache();
        for page in 0..4u32 {
            c.read_u8(page << 8).unwrap();
        }
        // Idades iguais: o último slot perde
        c.read_u8(0x0400).unwrap();
        assert!(!c.contains_page(3));
        assert!(c.contains_page(4));
        assert_eq!(c.stats().evictions, 1);

        c.tick().unwrap();
        c.read_u8(0x0000).unwrap();
        // Slot 0 rejuvenesceu; os outros três empatam e o último perde
        c.read_u8(0x0500).unwrap();
        assert!(!c.contains_page(4));
        assert!(c.contains_page(0));
        assert!(c.contains_page(1));
        assert!(c.contains_page(2));
    }

    #[test]
    fn test_dirty_slots_never_evicted_while_clean_exists() {
        let mut c = cache();
        for page in 0..3u32 {
            c.write_u8(page << 8, page as u8).unwrap();
        }
        c.read_u8(0x0300).unwrap();
        for _ in 0..10 {
            c.tick().unwrap();
        }
        c.read_u8(0x0400).unwrap();
        assert!(!c.contains_page(3));
        assert_eq!(c.backend().writes(), 0);
    }

    #[test]
    fn test_all_dirty_flushes_first_dirty() {
        let mut c = cache();
        for page in 0..4u32 {
            c.write_u8(page << 8, 0x10 + page as u8).unwrap();
        }
        c.read_u8(0x0400).unwrap();
        assert_eq!(c.backend().writes(), 1);
        assert_eq!(c.backend().last_write(), Some(0));
        assert_eq!(c.backend().peek(0x0000), Some(0x10));
        assert!(!c.contains_page(0));
    }

    #[test]
    fn test_zero_slots_unavailable() {
        let mut c: PageCache<RamEeprom<4>, 0> = PageCache::new(RamEeprom::new());
        assert_eq!(c.read_u8(0), Err(CacheError::SlotUnavailable));
    }

    #[test]
    fn test_out_of_range_does_not_evict() {
        let mut c = cache();
        for page in 0..4u32 {
            c.read_u8(page << 8).unwrap();
        }
        assert_eq!(
            c.read_u8(0x1000),
            Err(CacheError::BackendTransactionFailed(BackendError::OutOfRange))
        );
        for page in 0..4u32 {
            assert!(c.contains_page(page));
        }
    }

    #[test]
    fn test_tick_caps_age() {
        let cfg = CacheConfig {
            max_age: 3,
            ..CacheConfig::DEFAULT
        };
        let mut c: Cache = PageCache::with_config(RamEeprom::new(), cfg).unwrap();
        c.read_u8(0).unwrap();
        for _ in 0..10 {
            assert_eq!(c.tick(), Ok(false));
        }
        assert_eq!(c.slot_info(0).unwrap().age, 3);
        // Slots livres não envelhecem
        assert_eq!(c.slot_info(1).unwrap().age, 0);
    }

    #[test]
    fn test_age_fully_flushes_on_next_tick() {
        let mut c = cache();
        c.write_u8(0x0220, 7).unwrap();
        assert!(c.age_fully_address(0x02FF));
        assert!(!c.age_fully_page(9));
        assert!(!c.age_fully_slot(99));
        assert_eq!(c.backend().writes(), 0);

        assert_eq!(c.tick(), Ok(true));
        assert_eq!(c.backend().peek(0x0220), Some(7));
        let info = c.slot_info(0).unwrap();
        assert!(!info.dirty);
        assert_eq!(info.age, 0);
    }

    #[test]
    fn test_flush_dirty_one_at_a_time() {
        let mut c = cache();
        c.write_u8(0x0000, 1).unwrap();
        c.write_u8(0x0100, 2).unwrap();
        assert_eq!(c.flush_dirty(), Ok(true));
        assert_eq!(c.backend().writes(), 1);
        assert_eq!(c.flush_dirty(), Ok(true));
        assert_eq!(c.flush_dirty(), Ok(false));
        assert_eq!(c.backend().writes(), 2);
    }

    #[test]
    fn test_flush_all_counts() {
        let mut c = cache();
        c.write_u8(0x0000, 1).unwrap();
        c.read_u8(0x0100).unwrap();
        c.write_u8(0x0200, 2).unwrap();
        assert_eq!(c.flush_all(), Ok(2));
        assert_eq!(c.stats().dirty_slots, 0);
        assert_eq!(c.flush_all(), Ok(0));
    }

    #[test]
    fn test_flush_all_tries_every_slot() {
        let mut c = cache();
        c.write_u8(0x0000, 1).unwrap();
        c.write_u8(0x0100, 2).unwrap();
        c.backend_mut().set_fail_page(Some(0));
        assert_eq!(
            c.flush_all(),
            Err(CacheError::BackendTransactionFailed(BackendError::Io))
        );
        assert_eq!(c.backend().peek(0x0100), Some(2));
        assert_eq!(c.stats().dirty_slots, 1);
    }

    #[test]
    fn test_flush_slot() {
        let mut c = cache();
        c.write_u8(0x0300, 3).unwrap();
        assert_eq!(c.flush_slot(1), Ok(false));
        assert_eq!(c.flush_slot(42), Ok(false));
        assert_eq!(c.flush_slot(0), Ok(true));
        assert_eq!(c.backend().peek(0x0300), Some(3));
    }

    #[test]
    fn test_invalidate_slot_and_all() {
        let mut c = cache();
        c.write_u8(0x0000, 1).unwrap();
        c.write_u8(0x0100, 2).unwrap();
        assert_eq!(c.invalidate_slot(7), Ok(()));
        assert_eq!(c.invalidate_slot(0), Ok(()));
        assert!(!c.contains_page(0));
        assert_eq!(c.backend().peek(0x0000), Some(1));

        c.invalidate_all().unwrap();
        assert!(!c.contains_page(1));
        assert_eq!(c.backend().peek(0x0100), Some(2));
    }

    #[test]
    fn test_invalidate_clean_page_no_write() {
        let mut c = cache();
        c.read_u8(0x0100).unwrap();
        c.invalidate_page(1).unwrap();
        c.invalidate_page(5).unwrap();
        assert_eq!(c.backend().writes(), 0);
    }

    #[test]
    fn test_load_failure_leaves_slot_free() {
        let mut c = cache();
        c.backend_mut().set_fail_reads(true);
        assert!(c.read_u8(0x0000).is_err());
        assert_eq!(c.slot_info(0).unwrap().page, None);
        c.backend_mut().set_fail_reads(false);
        assert_eq!(c.read_u8(0x0000), Ok(0xFF));
    }

    #[test]
    fn test_into_backend() {
        let mut c = cache();
        c.write_u8(0x0001, 9).unwrap();
        c.flush_all().unwrap();
        let ram = c.into_backend();
        assert_eq!(ram.peek(0x0001), Some(9));
    }
}
