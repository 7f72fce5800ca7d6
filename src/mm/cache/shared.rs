//! Cache compartilhado entre o loop da aplicação e o tick de manutenção.
//!
//! Toda chamada acontece dentro do `Spinlock`, que mascara interrupções
//! enquanto o closure roda. O tick entra pelo `TickHandler`, nunca direto da
//! IRQ.

use crate::config::NUM_CACHED_PAGES;
use crate::core::tick::{TickError, TickHandler, TickObserver};
use crate::drivers::eeprom::PageBackend;
use crate::sync::Spinlock;

use super::pagecache::PageCache;

pub struct SharedPageCache<B, const N: usize = NUM_CACHED_PAGES> {
    inner: Spinlock<PageCache<B, N>>,
}

impl<B: PageBackend, const N: usize> SharedPageCache<B, N> {
    pub const fn new(cache: PageCache<B, N>) -> Self {
        Self {
            inner: Spinlock::new(cache),
        }
    }

    /// Executa `f` com acesso exclusivo ao cache.
    ///
    /// # Exemplo
    /// ```ignore
    /// let speed = CACHE.with(|c| c.read_u16(PARAM_MAX_SPEED))?;
    /// ```
    pub fn with<R>(&self, f: impl FnOnce(&mut PageCache<B, N>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Como `with`, mas não espera se o cache já estiver em uso.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut PageCache<B, N>) -> R) -> Option<R> {
        let mut guard = self.inner.try_lock()?;
        Some(f(&mut guard))
    }

    pub fn into_inner(self) -> PageCache<B, N> {
        self.inner.into_inner()
    }
}

impl<B: PageBackend + Send + 'static, const N: usize> SharedPageCache<B, N> {
    /// Registra o tick de manutenção no scheduler com o intervalo da
    /// configuração do cache. Retorna o timer que a placa deve programar.
    pub fn setup<const T: usize, const O: usize>(
        &'static self,
        ticker: &mut TickHandler<T, O>,
    ) -> Result<usize, TickError> {
        let interval = self.with(|c| c.config().tick_interval_us);
        let timer = ticker.attach(self, interval)?;
        crate::kinfo!("(Cache) Tick de manutencao no timer=", timer);
        Ok(timer)
    }
}

impl<B: PageBackend + Send, const N: usize> TickObserver for SharedPageCache<B, N> {
    fn handle_tick(&self) {
        if let Err(err) = self.with(|c| c.tick()) {
            crate::kerror!("(Cache) Falha no tick, erro=", err.code());
        }
    }
}
