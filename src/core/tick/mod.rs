//! # Tick Handler (Scheduler Periódico)
//!
//! Agrupa observadores por intervalo e os dispara a partir dos timers de
//! hardware da placa.
//!
//! ## Fluxo
//!
//! ```text
//!  IRQ do timer N ──► handle_interrupt(N) ──► fila (ring buffer)
//!                                                  │
//!  loop principal ──► pop_pending() / process() ◄──┘
//!                          │
//!                          ▼
//!                 observer.handle_tick()
//! ```
//!
//! O handler de interrupção **só enfileira**. Nenhum observador roda em
//! contexto de interrupção; quem drena a fila é o loop cooperativo. Isso
//! elimina a corrida entre o tick de manutenção do cache e as chamadas da
//! aplicação.
//!
//! ## Regras
//!
//! - Observadores com o mesmo intervalo compartilham o mesmo timer (a placa
//!   tem poucos timers de hardware).
//! - `attach` retorna o índice do timer; a placa programa aquele timer com o
//!   intervalo pedido e liga sua IRQ a `handle_interrupt(indice)`.
//! - Com `TickHandler` dentro de um `Spinlock`, prefira drenar com
//!   `pop_pending()` para não segurar o lock durante uma gravação de página.

use core::fmt;

/// Número de timers de hardware disponíveis
pub const NUM_TIMERS: usize = 9;

/// Observadores por timer
pub const NUM_OBSERVERS: usize = 8;

/// Capacidade da fila de ticks pendentes
pub const TICK_BUFFER_SIZE: usize = 32;

/// Algo que quer ser chamado periodicamente
pub trait TickObserver: Sync {
    fn handle_tick(&self);
}

/// Erros de registro no scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickError {
    /// Intervalo 0 é reservado para "timer livre"
    InvalidInterval,
    /// Todos os timers estão em uso com outros intervalos
    NoFreeTimer,
    /// O timer do intervalo não tem slot de observador livre
    NoFreeObserver,
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickError::InvalidInterval => write!(f, "Intervalo de tick inválido"),
            TickError::NoFreeTimer => write!(f, "Nenhum timer livre"),
            TickError::NoFreeObserver => write!(f, "Nenhum slot de observador livre"),
        }
    }
}

type Observer = &'static dyn TickObserver;

#[derive(Clone, Copy)]
struct TimerEntry<const O: usize> {
    /// Intervalo em µs (0 = livre)
    interval_us: u32,
    observers: [Option<Observer>; O],
}

impl<const O: usize> TimerEntry<O> {
    const EMPTY: Self = Self {
        interval_us: 0,
        observers: [None; O],
    };
}

#[inline]
fn same_observer(a: Observer, b: Observer) -> bool {
    core::ptr::addr_eq(a as *const dyn TickObserver, b as *const dyn TickObserver)
}

/// Scheduler periódico de tamanho fixo (sem alocação)
pub struct TickHandler<const T: usize = NUM_TIMERS, const O: usize = NUM_OBSERVERS> {
    timers: [TimerEntry<O>; T],
    queue: [Option<Observer>; TICK_BUFFER_SIZE],
    head: usize,
    tail: usize,
    dropped: u32,
    ticks: u64,
}

impl<const T: usize, const O: usize> TickHandler<T, O> {
    pub const fn new() -> Self {
        Self {
            timers: [TimerEntry::<O>::EMPTY; T],
            queue: [None; TICK_BUFFER_SIZE],
            head: 0,
            tail: 0,
            dropped: 0,
            ticks: 0,
        }
    }

    /// Registra `observer` para ser chamado a cada `interval_us`.
    ///
    /// Reaproveita um timer com o mesmo intervalo ou ocupa um livre.
    /// Um observador pode ser registrado em vários intervalos.
    pub fn attach(&mut self, observer: Observer, interval_us: u32) -> Result<usize, TickError> {
        if interval_us == 0 {
            return Err(TickError::InvalidInterval);
        }

        let timer = match self.find_timer(interval_us) {
            Some(t) => t,
            None => match self.find_timer(0) {
                Some(t) => t,
                None => {
                    crate::kerror!("(Tick) Nenhum timer livre para intervalo=", interval_us);
                    return Err(TickError::NoFreeTimer);
                }
            },
        };

        let entry = &mut self.timers[timer];
        let slot = match entry.observers.iter().position(Option::is_none) {
            Some(s) => s,
            None => {
                crate::kerror!("(Tick) Timer sem slot livre, timer=", timer);
                return Err(TickError::NoFreeObserver);
            }
        };

        entry.interval_us = interval_us;
        entry.observers[slot] = Some(observer);
        crate::kdebug!("(Tick) Observador registrado no timer=", timer);
        Ok(timer)
    }

    /// Remove `observer` de todos os timers. Retorna quantos registros foram
    /// removidos.
    ///
    /// Ticks já enfileirados para ele também são descartados.
    pub fn detach(&mut self, observer: Observer) -> usize {
        let mut removed = 0;
        for (timer, entry) in self.timers.iter_mut().enumerate() {
            for slot in entry.observers.iter_mut() {
                if slot.map_or(false, |o| same_observer(o, observer)) {
                    crate::kdebug!("(Tick) Removendo observador do timer=", timer);
                    *slot = None;
                    removed += 1;
                }
            }
        }

        let mut idx = self.tail;
        while idx != self.head {
            if self.queue[idx].map_or(false, |o| same_observer(o, observer)) {
                self.queue[idx] = None;
            }
            idx = (idx + 1) % TICK_BUFFER_SIZE;
        }
        removed
    }

    /// Intervalo programado em um timer (None se livre ou índice inválido)
    pub fn interval(&self, timer: usize) -> Option<u32> {
        self.timers
            .get(timer)
            .map(|e| e.interval_us)
            .filter(|&i| i != 0)
    }

    /// Chamado pela IRQ do timer `timer`: enfileira seus observadores.
    ///
    /// Não executa nenhum observador. Se a fila encher, o tick é descartado
    /// e contado em `dropped()`.
    pub fn handle_interrupt(&mut self, timer: usize) {
        let Some(entry) = self.timers.get(timer) else {
            return;
        };
        let observers = entry.observers;
        self.ticks = self.ticks.wrapping_add(1);

        for observer in observers.into_iter().flatten() {
            let next = (self.head + 1) % TICK_BUFFER_SIZE;
            if next == self.tail {
                self.dropped = self.dropped.wrapping_add(1);
                continue;
            }
            self.queue[self.head] = Some(observer);
            self.head = next;
        }
    }

    /// Retira o próximo observador pendente (para ser chamado fora do lock)
    pub fn pop_pending(&mut self) -> Option<Observer> {
        while self.tail != self.head {
            let observer = self.queue[self.tail].take();
            self.tail = (self.tail + 1) % TICK_BUFFER_SIZE;
            if observer.is_some() {
                return observer;
            }
        }
        None
    }

    /// Executa todos os ticks pendentes. Retorna quantos rodaram.
    pub fn process(&mut self) -> usize {
        let mut count = 0;
        while let Some(observer) = self.pop_pending() {
            observer.handle_tick();
            count += 1;
        }
        count
    }

    /// Descarta todos os ticks pendentes
    pub fn clean_buffer(&mut self) {
        self.queue = [None; TICK_BUFFER_SIZE];
        self.head = 0;
        self.tail = 0;
    }

    /// Ticks pendentes na fila
    pub fn pending(&self) -> usize {
        (self.head + TICK_BUFFER_SIZE - self.tail) % TICK_BUFFER_SIZE
    }

    /// Ticks descartados por fila cheia
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Interrupções de timer recebidas desde o boot
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn find_timer(&self, interval_us: u32) -> Option<usize> {
        self.timers.iter().position(|e| e.interval_us == interval_us)
    }
}

impl<const T: usize, const O: usize> Default for TickHandler<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counter(AtomicU32);

    impl TickObserver for Counter {
        fn handle_tick(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Counter {
        fn get(&self) -> u32 {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn counter() -> &'static Counter {
        Box::leak(Box::new(Counter::default()))
    }

    #[test]
    fn test_same_interval_shares_timer() {
        let mut ticker: TickHandler<3, 4> = TickHandler::new();
        let a = counter();
        let b = counter();
        let ta = ticker.attach(a, 40_000).unwrap();
        let tb = ticker.attach(b, 40_000).unwrap();
        assert_eq!(ta, tb);
        assert_eq!(ticker.interval(ta), Some(40_000));
    }

    #[test]
    fn test_distinct_intervals_use_distinct_timers() {
        let mut ticker: TickHandler<2, 4> = TickHandler::new();
        let t1 = ticker.attach(counter(), 20_000).unwrap();
        let t2 = ticker.attach(counter(), 40_000).unwrap();
        assert_ne!(t1, t2);
        assert_eq!(
            ticker.attach(counter(), 2_000_000),
            Err(TickError::NoFreeTimer)
        );
    }

    #[test]
    fn test_observer_slots_exhausted() {
        let mut ticker: TickHandler<1, 2> = TickHandler::new();
        ticker.attach(counter(), 100).unwrap();
        ticker.attach(counter(), 100).unwrap();
        assert_eq!(ticker.attach(counter(), 100), Err(TickError::NoFreeObserver));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut ticker: TickHandler<1, 1> = TickHandler::new();
        assert_eq!(ticker.attach(counter(), 0), Err(TickError::InvalidInterval));
    }

    #[test]
    fn test_interrupt_only_queues() {
        let mut ticker: TickHandler<2, 2> = TickHandler::new();
        let a = counter();
        let t = ticker.attach(a, 1000).unwrap();

        ticker.handle_interrupt(t);
        ticker.handle_interrupt(t);
        assert_eq!(a.get(), 0);
        assert_eq!(ticker.pending(), 2);

        assert_eq!(ticker.process(), 2);
        assert_eq!(a.get(), 2);
        assert_eq!(ticker.pending(), 0);
        assert_eq!(ticker.ticks(), 2);
    }

    #[test]
    fn test_only_observers_of_fired_timer_run() {
        let mut ticker: TickHandler<2, 2> = TickHandler::new();
        let fast = counter();
        let slow = counter();
        let tf = ticker.attach(fast, 10).unwrap();
        let _ts = ticker.attach(slow, 1000).unwrap();

        ticker.handle_interrupt(tf);
        ticker.process();
        assert_eq!(fast.get(), 1);
        assert_eq!(slow.get(), 0);
    }

    #[test]
    fn test_detach_removes_registrations_and_pending() {
        let mut ticker: TickHandler<2, 2> = TickHandler::new();
        let a = counter();
        let b = counter();
        let t = ticker.attach(a, 10).unwrap();
        ticker.attach(b, 10).unwrap();
        ticker.attach(a, 20).unwrap();

        ticker.handle_interrupt(t);
        assert_eq!(ticker.detach(a), 2);
        ticker.process();
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn test_full_queue_drops_ticks() {
        let mut ticker: TickHandler<1, 1> = TickHandler::new();
        let a = counter();
        let t = ticker.attach(a, 10).unwrap();
        for _ in 0..TICK_BUFFER_SIZE + 5 {
            ticker.handle_interrupt(t);
        }
        assert_eq!(ticker.pending(), TICK_BUFFER_SIZE - 1);
        assert_eq!(ticker.dropped(), 6);

        ticker.clean_buffer();
        assert_eq!(ticker.process(), 0);
    }

    #[test]
    fn test_invalid_timer_index_ignored() {
        let mut ticker: TickHandler<1, 1> = TickHandler::new();
        ticker.handle_interrupt(7);
        assert_eq!(ticker.pending(), 0);
        assert_eq!(ticker.interval(7), None);
    }
}
