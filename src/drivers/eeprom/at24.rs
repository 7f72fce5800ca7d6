//! # Driver de EEPROM I2C (família AT24, páginas de 256 bytes)
//!
//! Protocolo de uma transação:
//!
//! ```text
//! Leitura:  S | 1010_0BB W | ADDR_HI | 0x00 | Sr | 1010_0BB R | 256 bytes | P
//! Escrita:  S | 1010_0BB W | ADDR_HI | 0x00 | 256 bytes | P   (+ ciclo de gravação)
//! ```
//!
//! `BB` são os dois bits altos do endereço de byte (bloco de 64 KiB). O byte
//! baixo do endereço é sempre 0 porque toda transação começa no início de
//! uma página.

use bitflags::bitflags;

use super::{BackendError, PageBackend, PageBuf};
use crate::config::{EEPROM_WRITE_CYCLE_MS, PAGE_SHIFT, PAGE_SIZE};
use crate::drivers::i2c::I2cBus;

bitflags! {
    /// Byte de seleção de dispositivo (endereço I2C de 7 bits)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceSelect: u8 {
        /// Código fixo do chip (0b1010_000)
        const CHIP_ID = 0b0101_0000;
        /// Bit 16 do endereço de byte
        const BLOCK_A16 = 0b0000_0001;
        /// Bit 17 do endereço de byte
        const BLOCK_A17 = 0b0000_0010;
    }
}

impl DeviceSelect {
    /// Seleção do dispositivo para uma página
    pub fn for_page(page: u32) -> Self {
        let byte_address = page << PAGE_SHIFT;
        let mut select = Self::CHIP_ID;
        if byte_address & (1 << 16) != 0 {
            select |= Self::BLOCK_A16;
        }
        if byte_address & (1 << 17) != 0 {
            select |= Self::BLOCK_A17;
        }
        select
    }
}

/// Pino de proteção contra escrita (ativo em nível alto)
pub trait WriteProtect {
    fn set_protected(&mut self, protected: bool);
    fn is_protected(&self) -> bool;
}

/// Espera bloqueante em milissegundos
pub trait DelayMs {
    fn delay_ms(&mut self, ms: u32);
}

/// Capacidades suportadas (blocos de 64 KiB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum At24Capacity {
    /// 512 Kbit, um bloco
    Kib64 = 1,
    /// 1 Mbit, dois blocos (A16)
    Kib128 = 2,
    /// 2 Mbit, quatro blocos (A16, A17)
    Kib256 = 4,
}

impl At24Capacity {
    pub const fn page_count(self) -> u32 {
        (self as u32) * (0x1_0000 / PAGE_SIZE as u32)
    }
}

/// EEPROM I2C com páginas de 256 bytes
pub struct At24Eeprom<I, W, D> {
    bus: I,
    write_protect: W,
    delay: D,
    capacity: At24Capacity,
}

impl<I: I2cBus, W: WriteProtect, D: DelayMs> At24Eeprom<I, W, D> {
    pub fn new(bus: I, write_protect: W, delay: D, capacity: At24Capacity) -> Self {
        Self {
            bus,
            write_protect,
            delay,
            capacity,
        }
    }

    /// Libera escrita (WP em nível baixo).
    ///
    /// Deve ser chamada uma vez no boot antes de qualquer flush.
    pub fn setup(&mut self) {
        self.write_protect.set_protected(false);
        crate::kinfo!("(EEPROM) Pronta, paginas=", self.capacity.page_count());
    }

    pub fn capacity(&self) -> At24Capacity {
        self.capacity
    }

    /// Devolve o barramento e os pinos
    pub fn release(self) -> (I, W, D) {
        (self.bus, self.write_protect, self.delay)
    }

    fn address_bytes(page: u32) -> [u8; 2] {
        [(page & 0xFF) as u8, 0x00]
    }
}

impl<I: I2cBus, W: WriteProtect, D: DelayMs> PageBackend for At24Eeprom<I, W, D> {
    fn read_page(&mut self, page: u32, buf: &mut PageBuf) -> Result<(), BackendError> {
        self.check_page(page)?;

        let select = DeviceSelect::for_page(page);
        crate::ktrace!("(EEPROM) Lendo pagina=", page);
        self.bus.write_read(select.bits(), &Self::address_bytes(page), buf)?;
        Ok(())
    }

    fn write_page(&mut self, page: u32, data: &PageBuf) -> Result<(), BackendError> {
        self.check_page(page)?;
        if self.write_protect.is_protected() {
            crate::kerror!("(EEPROM) Escrita com WP ativo, pagina=", page);
            return Err(BackendError::WriteProtected);
        }

        let mut frame = [0u8; PAGE_SIZE + 2];
        frame[..2].copy_from_slice(&Self::address_bytes(page));
        frame[2..].copy_from_slice(data);

        let select = DeviceSelect::for_page(page);
        crate::ktrace!("(EEPROM) Gravando pagina=", page);
        self.bus.write(select.bits(), &frame)?;

        // Ciclo interno de gravação: o chip não responde até terminar
        self.delay.delay_ms(EEPROM_WRITE_CYCLE_MS);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.capacity.page_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::i2c::I2cError;

    /// Simula o chip: 256 KiB e registro de transações
    struct FakeBus {
        memory: Vec<u8>,
        last_address: Option<u8>,
        last_len: usize,
        nack: bool,
    }

    impl FakeBus {
        fn new() -> Self {
            Self {
                memory: vec![0xFF; 0x4_0000],
                last_address: None,
                last_len: 0,
                nack: false,
            }
        }

        fn offset(address: u8, hi: u8) -> usize {
            let block = (address & 0x03) as usize;
            (block << 16) | ((hi as usize) << 8)
        }
    }

    impl I2cBus for FakeBus {
        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), I2cError> {
            if self.nack {
                return Err(I2cError::Nack);
            }
            assert_eq!(address & 0xFC, 0x50);
            assert_eq!(bytes[1], 0x00);
            let base = Self::offset(address, bytes[0]);
            self.memory[base..base + bytes.len() - 2].copy_from_slice(&bytes[2..]);
            self.last_address = Some(address);
            self.last_len = bytes.len();
            Ok(())
        }

        fn write_read(
            &mut self,
            address: u8,
            bytes: &[u8],
            buf: &mut [u8],
        ) -> Result<(), I2cError> {
            if self.nack {
                return Err(I2cError::Nack);
            }
            assert_eq!(bytes.len(), 2);
            let base = Self::offset(address, bytes[0]);
            buf.copy_from_slice(&self.memory[base..base + buf.len()]);
            self.last_address = Some(address);
            self.last_len = buf.len();
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePin {
        protected: bool,
    }

    impl WriteProtect for FakePin {
        fn set_protected(&mut self, protected: bool) {
            self.protected = protected;
        }

        fn is_protected(&self) -> bool {
            self.protected
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        total_ms: u32,
    }

    impl DelayMs for FakeDelay {
        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    fn device(capacity: At24Capacity) -> At24Eeprom<FakeBus, FakePin, FakeDelay> {
        let mut dev = At24Eeprom::new(
            FakeBus::new(),
            FakePin { protected: true },
            FakeDelay::default(),
            capacity,
        );
        dev.setup();
        dev
    }

    #[test]
    fn test_device_select_block_bits() {
        assert_eq!(DeviceSelect::for_page(0x000).bits(), 0x50);
        assert_eq!(DeviceSelect::for_page(0x0FF).bits(), 0x50);
        assert_eq!(DeviceSelect::for_page(0x100).bits(), 0x51);
        assert_eq!(DeviceSelect::for_page(0x200).bits(), 0x52);
        assert_eq!(DeviceSelect::for_page(0x3FF).bits(), 0x53);
    }

    #[test]
    fn test_capacity_page_count() {
        assert_eq!(At24Capacity::Kib64.page_count(), 256);
        assert_eq!(At24Capacity::Kib128.page_count(), 512);
        assert_eq!(At24Capacity::Kib256.page_count(), 1024);
    }

    #[test]
    fn test_setup_releases_write_protect() {
        let dev = device(At24Capacity::Kib64);
        let (_, pin, _) = dev.release();
        assert!(!pin.is_protected());
    }

    #[test]
    fn test_write_then_read_page_in_upper_block() {
        let mut dev = device(At24Capacity::Kib256);
        let mut data = [0u8; PAGE_SIZE];
        for (i, b) in data.iter_mut().enumerate() {
            *b = i as u8;
        }

        dev.write_page(0x2A7, &data).unwrap();
        let mut back = [0u8; PAGE_SIZE];
        dev.read_page(0x2A7, &mut back).unwrap();
        assert_eq!(back, data);

        let (bus, _, delay) = dev.release();
        assert_eq!(bus.last_address, Some(0x52));
        assert_eq!(&bus.memory[0x2_A700..0x2_A710], &data[..16]);
        assert_eq!(delay.total_ms, EEPROM_WRITE_CYCLE_MS);
    }

    #[test]
    fn test_write_frame_is_address_plus_page() {
        let mut dev = device(At24Capacity::Kib64);
        dev.write_page(3, &[0xAB; PAGE_SIZE]).unwrap();
        let (bus, _, _) = dev.release();
        assert_eq!(bus.last_len, PAGE_SIZE + 2);
    }

    #[test]
    fn test_out_of_range_rejected_without_bus_traffic() {
        let mut dev = device(At24Capacity::Kib64);
        let mut buf = [0u8; PAGE_SIZE];
        assert_eq!(dev.read_page(256, &mut buf), Err(BackendError::OutOfRange));
        assert_eq!(dev.write_page(256, &buf), Err(BackendError::OutOfRange));
        let (bus, _, _) = dev.release();
        assert_eq!(bus.last_address, None);
    }

    #[test]
    fn test_write_protected_rejected() {
        let mut dev = At24Eeprom::new(
            FakeBus::new(),
            FakePin { protected: true },
            FakeDelay::default(),
            At24Capacity::Kib64,
        );
        assert_eq!(
            dev.write_page(0, &[0; PAGE_SIZE]),
            Err(BackendError::WriteProtected)
        );
    }

    #[test]
    fn test_bus_error_propagates() {
        let mut dev = device(At24Capacity::Kib64);
        let mut buf = [0u8; PAGE_SIZE];
        let (mut bus, pin, delay) = dev.release();
        bus.nack = true;
        dev = At24Eeprom::new(bus, pin, delay, At24Capacity::Kib64);
        assert_eq!(
            dev.read_page(0, &mut buf),
            Err(BackendError::Bus(I2cError::Nack))
        );
        assert_eq!(
            dev.write_page(0, &buf),
            Err(BackendError::Bus(I2cError::Nack))
        );
    }
}
