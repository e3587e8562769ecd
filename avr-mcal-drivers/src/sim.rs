//! Simulated ATmega32 peripherals for host tests
//!
//! Each simulation implements `RegisterFile` at the ATmega32 addresses and
//! reacts to register writes the way the silicon does, closely enough for
//! the drivers' observable behavior. Busy-waits advance the simulation
//! through `relax()`; a wait that can never finish panics instead of hanging
//! the test run.

use core::cell::{Cell, RefCell};

use avr_mcal_atmega32::{spi as m32_spi, twi as m32_twi, uart as m32_uart};
use avr_mcal_hal::register::bit;
use avr_mcal_hal::{Register, RegisterFile};
use heapless::{Deque, Vec};

const SPIN_LIMIT: u32 = 10_000;

/// One received character with its line-error flags
#[derive(Debug, Clone, Copy, Default)]
pub struct RxFrame {
    pub data: u8,
    pub framing: bool,
    pub parity: bool,
}

/// USART with an optional TX→RX loopback wire
pub struct UsartSim {
    pub ucsra: u8,
    pub ucsrb: u8,
    pub ucsrc: u8,
    pub ubrrh: u8,
    pub ubrrl: u8,
    pub loopback: bool,
    pub sent: Vec<u8, 512>,
    rx: RefCell<Deque<RxFrame, 512>>,
    spins: u32,
}

impl UsartSim {
    pub fn new() -> Self {
        Self {
            ucsra: 0,
            ucsrb: 0,
            // UCSRC reset value on the ATmega32 (8N1)
            ucsrc: 0x86,
            ubrrh: 0,
            ubrrl: 0,
            loopback: false,
            sent: Vec::new(),
            rx: RefCell::new(Deque::new()),
            spins: 0,
        }
    }

    pub fn loopback() -> Self {
        Self {
            loopback: true,
            ..Self::new()
        }
    }

    /// Queue a byte as if the remote end had sent it
    pub fn inject(&mut self, data: u8) {
        self.inject_frame(RxFrame {
            data,
            ..RxFrame::default()
        });
    }

    pub fn inject_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.inject(b);
        }
    }

    pub fn inject_frame(&mut self, frame: RxFrame) {
        self.rx.get_mut().push_back(frame).expect("rx queue full");
    }

    pub fn pending_rx(&self) -> usize {
        self.rx.borrow().len()
    }
}

impl RegisterFile for UsartSim {
    fn read(&self, reg: Register) -> u8 {
        match reg {
            m32_uart::UCSRA => {
                // UDRE is always set: the simulated shifter is instantaneous
                let mut value = (self.ucsra & bit(1)) | bit(5);
                if let Some(frame) = self.rx.borrow().front() {
                    value |= bit(7);
                    if frame.framing {
                        value |= bit(4);
                    }
                    if frame.parity {
                        value |= bit(2);
                    }
                }
                value
            }
            m32_uart::UDR => self
                .rx
                .borrow_mut()
                .pop_front()
                .map(|f| f.data)
                .unwrap_or(0),
            m32_uart::UCSRB => self.ucsrb,
            m32_uart::UBRRL => self.ubrrl,
            m32_uart::UCSRC => self.ucsrc,
            other => panic!("unexpected USART read at {:#x}", other.address()),
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            m32_uart::UDR => {
                self.sent.push(value).expect("tx log full");
                if self.loopback {
                    self.inject(value);
                }
            }
            m32_uart::UCSRA => self.ucsra = value,
            m32_uart::UCSRB => self.ucsrb = value,
            m32_uart::UBRRL => self.ubrrl = value,
            // Shared address: URSEL picks the destination
            m32_uart::UCSRC => {
                if value & bit(7) != 0 {
                    self.ucsrc = value;
                } else {
                    self.ubrrh = value;
                }
            }
            other => panic!("unexpected USART write at {:#x}", other.address()),
        }
    }

    fn relax(&mut self) {
        self.spins += 1;
        if self.spins > SPIN_LIMIT {
            panic!("USART simulation stuck: nothing to receive");
        }
    }
}

/// SPI block wired either to itself (MOSI→MISO) or to a scripted remote
pub struct SpiSim {
    pub spcr: u8,
    pub ddrb: u8,
    pub spi2x: bool,
    pub loopback: bool,
    /// Bytes the remote end shifts in, one per transfer
    pub incoming: Deque<u8, 512>,
    pub sent: Vec<u8, 512>,
    spdr: Cell<u8>,
    spif: Cell<bool>,
    spins: u32,
}

impl SpiSim {
    pub fn new() -> Self {
        Self {
            spcr: 0,
            ddrb: 0,
            spi2x: false,
            loopback: false,
            incoming: Deque::new(),
            sent: Vec::new(),
            spdr: Cell::new(0),
            spif: Cell::new(false),
            spins: 0,
        }
    }

    pub fn loopback() -> Self {
        Self {
            loopback: true,
            ..Self::new()
        }
    }

    pub fn inject_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.incoming.push_back(b).expect("incoming queue full");
        }
    }

    pub fn transfer_complete(&self) -> bool {
        self.spif.get()
    }
}

impl RegisterFile for SpiSim {
    fn read(&self, reg: Register) -> u8 {
        match reg {
            m32_spi::SPCR => self.spcr,
            m32_spi::SPSR => (if self.spif.get() { bit(7) } else { 0 }) | self.spi2x as u8,
            m32_spi::SPDR => {
                self.spif.set(false);
                self.spdr.get()
            }
            m32_spi::DDRB => self.ddrb,
            other => panic!("unexpected SPI read at {:#x}", other.address()),
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            m32_spi::SPCR => self.spcr = value,
            m32_spi::SPSR => self.spi2x = value & 1 != 0,
            m32_spi::DDRB => self.ddrb = value,
            m32_spi::SPDR => {
                self.sent.push(value).expect("tx log full");
                let received = if self.loopback {
                    value
                } else {
                    self.incoming.pop_front().unwrap_or(0xFF)
                };
                self.spdr.set(received);
                self.spif.set(true);
            }
            other => panic!("unexpected SPI write at {:#x}", other.address()),
        }
    }

    fn relax(&mut self) {
        // A remote master clocks the next byte in while we wait
        if !self.spif.get() {
            if let Some(b) = self.incoming.pop_front() {
                self.spdr.set(b);
                self.spif.set(true);
                return;
            }
        }
        self.spins += 1;
        if self.spins > SPIN_LIMIT {
            panic!("SPI simulation stuck: no transfer in progress");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TwiStage {
    Idle,
    Address,
    Write { first: bool },
    Read,
}

const TWINT: u8 = bit(7);
const TWEA: u8 = bit(6);
const TWSTA: u8 = bit(5);
const TWSTO: u8 = bit(4);

/// TWI master with a 24C16 EEPROM on the bus
pub struct TwiSim {
    pub twbr: u8,
    pub prescaler: u8,
    pub twar: u8,
    pub twcr: u8,
    twdr: u8,
    status: u8,
    pending: Option<u8>,
    owned: bool,
    stage: TwiStage,
    pointer: u16,
    pub memory: [u8; 2048],
    /// Whether the EEPROM acknowledges its address
    pub present: bool,
    /// Every byte clocked out of TWDR
    pub sent: Vec<u8, 256>,
    pub starts: u32,
    pub stops: u32,
    ops: u32,
    fault: Option<(u32, u8)>,
    spins: u32,
}

impl TwiSim {
    pub fn new() -> Self {
        Self {
            twbr: 0,
            prescaler: 0,
            twar: 0,
            twcr: 0,
            twdr: 0,
            status: 0xF8,
            pending: None,
            owned: false,
            stage: TwiStage::Idle,
            pointer: 0,
            memory: [0xFF; 2048],
            present: true,
            sent: Vec::new(),
            starts: 0,
            stops: 0,
            ops: 0,
            fault: None,
            spins: 0,
        }
    }

    /// Report `status` instead of the real outcome of the `op`-th bus
    /// operation (1-based, stops not counted)
    pub fn fault_at(&mut self, op: u32, status: u8) {
        self.fault = Some((op, status));
    }

    fn operate(&mut self, control: u8) -> u8 {
        if control & TWSTA != 0 {
            self.starts += 1;
            let status = if self.owned { 0x10 } else { 0x08 };
            self.owned = true;
            self.stage = TwiStage::Address;
            return status;
        }

        match self.stage {
            TwiStage::Address => {
                let sla = self.twdr;
                self.sent.push(sla).expect("tx log full");
                let read = sla & 1 != 0;
                if self.present && sla & 0xF0 == 0xA0 {
                    if read {
                        self.stage = TwiStage::Read;
                        0x40
                    } else {
                        self.pointer = ((sla as u16 >> 1) & 0x07) << 8;
                        self.stage = TwiStage::Write { first: true };
                        0x18
                    }
                } else {
                    self.stage = TwiStage::Idle;
                    if read {
                        0x48
                    } else {
                        0x20
                    }
                }
            }
            TwiStage::Write { first } => {
                let data = self.twdr;
                self.sent.push(data).expect("tx log full");
                if first {
                    self.pointer = (self.pointer & 0x700) | data as u16;
                    self.stage = TwiStage::Write { first: false };
                } else {
                    self.memory[self.pointer as usize] = data;
                    self.pointer = (self.pointer + 1) & 0x7FF;
                }
                0x28
            }
            TwiStage::Read => {
                self.twdr = self.memory[self.pointer as usize];
                self.pointer = (self.pointer + 1) & 0x7FF;
                if control & TWEA != 0 {
                    0x50
                } else {
                    0x58
                }
            }
            TwiStage::Idle => 0x00,
        }
    }
}

impl RegisterFile for TwiSim {
    fn read(&self, reg: Register) -> u8 {
        match reg {
            m32_twi::TWCR => self.twcr,
            m32_twi::TWSR => self.status | self.prescaler,
            m32_twi::TWDR => self.twdr,
            m32_twi::TWBR => self.twbr,
            m32_twi::TWAR => self.twar,
            other => panic!("unexpected TWI read at {:#x}", other.address()),
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        match reg {
            m32_twi::TWCR => {
                // Writing a one to TWINT clears the flag and starts the operation
                self.twcr = value & !(TWINT | TWSTO);
                if value & TWINT == 0 {
                    return;
                }
                if value & TWSTO != 0 {
                    self.stops += 1;
                    self.owned = false;
                    self.stage = TwiStage::Idle;
                    self.status = 0xF8;
                    return;
                }
                self.ops += 1;
                let mut status = self.operate(value);
                if let Some((op, forced)) = self.fault {
                    if op == self.ops {
                        status = forced;
                    }
                }
                self.pending = Some(status);
            }
            m32_twi::TWDR => self.twdr = value,
            m32_twi::TWBR => self.twbr = value,
            m32_twi::TWSR => self.prescaler = value & 0x03,
            m32_twi::TWAR => self.twar = value,
            other => panic!("unexpected TWI write at {:#x}", other.address()),
        }
    }

    fn relax(&mut self) {
        if let Some(status) = self.pending.take() {
            self.status = status;
            self.twcr |= TWINT;
            return;
        }
        self.spins += 1;
        if self.spins > SPIN_LIMIT {
            panic!("TWI simulation stuck: no operation pending");
        }
    }
}
