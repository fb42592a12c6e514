//! Delta modulation channel (`$4010-$4013`).
//!
//! Sample bytes come from cartridge space through `SampleMemory`: the sample
//! starts at `$C000 + 64 * A`, runs `16 * L + 1` bytes and wraps from
//! `$FFFF` to `$8000`. Each output bit moves the 7-bit level up or down by 2.

use super::SampleMemory;

/// NTSC output-bit periods in CPU cycles.
const RATES: [u16; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

#[derive(Debug, Clone)]
pub struct Dmc {
    irq_enabled: bool,
    looping: bool,
    rate: u16,
    timer: u16,
    level: u8,

    sample_address: u16,
    sample_length: u16,
    address: u16,
    remaining: u16,
    buffer: Option<u8>,

    shift: u8,
    bits: u8,
    silence: bool,

    pub(super) irq: bool,
}

impl Default for Dmc {
    fn default() -> Self {
        Self {
            irq_enabled: false,
            looping: false,
            rate: RATES[0],
            timer: 0,
            level: 0,
            sample_address: 0xC000,
            sample_length: 1,
            address: 0xC000,
            remaining: 0,
            buffer: None,
            shift: 0,
            bits: 8,
            silence: true,
            irq: false,
        }
    }
}

impl Dmc {
    pub fn write(&mut self, reg: u16, value: u8) {
        match reg {
            0 => {
                self.irq_enabled = value & 0x80 != 0;
                if !self.irq_enabled {
                    self.irq = false;
                }
                self.looping = value & 0x40 != 0;
                self.rate = RATES[(value & 0x0F) as usize];
            }
            1 => self.level = value & 0x7F,
            2 => self.sample_address = 0xC000 | ((value as u16) << 6),
            _ => self.sample_length = ((value as u16) << 4) + 1,
        }
    }

    /// `$4015` bit 4. Enabling with no bytes left restarts the sample.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.irq = false;
        if !enabled {
            self.remaining = 0;
        } else if self.remaining == 0 {
            self.restart();
        }
    }

    fn restart(&mut self) {
        self.address = self.sample_address;
        self.remaining = self.sample_length;
    }

    pub fn active(&self) -> bool {
        self.remaining > 0
    }

    /// One CPU cycle.
    pub fn clock(&mut self, memory: &mut dyn SampleMemory) {
        self.fill_buffer(memory);

        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.rate - 1;

        if !self.silence {
            if self.shift & 1 != 0 {
                if self.level <= 125 {
                    self.level += 2;
                }
            } else if self.level >= 2 {
                self.level -= 2;
            }
        }
        self.shift >>= 1;
        self.bits -= 1;
        if self.bits == 0 {
            self.bits = 8;
            match self.buffer.take() {
                Some(byte) => {
                    self.shift = byte;
                    self.silence = false;
                }
                None => self.silence = true,
            }
        }
    }

    fn fill_buffer(&mut self, memory: &mut dyn SampleMemory) {
        if self.buffer.is_some() || self.remaining == 0 {
            return;
        }
        self.buffer = Some(memory.read_sample(self.address));
        self.address = if self.address == 0xFFFF { 0x8000 } else { self.address + 1 };
        self.remaining -= 1;
        if self.remaining == 0 {
            if self.looping {
                self.restart();
            } else if self.irq_enabled {
                self.irq = true;
            }
        }
    }

    pub fn output(&self) -> u8 {
        self.level
    }
}
