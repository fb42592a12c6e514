#![doc = r#"
PPU registers module

CPU-visible register semantics for $2000..=$2007 (mirrored through $3FFF)
and the loopy scroll registers.

Notes
- Reads return an open-bus encoded `u16`. PPUSTATUS drives only bits 5-7;
  the write-only registers drive nothing.
- PPUDATA reads below $3F00 return the internal read buffer and refill it.
  Palette reads return the palette byte directly and refill the buffer from
  the name table underneath ($3F00 - $1000).
- `v` increments by 1 or 32 (PPUCTRL bit 2) after every PPUDATA access.
- Setting PPUCTRL bit 7 while the vblank flag is up raises an NMI.
"#]

use super::*;
use crate::bus::open_bus::{UNDRIVEN, driven, partial};

/// Scroll bits copied from `t` to `v` at dot 257 (coarse X, name table X).
const HORIZONTAL_BITS: u16 = 0x041F;
/// Scroll bits copied from `t` to `v` on the pre-render line.
const VERTICAL_BITS: u16 = 0x7BE0;

impl Ppu {
    /// CPU read of a PPU register.
    pub fn read_register(&mut self, addr: u16, mapper: &mut dyn Mapper) -> u16 {
        match addr & 0x0007 {
            2 => {
                let value = partial(self.status & 0xE0, 0x1F);
                self.set_status(STATUS_VBLANK, false);
                self.write_toggle = false;
                value
            }
            4 => driven(self.oam[self.oam_addr as usize]),
            7 => {
                let addr = self.v & 0x3FFF;
                let value = if addr >= 0x3F00 {
                    self.read_buffer = self.read_vram(addr - 0x1000, mapper);
                    self.read_vram(addr, mapper)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.read_vram(addr, mapper);
                    buffered
                };
                self.increment_vram_addr();
                driven(value)
            }
            _ => UNDRIVEN,
        }
    }

    /// CPU write to a PPU register.
    pub fn write_register(
        &mut self,
        addr: u16,
        value: u8,
        mapper: &mut dyn Mapper,
        interrupts: &mut InterruptController,
    ) {
        match addr & 0x0007 {
            0 => {
                let was_enabled = self.ctrl & CTRL_NMI != 0;
                self.ctrl = value;
                self.t = (self.t & !0x0C00) | (((value & 0x03) as u16) << 10);
                if !was_enabled && value & CTRL_NMI != 0 && self.vblank() {
                    interrupts.trigger_nmi();
                }
            }
            1 => self.mask = value,
            2 => {}
            3 => self.oam_addr = value,
            4 => self.write_oam_data(value),
            5 => {
                if !self.write_toggle {
                    self.t = (self.t & !0x001F) | (value >> 3) as u16;
                    self.fine_x = value & 0x07;
                } else {
                    self.t = (self.t & !0x73E0)
                        | (((value & 0x07) as u16) << 12)
                        | (((value & 0xF8) as u16) << 2);
                }
                self.write_toggle = !self.write_toggle;
            }
            6 => {
                if !self.write_toggle {
                    self.t = (self.t & 0x00FF) | (((value & 0x3F) as u16) << 8);
                } else {
                    self.t = (self.t & 0xFF00) | value as u16;
                    self.v = self.t;
                }
                self.write_toggle = !self.write_toggle;
            }
            _ => {
                self.write_vram(self.v & 0x3FFF, value, mapper);
                self.increment_vram_addr();
            }
        }
    }

    fn increment_vram_addr(&mut self) {
        let step = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }

    /// Advance fine Y, carrying into coarse Y and the vertical name table.
    pub(in crate::ppu) fn increment_fine_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        match coarse_y {
            29 => {
                coarse_y = 0;
                self.v ^= 0x0800;
            }
            31 => coarse_y = 0,
            _ => coarse_y += 1,
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    pub(in crate::ppu) fn copy_horizontal(&mut self) {
        self.v = (self.v & !HORIZONTAL_BITS) | (self.t & HORIZONTAL_BITS);
    }

    pub(in crate::ppu) fn copy_vertical(&mut self) {
        self.v = (self.v & !VERTICAL_BITS) | (self.t & VERTICAL_BITS);
    }
}
