/*!
state.rs - 6502 architectural state (registers + flags) and the helpers the
executor shares.

Overview
========
`CpuState` owns every architecturally visible register. It excludes:
  - Bus / memory decode
  - Instruction decode
  - Timing / cycle accounting

Design Choices
==============
- Fields are public; the executor and tests poke them directly.
- Flag helpers are atomic (`assign_flag`) plus the `update_zn` composite.
- Stack helpers take the bus and follow the hardware order: push writes at
  `$0100 | SP` then decrements, pull increments then reads.

6502 Status Register Bit Layout
===============================
Bit: 7 6 5 4 3 2 1 0
     N V 1 B D I Z C
  B only exists on the stack copy (BRK/PHP push it set, IRQ/NMI clear).
  D is stored and pushed but never changes arithmetic.
*/

use crate::bus::Bus;

pub const CARRY: u8 = 0b0000_0001;
pub const ZERO: u8 = 0b0000_0010;
pub const IRQ_DISABLE: u8 = 0b0000_0100;
pub const DECIMAL: u8 = 0b0000_1000;
pub const BREAK: u8 = 0b0001_0000;
pub const UNUSED: u8 = 0b0010_0000;
pub const OVERFLOW: u8 = 0b0100_0000;
pub const NEGATIVE: u8 = 0b1000_0000;

const STACK_PAGE: u16 = 0x0100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: IRQ_DISABLE | UNUSED,
        }
    }
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------------
    // Flag Operations
    // ---------------------------------------------------------------------

    #[inline]
    pub fn is_flag_set(&self, mask: u8) -> bool {
        self.status & mask != 0
    }

    #[inline]
    pub fn assign_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    /// ZERO iff `result == 0`, NEGATIVE iff bit 7 of `result`.
    #[inline]
    pub fn update_zn(&mut self, result: u8) {
        self.assign_flag(ZERO, result == 0);
        self.assign_flag(NEGATIVE, result & 0x80 != 0);
    }

    #[inline]
    pub fn carry(&self) -> u8 {
        self.status & CARRY
    }

    /// Status byte as pushed to the stack: UNUSED always set, BREAK only
    /// for BRK/PHP.
    pub fn status_for_push(&self, with_break: bool) -> u8 {
        let v = self.status | UNUSED;
        if with_break { v | BREAK } else { v & !BREAK }
    }

    /// Status as restored by PLP/RTI.
    pub fn restore_status(&mut self, pulled: u8) {
        self.status = (pulled | UNUSED) & !BREAK;
    }

    // ---------------------------------------------------------------------
    // Instruction stream
    // ---------------------------------------------------------------------

    #[inline]
    pub fn fetch_u8(&mut self, bus: &mut Bus) -> u8 {
        let b = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        b
    }

    #[inline]
    pub fn fetch_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.fetch_u8(bus) as u16;
        let hi = self.fetch_u8(bus) as u16;
        (hi << 8) | lo
    }

    // ---------------------------------------------------------------------
    // Stack Helpers
    // ---------------------------------------------------------------------

    #[inline]
    pub fn push_u8(&mut self, bus: &mut Bus, value: u8) {
        bus.write(STACK_PAGE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    #[inline]
    pub fn pop_u8(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_PAGE | self.sp as u16)
    }

    /// Push high byte first, as JSR and interrupt entry do.
    #[inline]
    pub fn push_u16(&mut self, bus: &mut Bus, value: u16) {
        self.push_u8(bus, (value >> 8) as u8);
        self.push_u8(bus, value as u8);
    }

    #[inline]
    pub fn pop_u16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pop_u8(bus) as u16;
        let hi = self.pop_u8(bus) as u16;
        (hi << 8) | lo
    }
}
