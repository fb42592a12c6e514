/*!
addressing.rs - 6502 addressing modes and operand resolution.

Overview
========
`resolve` consumes the operand bytes of the current instruction (PC points
just past the opcode) and yields an `Operand` plus whether indexing crossed
a page.

Dummy reads
===========
For AbsoluteX / AbsoluteY / IndirectY the hardware first reads the
un-carried address `(base & 0xFF00) | (effective & 0x00FF)`. That read is
performed here whenever the page is crossed, and always for store and
read-modify-write instructions. It goes through the full bus read path, so
register side effects (e.g. PPUSTATUS, PPUDATA) happen.

Quirks
======
- Zero-page indexing wraps within page zero.
- Indirect pointers read from page zero wrap within page zero.
- JMP ($xxFF) fetches the high byte from $xx00.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
            AddressingMode::Absolute
            | AddressingMode::AbsoluteX
            | AddressingMode::AbsoluteY
            | AddressingMode::Indirect => 2,
            _ => 1,
        }
    }
}

/// How an instruction touches its memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    None,
    Read,
    Write,
    ReadModifyWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    /// Effective address (branch target for Relative).
    Address(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub operand: Operand,
    pub page_crossed: bool,
}

impl Resolved {
    fn plain(operand: Operand) -> Self {
        Self {
            operand,
            page_crossed: false,
        }
    }
}

#[inline]
fn crosses(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

/// Add `index` to `base`, issuing the un-carried dummy read when required.
fn indexed(bus: &mut Bus, base: u16, index: u8, access: Access) -> Resolved {
    let addr = base.wrapping_add(index as u16);
    let page_crossed = crosses(base, addr);
    if page_crossed || matches!(access, Access::Write | Access::ReadModifyWrite) {
        bus.read((base & 0xFF00) | (addr & 0x00FF));
    }
    Resolved {
        operand: Operand::Address(addr),
        page_crossed,
    }
}

pub(crate) fn resolve(
    cpu: &mut CpuState,
    bus: &mut Bus,
    mode: AddressingMode,
    access: Access,
) -> Resolved {
    match mode {
        AddressingMode::Implied => Resolved::plain(Operand::Implied),
        AddressingMode::Accumulator => Resolved::plain(Operand::Accumulator),
        AddressingMode::Immediate => Resolved::plain(Operand::Immediate(cpu.fetch_u8(bus))),
        AddressingMode::ZeroPage => {
            Resolved::plain(Operand::Address(cpu.fetch_u8(bus) as u16))
        }
        AddressingMode::ZeroPageX => {
            let zp = cpu.fetch_u8(bus).wrapping_add(cpu.x);
            Resolved::plain(Operand::Address(zp as u16))
        }
        AddressingMode::ZeroPageY => {
            let zp = cpu.fetch_u8(bus).wrapping_add(cpu.y);
            Resolved::plain(Operand::Address(zp as u16))
        }
        AddressingMode::Absolute => Resolved::plain(Operand::Address(cpu.fetch_u16(bus))),
        AddressingMode::AbsoluteX => {
            let base = cpu.fetch_u16(bus);
            indexed(bus, base, cpu.x, access)
        }
        AddressingMode::AbsoluteY => {
            let base = cpu.fetch_u16(bus);
            indexed(bus, base, cpu.y, access)
        }
        AddressingMode::Indirect => {
            let ptr = cpu.fetch_u16(bus);
            Resolved::plain(Operand::Address(bus.read_word_page_wrapped(ptr)))
        }
        AddressingMode::IndirectX => {
            let zp = cpu.fetch_u8(bus).wrapping_add(cpu.x);
            Resolved::plain(Operand::Address(bus.read_word_page_wrapped(zp as u16)))
        }
        AddressingMode::IndirectY => {
            let zp = cpu.fetch_u8(bus);
            let base = bus.read_word_page_wrapped(zp as u16);
            indexed(bus, base, cpu.y, access)
        }
        AddressingMode::Relative => {
            let offset = cpu.fetch_u8(bus) as i8;
            let target = cpu.pc.wrapping_add(offset as u16);
            Resolved {
                operand: Operand::Address(target),
                page_crossed: crosses(cpu.pc, target),
            }
        }
    }
}
