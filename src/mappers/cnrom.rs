/*
CNROM (Mapper 3) implementation.

Characteristics:
- PRG: Fixed (16 KiB mirrored or 32 KiB direct) at $8000-$FFFF; no PRG banking.
- CHR: Switchable in 8 KiB banks via CPU writes to $8000-$FFFF (bank select register).
- Mirroring: Determined solely by the iNES header.
- No IRQ generation.

Bank Select:
- The full written value selects the bank, reduced modulo the number of 8 KiB
  banks present (robust for oversize homebrew boards).
*/

use crate::mapper::{Board, Mapper};

pub struct Cnrom {
    board: Board,
    chr_bank: u8,
}

impl Cnrom {
    pub fn new(board: Board) -> Self {
        Self { board, chr_bank: 0 }
    }
}

impl Mapper for Cnrom {
    fn mapper_id(&self) -> u16 {
        3
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    fn read_prg(&mut self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => self.board.read_prg_ram(addr as usize - 0x6000),
            0x8000..=0xFFFF => Some(self.board.prg_byte(addr as usize - 0x8000)),
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.write_prg_ram(addr as usize - 0x6000, value),
            0x8000..=0xFFFF => self.chr_bank = value,
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        self.board.chr_offset(self.chr_bank as usize, 0x2000) + (addr as usize & 0x1FFF)
    }
}
