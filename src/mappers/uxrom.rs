/*
UxROM (Mapper 2).

- PRG: switchable 16 KiB bank at $8000-$BFFF, last bank fixed at $C000-$FFFF.
- CHR: 8 KiB, usually RAM, unbanked.
- Mirroring fixed by the header.
*/

use crate::mapper::{Board, Mapper};

pub struct Uxrom {
    board: Board,
    prg_bank: u8,
}

impl Uxrom {
    pub fn new(board: Board) -> Self {
        Self { board, prg_bank: 0 }
    }
}

impl Mapper for Uxrom {
    fn mapper_id(&self) -> u16 {
        2
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
            0x8000..=0xBFFF => {
                let base = self.board.prg_offset(self.prg_bank as usize, 0x4000);
                Some(self.board.prg_byte(base + (addr as usize & 0x3FFF)))
            }
            0xC000..=0xFFFF => {
                let last = self.board.prg_bank_count(0x4000) - 1;
                let base = self.board.prg_offset(last, 0x4000);
                Some(self.board.prg_byte(base + (addr as usize & 0x3FFF)))
            }
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.write_prg_ram(addr as usize - 0x6000, value),
            0x8000..=0xFFFF => self.prg_bank = value,
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        addr as usize & 0x1FFF
    }
}
