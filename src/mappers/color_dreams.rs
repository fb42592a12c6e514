/*
Color Dreams (Mapper 11).

A single latch at $8000-$FFFF: bits 0-1 select a 32 KiB PRG bank, bits 4-7
select an 8 KiB CHR bank.
*/

use crate::mapper::{Board, Mapper};

pub struct ColorDreams {
    board: Board,
    prg_bank: u8,
    chr_bank: u8,
}

impl ColorDreams {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            prg_bank: 0,
            chr_bank: 0,
        }
    }
}

impl Mapper for ColorDreams {
    fn mapper_id(&self) -> u16 {
        11
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
            0x8000..=0xFFFF => {
                let base = self.board.prg_offset(self.prg_bank as usize, 0x8000);
                Some(self.board.prg_byte(base + (addr as usize & 0x7FFF)))
            }
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.write_prg_ram(addr as usize - 0x6000, value),
            0x8000..=0xFFFF => {
                self.prg_bank = value & 0x03;
                self.chr_bank = value >> 4;
            }
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        self.board.chr_offset(self.chr_bank as usize, 0x2000) + (addr as usize & 0x1FFF)
    }
}
