/*
AxROM (Mapper 7).

- PRG: one switchable 32 KiB bank (bits 0-2 of the written value).
- Mirroring: single-screen, page selected by bit 4.
- CHR: 8 KiB RAM, unbanked.
*/

use crate::mapper::{Board, Mapper, Mirroring};

pub struct Axrom {
    board: Board,
    prg_bank: u8,
}

impl Axrom {
    pub fn new(mut board: Board) -> Self {
        board.mirroring = Mirroring::SingleScreenLower;
        Self { board, prg_bank: 0 }
    }
}

impl Mapper for Axrom {
    fn mapper_id(&self) -> u16 {
        7
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
                self.prg_bank = value & 0x07;
                self.board.mirroring = if value & 0x10 != 0 {
                    Mirroring::SingleScreenUpper
                } else {
                    Mirroring::SingleScreenLower
                };
            }
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        addr as usize & 0x1FFF
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::tests::banked_board;

    #[test]
    fn bank_and_single_screen_select() {
        let mut m = Axrom::new(banked_board(0x40000, 0x8000, 0x2000, 0x2000, true));
        assert_eq!(m.mirroring(), Mirroring::SingleScreenLower);
        m.write_prg(0x8000, 0x13);
        assert_eq!(m.read_prg(0x8000), Some(3));
        assert_eq!(m.read_prg(0xFFFF), Some(3));
        assert_eq!(m.mirroring(), Mirroring::SingleScreenUpper);

        m.write_nametable(0x2000, 0x44);
        assert_eq!(m.read_nametable(0x2C00), 0x44);
        assert_eq!(m.board.ciram[1][0], 0x44);
    }
}
