/*!
MMC2 (Mapper 9) and MMC4 (Mapper 10).

Both boards pair each 4K CHR window with two bank registers and a latch that
flips when the PPU fetches tile $FD or $FE from that pattern table:

- $0FD8 / $0FE8 set latch 0 (MMC4 also matches the rest of the tile row,
  $0FD8-$0FDF / $0FE8-$0FEF)
- $1FD8-$1FDF / $1FE8-$1FEF set latch 1

The latch changes after the triggering byte has been read.

PRG layout differs:
- MMC2: 8K switchable at $8000, last three 8K banks fixed.
- MMC4: 16K switchable at $8000, last 16K bank fixed.

Registers: $A000 PRG, $B000/$C000 CHR 0 (FD/FE), $D000/$E000 CHR 1 (FD/FE),
$F000 mirroring (bit 0: 0=Vertical, 1=Horizontal).
*/

use crate::mapper::{Board, Mapper, Mirroring};

const LATCH_FD: bool = false;
const LATCH_FE: bool = true;

pub struct Mmc2 {
    board: Board,
    mmc4: bool,
    prg_bank: u8,
    // [window][latch]
    chr_banks: [[u8; 2]; 2],
    latches: [bool; 2],
}

impl Mmc2 {
    /// `mmc4` selects the mapper 10 PRG layout and latch decoding.
    pub fn new(board: Board, mmc4: bool) -> Self {
        Self {
            board,
            mmc4,
            prg_bank: 0,
            chr_banks: [[0; 2]; 2],
            latches: [LATCH_FE; 2],
        }
    }

    fn update_latch(&mut self, addr: u16) {
        let tile_row = addr & 0x0FF8;
        let exact = addr & 0x0FFF;
        let window = (addr >> 12) as usize & 1;
        let matches = |target: u16| {
            if window == 0 && !self.mmc4 {
                exact == target
            } else {
                tile_row == target
            }
        };
        if matches(0x0FD8) {
            self.latches[window] = LATCH_FD;
        } else if matches(0x0FE8) {
            self.latches[window] = LATCH_FE;
        }
    }
}

impl Mapper for Mmc2 {
    fn mapper_id(&self) -> u16 {
        if self.mmc4 { 10 } else { 9 }
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
            0x8000..=0xFFFF if self.mmc4 => {
                let bank = if addr < 0xC000 {
                    self.prg_bank as usize
                } else {
                    self.board.prg_bank_count(0x4000) - 1
                };
                let base = self.board.prg_offset(bank, 0x4000);
                Some(self.board.prg_byte(base + (addr as usize & 0x3FFF)))
            }
            0x8000..=0xFFFF => {
                let count = self.board.prg_bank_count(0x2000);
                let bank = match addr {
                    0x8000..=0x9FFF => self.prg_bank as usize,
                    // Last three banks fixed at $A000, $C000, $E000.
                    _ => (((addr - 0x8000) / 0x2000) as usize + 4 * count - 4) % count,
                };
                let base = self.board.prg_offset(bank, 0x2000);
                Some(self.board.prg_byte(base + (addr as usize & 0x1FFF)))
            }
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.board.write_prg_ram(addr as usize - 0x6000, value),
            0xA000..=0xAFFF => self.prg_bank = value & 0x0F,
            0xB000..=0xBFFF => self.chr_banks[0][0] = value & 0x1F,
            0xC000..=0xCFFF => self.chr_banks[0][1] = value & 0x1F,
            0xD000..=0xDFFF => self.chr_banks[1][0] = value & 0x1F,
            0xE000..=0xEFFF => self.chr_banks[1][1] = value & 0x1F,
            0xF000..=0xFFFF => {
                self.board.mirroring = if value & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
            }
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let window = (addr >> 12) as usize & 1;
        let bank = self.chr_banks[window][self.latches[window] as usize];
        self.board.chr_offset(bank as usize, 0x1000) + (addr as usize & 0x0FFF)
    }

    fn read_chr(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x1FFF;
        let value = self.board.chr_byte(self.chr_offset(addr));
        self.update_latch(addr);
        value
    }
}
