//! MMC1 (Mapper 1) implementation.
//!
//! Implements:
//! - Serial shift register writes (5-bit) to control / CHR0 / CHR1 / PRG registers
//! - PRG banking modes (32K switch, or 16K with fixed low or high)
//! - CHR banking (8K or 4K+4K)
//! - Mirroring control (single-screen lower/upper, vertical, horizontal)
//! - PRG RAM enable bit (bit 4 of the PRG register, active low)
//!
//! Simplified:
//! - Large board variants (SUROM / SOROM / etc.) use the low 4 PRG bits only
use crate::mapper::{Board, Mapper, Mirroring};

/// MMC1 mapper core state.
pub struct Mmc1 {
    board: Board,

    // 5-bit registers
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,

    // Serial latch
    shift_reg: u8,
    shift_count: u8,
}

impl Mmc1 {
    pub fn new(board: Board) -> Self {
        let mut s = Self {
            board,
            control: 0x0C, // power-on default: 16K mode, fixed last bank
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
            shift_reg: 0,
            shift_count: 0,
        };
        s.apply_mirroring();
        s
    }

    #[inline]
    fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0x03
    }

    #[inline]
    fn chr_mode(&self) -> u8 {
        (self.control >> 4) & 0x01
    }

    #[inline]
    fn prg_ram_enabled(&self) -> bool {
        self.prg_bank & 0x10 == 0
    }

    fn apply_mirroring(&mut self) {
        self.board.mirroring = match self.control & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        };
    }

    /// 16K PRG bank indices currently mapped at $8000 and $C000.
    fn prg_banks(&self) -> (usize, usize) {
        let count = self.board.prg_bank_count(0x4000);
        let bank = (self.prg_bank & 0x0F) as usize;
        match self.prg_mode() {
            0 | 1 => {
                let base = bank & !1;
                (base, base + 1)
            }
            2 => (0, bank),
            _ => (bank, count - 1),
        }
    }

    /// 4K CHR bank indices currently mapped at $0000 and $1000.
    fn chr_banks(&self) -> (usize, usize) {
        if self.chr_mode() == 0 {
            let base = (self.chr_bank0 & !1) as usize;
            (base, base + 1)
        } else {
            (self.chr_bank0 as usize, self.chr_bank1 as usize)
        }
    }

    fn commit_register(&mut self, addr: u16, value5: u8) {
        match addr {
            0x8000..=0x9FFF => {
                self.control = value5 & 0x1F;
                self.apply_mirroring();
            }
            0xA000..=0xBFFF => self.chr_bank0 = value5 & 0x1F,
            0xC000..=0xDFFF => self.chr_bank1 = value5 & 0x1F,
            _ => self.prg_bank = value5 & 0x1F,
        }
    }

    fn serial_write(&mut self, addr: u16, data: u8) {
        if data & 0x80 != 0 {
            self.shift_reg = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            return;
        }
        self.shift_reg |= (data & 1) << self.shift_count;
        self.shift_count += 1;
        if self.shift_count == 5 {
            let value5 = self.shift_reg & 0x1F;
            self.commit_register(addr, value5);
            self.shift_reg = 0;
            self.shift_count = 0;
        }
    }
}

impl Mapper for Mmc1 {
    fn mapper_id(&self) -> u16 {
        1
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    fn read_prg(&mut self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled() => {
                self.board.read_prg_ram(addr as usize - 0x6000)
            }
            0x8000..=0xFFFF => {
                let (lo, hi) = self.prg_banks();
                let bank = if addr < 0xC000 { lo } else { hi };
                let base = self.board.prg_offset(bank, 0x4000);
                Some(self.board.prg_byte(base + (addr as usize & 0x3FFF)))
            }
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled() {
                    self.board.write_prg_ram(addr as usize - 0x6000, value);
                }
            }
            0x8000..=0xFFFF => self.serial_write(addr, value),
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let (lo, hi) = self.chr_banks();
        let bank = if addr < 0x1000 { lo } else { hi };
        self.board.chr_offset(bank, 0x1000) + (addr as usize & 0x0FFF)
    }
}

#[cfg(test)]
mod tests {
    use super::Mmc1;
    use crate::mapper::tests::banked_board;
    use crate::mapper::{Mapper, Mirroring};

    fn write_serial(mapper: &mut Mmc1, addr: u16, value5: u8) {
        for i in 0..5 {
            mapper.write_prg(addr, (value5 >> i) & 1);
        }
    }

    fn mmc1(prg_kb: usize, chr_kb: usize) -> Mmc1 {
        Mmc1::new(banked_board(prg_kb * 1024, 0x4000, chr_kb * 1024, 0x1000, false))
    }

    #[test]
    fn power_on_fixes_last_bank_high() {
        let mut m = mmc1(128, 8);
        assert_eq!(m.read_prg(0x8000), Some(0));
        assert_eq!(m.read_prg(0xC000), Some(7));
    }

    #[test]
    fn prg_mode_fix_upper_switch_low() {
        let mut m = mmc1(128, 8);
        write_serial(&mut m, 0x8000, 0b01111); // mode 3
        write_serial(&mut m, 0xE000, 0b00101); // prg_bank=5
        assert_eq!(m.read_prg(0x8000), Some(5));
        assert_eq!(m.read_prg(0xFFFF), Some(7));
    }

    #[test]
    fn prg_mode_fix_lower_switch_high() {
        let mut m = mmc1(128, 8);
        write_serial(&mut m, 0x8000, 0b01011); // mode 2
        write_serial(&mut m, 0xE000, 3);
        assert_eq!(m.read_prg(0x8000), Some(0));
        assert_eq!(m.read_prg(0xC000), Some(3));
    }

    #[test]
    fn prg_32k_mode_ignores_low_bit() {
        let mut m = mmc1(128, 8);
        write_serial(&mut m, 0x8000, 0b00000);
        write_serial(&mut m, 0xE000, 0b00011);
        assert_eq!(m.read_prg(0x8000), Some(2));
        assert_eq!(m.read_prg(0xC000), Some(3));
    }

    #[test]
    fn chr_8k_mode_mapping() {
        let mut m = mmc1(32, 16);
        write_serial(&mut m, 0x8000, 0b00000); // chr_mode=0
        write_serial(&mut m, 0xA000, 0b00011); // low bit ignored
        assert_eq!(m.read_chr(0x0000), 2);
        assert_eq!(m.read_chr(0x1000), 3);
    }

    #[test]
    fn chr_4k_mode_mapping() {
        let mut m = mmc1(32, 16);
        write_serial(&mut m, 0x8000, 0b10000); // chr_mode=1
        write_serial(&mut m, 0xA000, 0b00001);
        write_serial(&mut m, 0xC000, 0b00010);
        assert_eq!(m.read_chr(0x0000), 1);
        assert_eq!(m.read_chr(0x1000), 2);
    }

    #[test]
    fn reset_bit_clears_shift_register() {
        let mut m = mmc1(128, 8);
        m.write_prg(0xE000, 1);
        m.write_prg(0xE000, 1);
        m.write_prg(0x8000, 0x80);
        write_serial(&mut m, 0xE000, 0b00010);
        assert_eq!(m.read_prg(0x8000), Some(2));
    }

    #[test]
    fn mirroring_control() {
        let mut m = mmc1(32, 8);
        write_serial(&mut m, 0x8000, 0b01100);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenLower);
        write_serial(&mut m, 0x8000, 0b01101);
        assert_eq!(m.mirroring(), Mirroring::SingleScreenUpper);
        write_serial(&mut m, 0x8000, 0b01110);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        write_serial(&mut m, 0x8000, 0b01111);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn prg_ram_round_trip_and_disable() {
        let mut m = mmc1(32, 8);
        m.write_prg(0x6123, 0x5A);
        assert_eq!(m.read_prg(0x6123), Some(0x5A));
        write_serial(&mut m, 0xE000, 0b10000);
        assert_eq!(m.read_prg(0x6123), None);
        m.write_prg(0x6123, 0x00);
        write_serial(&mut m, 0xE000, 0);
        assert_eq!(m.read_prg(0x6123), Some(0x5A));
    }
}
