/*!
Sunsoft FME-7 (Mapper 69)

Registers
- $8000-$9FFF: command select (low 4 bits)
- $A000-$BFFF: parameter for the selected command
  - 0-7: 1K CHR banks
  - 8:   $6000 window (bits 0-5 bank, bit 6 RAM select, bit 7 RAM enable)
  - 9-B: 8K PRG banks at $8000/$A000/$C000 ($E000 fixed to the last bank)
  - C:   mirroring (0 vertical, 1 horizontal, 2 single lower, 3 single upper)
  - D:   IRQ control (bit 0 IRQ enable, bit 7 counter enable); acknowledges
  - E/F: counter low/high byte

The 16-bit counter decrements once per CPU cycle while enabled and raises
the IRQ when it wraps from $0000 to $FFFF with IRQs enabled.

The Sunsoft 5B audio registers ($C000/$E000) are accepted and ignored.
*/

use crate::mapper::{Board, Mapper, Mirroring};

pub struct Fme7 {
    board: Board,
    command: u8,
    chr_banks: [u8; 8],
    prg_banks: [u8; 3],
    ram_bank: u8,
    irq_enabled: bool,
    counter_enabled: bool,
    counter: u16,
    irq_pending: bool,
}

impl Fme7 {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            command: 0,
            chr_banks: [0; 8],
            prg_banks: [0; 3],
            ram_bank: 0,
            irq_enabled: false,
            counter_enabled: false,
            counter: 0,
            irq_pending: false,
        }
    }

    fn write_parameter(&mut self, value: u8) {
        match self.command {
            0..=7 => self.chr_banks[self.command as usize] = value,
            8 => self.ram_bank = value,
            9..=0x0B => self.prg_banks[(self.command - 9) as usize] = value & 0x3F,
            0x0C => {
                self.board.mirroring = match value & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                };
            }
            0x0D => {
                self.irq_enabled = value & 0x01 != 0;
                self.counter_enabled = value & 0x80 != 0;
                self.irq_pending = false;
            }
            0x0E => self.counter = (self.counter & 0xFF00) | value as u16,
            0x0F => self.counter = (self.counter & 0x00FF) | ((value as u16) << 8),
            _ => unreachable!("FME-7 command is masked to 4 bits"),
        }
    }

    fn rom_byte(&self, bank: usize, addr: u16) -> u8 {
        let base = self.board.prg_offset(bank, 0x2000);
        self.board.prg_byte(base + (addr as usize & 0x1FFF))
    }
}

impl Mapper for Fme7 {
    fn mapper_id(&self) -> u16 {
        69
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    fn read_prg(&mut self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => {
                let bank = (self.ram_bank & 0x3F) as usize;
                match (self.ram_bank & 0x40 != 0, self.ram_bank & 0x80 != 0) {
                    (false, _) => Some(self.rom_byte(bank, addr)),
                    (true, true) => {
                        let base = Board::bank_offset(self.board.prg_ram.len(), bank, 0x2000);
                        self.board.read_prg_ram(base + (addr as usize & 0x1FFF))
                    }
                    (true, false) => None,
                }
            }
            0x8000..=0xDFFF => {
                let slot = ((addr - 0x8000) / 0x2000) as usize;
                Some(self.rom_byte(self.prg_banks[slot] as usize, addr))
            }
            0xE000..=0xFFFF => {
                let last = self.board.prg_bank_count(0x2000) - 1;
                Some(self.rom_byte(last, addr))
            }
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.ram_bank & 0xC0 == 0xC0 {
                    let bank = (self.ram_bank & 0x3F) as usize;
                    let base = Board::bank_offset(self.board.prg_ram.len(), bank, 0x2000);
                    self.board
                        .write_prg_ram(base + (addr as usize & 0x1FFF), value);
                }
            }
            0x8000..=0x9FFF => self.command = value & 0x0F,
            0xA000..=0xBFFF => self.write_parameter(value),
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let slot = (addr as usize >> 10) & 7;
        self.board.chr_offset(self.chr_banks[slot] as usize, 0x400) + (addr as usize & 0x03FF)
    }

    fn tick(&mut self, cpu_cycles: u32) {
        if !self.counter_enabled {
            return;
        }
        for _ in 0..cpu_cycles {
            let (next, wrapped) = self.counter.overflowing_sub(1);
            self.counter = next;
            if wrapped && self.irq_enabled {
                self.irq_pending = true;
            }
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}
