/*!
MMC3 (Mapper 4)

- Bank select ($8000 even) / bank data ($8001 odd) registers
- PRG banking modes (bit 6) with two switchable 8K banks + fixed second-last + fixed last
- CHR banking (two 2KB + four 1KB banks) with inversion (bit 7)
- Runtime nametable mirroring control ($A000 even write bit 0: 0=Vertical, 1=Horizontal),
  ignored on four-screen boards
- PRG RAM enable (bit 7) and write protect (bit 6) via $A001 odd writes
- Scanline IRQ counter: latch ($C000), reload ($C001), disable/ack ($E000), enable ($E001)

Notes:
- The counter is clocked once per rendered line from the `line_start` hook
  instead of by watching PPU A12 edges.
- Disabled PRG RAM leaves the data bus undriven and preserves contents.
- Write-protected PRG RAM ignores writes.
*/

use crate::mapper::{Board, Mapper, Mirroring};

pub struct Mmc3 {
    board: Board,

    // Bank registers R0..R7
    bank_regs: [u8; 8],
    bank_select: u8,

    // IRQ state
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,

    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,
    four_screen: bool,
}

impl Mmc3 {
    pub fn new(board: Board) -> Self {
        let four_screen = board.mirroring == Mirroring::FourScreen;
        Self {
            board,
            bank_regs: [0, 2, 4, 5, 6, 7, 0, 1],
            bank_select: 0,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            four_screen,
        }
    }

    #[inline]
    fn prg_mode(&self) -> u8 {
        (self.bank_select >> 6) & 1
    }

    #[inline]
    fn chr_inversion(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    /// 8K PRG bank index for a CPU address in $8000..=$FFFF.
    fn prg_bank_for(&self, addr: u16) -> usize {
        let count = self.board.prg_bank_count(0x2000);
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let slot = ((addr - 0x8000) / 0x2000) as u8;
        match (slot, self.prg_mode()) {
            (0, 0) | (2, 1) => self.bank_regs[6] as usize,
            (0, 1) | (2, 0) => second_last,
            (1, _) => self.bank_regs[7] as usize,
            _ => last,
        }
    }

    /// 1K CHR bank index for a PPU address in $0000..=$1FFF.
    fn chr_bank_for(&self, addr: u16) -> usize {
        let a = if self.chr_inversion() { addr ^ 0x1000 } else { addr };
        match a {
            0x0000..=0x07FF => (self.bank_regs[0] & 0xFE) as usize + ((a >> 10) & 1) as usize,
            0x0800..=0x0FFF => (self.bank_regs[1] & 0xFE) as usize + ((a >> 10) & 1) as usize,
            _ => self.bank_regs[2 + ((a - 0x1000) >> 10) as usize] as usize,
        }
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        let even = addr & 1 == 0;
        match (addr, even) {
            (0x8000..=0x9FFF, true) => self.bank_select = value,
            (0x8000..=0x9FFF, false) => {
                let target = (self.bank_select & 0x07) as usize;
                self.bank_regs[target] = value;
            }
            (0xA000..=0xBFFF, true) => {
                if !self.four_screen {
                    self.board.mirroring = if value & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                }
            }
            (0xA000..=0xBFFF, false) => {
                self.prg_ram_enabled = value & 0x80 != 0;
                self.prg_ram_write_protect = value & 0x40 != 0;
            }
            (0xC000..=0xDFFF, true) => self.irq_latch = value,
            (0xC000..=0xDFFF, false) => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            (_, true) => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            (_, false) => self.irq_enabled = true,
        }
    }

    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }
}

impl Mapper for Mmc3 {
    fn mapper_id(&self) -> u16 {
        4
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    fn read_prg(&mut self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => {
                self.board.read_prg_ram(addr as usize - 0x6000)
            }
            0x8000..=0xFFFF => {
                let base = self.board.prg_offset(self.prg_bank_for(addr), 0x2000);
                Some(self.board.prg_byte(base + (addr as usize & 0x1FFF)))
            }
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled && !self.prg_ram_write_protect {
                    self.board.write_prg_ram(addr as usize - 0x6000, value);
                }
            }
            0x8000..=0xFFFF => self.write_register(addr, value),
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        self.board.chr_offset(self.chr_bank_for(addr), 0x400) + (addr as usize & 0x03FF)
    }

    fn line_start(&mut self, _scanline: u16) {
        self.clock_irq_counter();
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}
