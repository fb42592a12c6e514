/*!
MMC5 (Mapper 5)

Purpose
- PRG banking modes 0-3 over $6000-$FFFF, with RAM banks selectable in the
  $8000-$DFFF windows (bit 7 clear) and a protected PRG RAM write path.
- CHR banking modes 0-3 with two register sets: set A ($5120-$5127) and set
  B ($5128-$512B). With 8x16 sprites and rendering enabled, sprite fetches
  use set A and background fetches use set B.
- 1 KiB ExRAM ($5C00-$5FFF) usable as a name table (modes 0/1), as an
  extended-attribute source (mode 1) or as plain RAM (modes 2/3).
- Per-quadrant name-table select ($5105): CIRAM page 0/1, ExRAM, fill mode.
- Scanline IRQ ($5203 compare, $5204 enable/status) with in-frame flag.
- 8x8 unsigned multiplier ($5205/$5206).
- Raw 8-bit PCM ($5011) exposed as expansion audio.

Notes
- Fetch phase tracking relies on the PPU hooks: `background_memory_start`
  and `sprite_render_start` switch between background and sprite sets; CPU
  accesses to $2006/$2007 fall back to the CPU view.
- The two expansion pulse channels and vertical split mode are not emulated.
*/

use crate::mapper::{Board, Mapper, NameTableSource};

const EXRAM_SIZE: usize = 0x400;
const PCM_SCALE: f32 = 0.25 / 255.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FetchMode {
    Cpu,
    Background,
    Sprites,
}

pub struct Mmc5 {
    board: Board,

    prg_mode: u8,
    chr_mode: u8,
    prg_ram_protect: [u8; 2],
    exram_mode: u8,
    nametable_mapping: u8,
    fill_tile: u8,
    fill_color: u8,
    prg_regs: [u8; 5],
    chr_regs: [u8; 12],
    chr_upper: u8,
    last_chr_set_b: bool,

    exram: [u8; EXRAM_SIZE],
    last_tile_offset: usize,

    sprite_8x16: bool,
    rendering_enabled: bool,
    fetch_mode: FetchMode,

    irq_compare: u8,
    irq_enabled: bool,
    irq_pending: bool,
    in_frame: bool,
    scanline: u8,

    multiplier: [u8; 2],

    pcm_mode: u8,
    raw_pcm: u8,
}

impl Mmc5 {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            prg_mode: 3,
            chr_mode: 3,
            prg_ram_protect: [0; 2],
            exram_mode: 0,
            nametable_mapping: 0,
            fill_tile: 0,
            fill_color: 0,
            prg_regs: [0x00, 0xFF, 0xFF, 0xFF, 0xFF],
            chr_regs: [0xFF; 12],
            chr_upper: 0,
            last_chr_set_b: false,
            exram: [0; EXRAM_SIZE],
            last_tile_offset: 0,
            sprite_8x16: false,
            rendering_enabled: false,
            fetch_mode: FetchMode::Cpu,
            irq_compare: 0,
            irq_enabled: false,
            irq_pending: false,
            in_frame: false,
            scanline: 0,
            multiplier: [0xFF; 2],
            pcm_mode: 0,
            raw_pcm: 0,
        }
    }

    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_protect[0] & 0x03 == 0x02 && self.prg_ram_protect[1] & 0x03 == 0x01
    }

    /// (register index, window size) covering a CPU address in $6000..=$FFFF.
    fn prg_window(&self, addr: u16) -> (usize, usize) {
        const TABLE: [[(usize, usize); 5]; 4] = [
            [(0, 0x2000), (4, 0x8000), (4, 0x8000), (4, 0x8000), (4, 0x8000)],
            [(0, 0x2000), (2, 0x4000), (2, 0x4000), (4, 0x4000), (4, 0x4000)],
            [(0, 0x2000), (2, 0x4000), (2, 0x4000), (3, 0x2000), (4, 0x2000)],
            [(0, 0x2000), (1, 0x2000), (2, 0x2000), (3, 0x2000), (4, 0x2000)],
        ];
        let slot = ((addr - 0x6000) / 0x2000) as usize;
        TABLE[self.prg_mode as usize & 3][slot]
    }

    /// Resolve a CPU address to (is_rom, byte offset into ROM or RAM).
    fn prg_target(&self, addr: u16) -> (bool, usize) {
        let (reg, size) = self.prg_window(addr);
        let value = self.prg_regs[reg];
        let is_rom = match reg {
            0 => false,
            4 => true,
            _ => value & 0x80 != 0,
        };
        let bank_8k = (value & 0x7F) as usize;
        let within = addr as usize & (size - 1);
        if is_rom {
            let bank = bank_8k / (size / 0x2000);
            (true, self.board.prg_offset(bank, size) + within)
        } else {
            let offset = Board::bank_offset(self.board.prg_ram.len(), bank_8k & 0x0F, 0x2000);
            (false, offset + within)
        }
    }

    fn use_set_b(&self) -> bool {
        if !(self.sprite_8x16 && self.rendering_enabled) {
            return false;
        }
        match self.fetch_mode {
            FetchMode::Background => true,
            FetchMode::Sprites => false,
            FetchMode::Cpu => self.last_chr_set_b,
        }
    }

    fn extended_attributes(&self) -> bool {
        self.exram_mode == 1 && self.rendering_enabled && self.fetch_mode == FetchMode::Background
    }

    fn read_register(&mut self, addr: u16) -> Option<u8> {
        match addr {
            0x5010 => Some(self.pcm_mode & 0x01),
            0x5204 => {
                let mut status = 0;
                if self.irq_pending {
                    status |= 0x80;
                }
                if self.in_frame {
                    status |= 0x40;
                }
                self.irq_pending = false;
                Some(status)
            }
            0x5205 => Some((self.multiplier[0] as u16 * self.multiplier[1] as u16) as u8),
            0x5206 => Some(((self.multiplier[0] as u16 * self.multiplier[1] as u16) >> 8) as u8),
            0x5C00..=0x5FFF if self.exram_mode >= 2 => {
                Some(self.exram[addr as usize - 0x5C00])
            }
            _ => None,
        }
    }

    fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x5010 => self.pcm_mode = value,
            0x5011 => {
                if self.pcm_mode & 0x01 == 0 && value != 0 {
                    self.raw_pcm = value;
                }
            }
            0x5100 => self.prg_mode = value & 0x03,
            0x5101 => self.chr_mode = value & 0x03,
            0x5102 => self.prg_ram_protect[0] = value,
            0x5103 => self.prg_ram_protect[1] = value,
            0x5104 => self.exram_mode = value & 0x03,
            0x5105 => self.nametable_mapping = value,
            0x5106 => self.fill_tile = value,
            0x5107 => self.fill_color = value & 0x03,
            0x5113..=0x5117 => self.prg_regs[(addr - 0x5113) as usize] = value,
            0x5120..=0x512B => {
                let index = (addr - 0x5120) as usize;
                self.chr_regs[index] = value;
                self.last_chr_set_b = index > 7;
            }
            0x5130 => self.chr_upper = value & 0x03,
            0x5203 => self.irq_compare = value,
            0x5204 => self.irq_enabled = value & 0x80 != 0,
            0x5205 => self.multiplier[0] = value,
            0x5206 => self.multiplier[1] = value,
            0x5C00..=0x5FFF => {
                // Mode 3 is read-only.
                if self.exram_mode != 3 {
                    self.exram[addr as usize - 0x5C00] = value;
                }
            }
            _ => self
                .board
                .logger
                .debug(format_args!("MMC5 ignored write {value:#04X} -> {addr:#06X}")),
        }
    }
}

impl Mapper for Mmc5 {
    fn mapper_id(&self) -> u16 {
        5
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    fn read_prg(&mut self, addr: u16) -> Option<u8> {
        match addr {
            0x5000..=0x5FFF => self.read_register(addr),
            0x6000..=0xFFFF => match self.prg_target(addr) {
                (true, offset) => Some(self.board.prg_byte(offset)),
                (false, offset) => self.board.read_prg_ram(offset),
            },
            _ => None,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x5000..=0x5FFF => self.write_register(addr, value),
            0x6000..=0xFFFF => {
                if let (false, offset) = self.prg_target(addr) {
                    if self.prg_ram_writable() {
                        self.board.write_prg_ram(offset, value);
                    }
                }
            }
            _ => {}
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        const REGS_A: [[usize; 8]; 4] = [
            [7, 7, 7, 7, 7, 7, 7, 7],
            [3, 3, 3, 3, 7, 7, 7, 7],
            [1, 1, 3, 3, 5, 5, 7, 7],
            [0, 1, 2, 3, 4, 5, 6, 7],
        ];
        const REGS_B: [[usize; 8]; 4] = [
            [11, 11, 11, 11, 11, 11, 11, 11],
            [11, 11, 11, 11, 11, 11, 11, 11],
            [9, 9, 11, 11, 9, 9, 11, 11],
            [8, 9, 10, 11, 8, 9, 10, 11],
        ];
        const SIZES: [usize; 4] = [0x2000, 0x1000, 0x800, 0x400];

        let addr = addr as usize & 0x1FFF;
        if self.extended_attributes() {
            let tile = self.exram[self.last_tile_offset];
            let bank = ((self.chr_upper as usize) << 6) | (tile & 0x3F) as usize;
            return self.board.chr_offset(bank, 0x1000) + (addr & 0x0FFF);
        }

        let mode = self.chr_mode as usize & 3;
        let slot = addr / 0x400;
        let reg = if self.use_set_b() {
            REGS_B[mode][slot]
        } else {
            REGS_A[mode][slot]
        };
        let size = SIZES[mode];
        let bank = ((self.chr_upper as usize) << 8) | self.chr_regs[reg] as usize;
        self.board.chr_offset(bank, size) + (addr & (size - 1))
    }

    fn name_table(&self, quadrant: usize) -> NameTableSource {
        match (self.nametable_mapping >> ((quadrant & 3) * 2)) & 0x03 {
            0 => NameTableSource::Ciram(0),
            1 => NameTableSource::Ciram(1),
            2 => NameTableSource::ExRam,
            _ => NameTableSource::Fill,
        }
    }

    fn read_nametable(&mut self, addr: u16) -> u8 {
        let (quadrant, offset) = Board::split_nametable_addr(addr);
        let attribute = offset >= 0x3C0;
        if self.extended_attributes() && attribute {
            let palette = self.exram[self.last_tile_offset] >> 6;
            return palette * 0x55;
        }
        if !attribute {
            self.last_tile_offset = offset;
        }
        match self.name_table(quadrant) {
            NameTableSource::Ciram(page) => self.board.ciram[page][offset],
            NameTableSource::ExRam if self.exram_mode < 2 => self.exram[offset],
            NameTableSource::ExRam => 0,
            NameTableSource::Fill if attribute => self.fill_color * 0x55,
            NameTableSource::Fill => self.fill_tile,
        }
    }

    fn write_nametable(&mut self, addr: u16, value: u8) {
        let (quadrant, offset) = Board::split_nametable_addr(addr);
        match self.name_table(quadrant) {
            NameTableSource::Ciram(page) => self.board.ciram[page][offset] = value,
            NameTableSource::ExRam if self.exram_mode < 2 => self.exram[offset] = value,
            _ => {}
        }
    }

    fn ppu_register_write(&mut self, reg: u16, value: u8) {
        match reg & 0x07 {
            0 => self.sprite_8x16 = value & 0x20 != 0,
            1 => self.rendering_enabled = value & 0x18 != 0,
            6 | 7 => self.fetch_mode = FetchMode::Cpu,
            _ => {}
        }
    }

    fn line_start(&mut self, scanline: u16) {
        if scanline >= 240 {
            return;
        }
        if !self.in_frame {
            self.in_frame = true;
            self.scanline = 0;
        } else {
            self.scanline = self.scanline.wrapping_add(1);
            if self.irq_compare != 0 && self.scanline == self.irq_compare {
                self.irq_pending = true;
            }
        }
        self.fetch_mode = FetchMode::Background;
    }

    fn sprite_render_start(&mut self) {
        self.fetch_mode = FetchMode::Sprites;
    }

    fn sprite_memory_start(&mut self) {
        self.fetch_mode = FetchMode::Sprites;
    }

    fn background_memory_start(&mut self) {
        self.fetch_mode = FetchMode::Background;
    }

    fn vblank_start(&mut self) {
        self.in_frame = false;
        self.fetch_mode = FetchMode::Cpu;
    }

    fn frame_start(&mut self) {
        self.in_frame = false;
    }

    fn irq_pending(&self) -> bool {
        self.irq_enabled && self.irq_pending
    }

    fn expansion_audio(&self) -> f32 {
        f32::from(self.raw_pcm) * PCM_SCALE
    }
}
