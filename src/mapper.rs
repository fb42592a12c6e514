/*!
Mapper subsystem: the capability trait every cartridge board implements, the
shared `Board` storage, and the NROM (mapper 0) board.

Contract
- `read_prg`/`write_prg` cover CPU $4020..=$FFFF (expansion area, PRG RAM,
  PRG ROM). A read that the board does not drive returns `None` and the bus
  substitutes open bus.
- `read_chr`/`write_chr` cover the PPU pattern tables at $0000..=$1FFF.
- `name_table(quadrant)` resolves one of the four logical name tables to a
  physical source; `read_nametable`/`write_nametable` build on it.
- Timing hooks are invoked by the PPU state machine (`line_start`,
  `sprite_memory_start`, `background_memory_start`, `sprite_render_start`,
  `vblank_start`, `frame_start`) and by the console loop (`tick`). Most boards
  ignore them.

Bank offsets are always byte offsets into the owning storage vector, reduced
modulo the storage length (see `Board::bank_offset`), so an out-of-range bank
register can never index out of bounds.
*/

use crate::error::{EmuError, Result};
use crate::logging::SharedLogger;
use crate::mappers::{Axrom, ColorDreams, Cnrom, Fme7, Gxrom, Mmc1, Mmc2, Mmc3, Mmc5, Uxrom};

/// Size of one physical name table page.
pub const NAME_TABLE_SIZE: usize = 0x400;

/// Name-table mirroring. The variant names the mirroring, not the layout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000/$2400 share a page, $2800/$2C00 share a page.
    Horizontal,
    /// $2000/$2800 share a page, $2400/$2C00 share a page.
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
    FourScreen,
}

impl Mirroring {
    /// Physical CIRAM page for a logical name-table quadrant (0..=3).
    #[inline]
    pub fn page(self, quadrant: usize) -> usize {
        let q = quadrant & 3;
        match self {
            Mirroring::Horizontal => q >> 1,
            Mirroring::Vertical => q & 1,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
            Mirroring::FourScreen => q,
        }
    }
}

/// Where a logical name table's bytes come from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NameTableSource {
    /// One of the console/cartridge CIRAM pages.
    Ciram(usize),
    /// Mapper expansion RAM (MMC5).
    ExRam,
    /// Synthesized fill tile/attribute (MMC5).
    Fill,
}

/// Storage shared by every board: PRG ROM/RAM, CHR ROM/RAM and name tables.
pub struct Board {
    pub prg_rom: Vec<u8>,
    pub prg_ram: Vec<u8>,
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
    pub ciram: [[u8; NAME_TABLE_SIZE]; 4],
    pub mirroring: Mirroring,
    pub battery: bool,
    pub logger: SharedLogger,
}

impl Board {
    pub fn new(
        prg_rom: Vec<u8>,
        prg_ram_len: usize,
        chr: Vec<u8>,
        chr_is_ram: bool,
        mirroring: Mirroring,
        logger: SharedLogger,
    ) -> Self {
        Self {
            prg_rom,
            prg_ram: vec![0; prg_ram_len],
            chr,
            chr_is_ram,
            ciram: [[0; NAME_TABLE_SIZE]; 4],
            mirroring,
            battery: false,
            logger,
        }
    }

    /// Byte offset of `bank` (of `bank_size` bytes) inside storage of
    /// `storage_len` bytes. Always `< storage_len` for non-empty storage.
    #[inline]
    pub fn bank_offset(storage_len: usize, bank: usize, bank_size: usize) -> usize {
        if storage_len == 0 {
            return 0;
        }
        bank.wrapping_mul(bank_size) % storage_len
    }

    /// Number of whole `bank_size` banks in PRG ROM (at least 1).
    #[inline]
    pub fn prg_bank_count(&self, bank_size: usize) -> usize {
        (self.prg_rom.len() / bank_size).max(1)
    }

    /// Number of whole `bank_size` banks in CHR (at least 1).
    #[inline]
    pub fn chr_bank_count(&self, bank_size: usize) -> usize {
        (self.chr.len() / bank_size).max(1)
    }

    #[inline]
    pub fn prg_offset(&self, bank: usize, bank_size: usize) -> usize {
        Self::bank_offset(self.prg_rom.len(), bank, bank_size)
    }

    #[inline]
    pub fn chr_offset(&self, bank: usize, bank_size: usize) -> usize {
        Self::bank_offset(self.chr.len(), bank, bank_size)
    }

    /// PRG ROM byte at `offset` (wrapped into the ROM).
    #[inline]
    pub fn prg_byte(&self, offset: usize) -> u8 {
        if self.prg_rom.is_empty() {
            return 0xFF;
        }
        self.prg_rom[offset % self.prg_rom.len()]
    }

    #[inline]
    pub fn chr_byte(&self, offset: usize) -> u8 {
        if self.chr.is_empty() {
            return 0;
        }
        self.chr[offset % self.chr.len()]
    }

    /// CHR write; ignored (and logged) for CHR ROM.
    #[inline]
    pub fn write_chr_byte(&mut self, offset: usize, value: u8) {
        if !self.chr_is_ram || self.chr.is_empty() {
            self.logger
                .debug(format_args!("ignored CHR ROM write at offset {offset:#06X}"));
            return;
        }
        let len = self.chr.len();
        self.chr[offset % len] = value;
    }

    /// PRG RAM byte at `offset` (wrapped), `None` when the board has no RAM.
    #[inline]
    pub fn read_prg_ram(&self, offset: usize) -> Option<u8> {
        if self.prg_ram.is_empty() {
            return None;
        }
        Some(self.prg_ram[offset % self.prg_ram.len()])
    }

    #[inline]
    pub fn write_prg_ram(&mut self, offset: usize, value: u8) {
        if self.prg_ram.is_empty() {
            return;
        }
        let len = self.prg_ram.len();
        self.prg_ram[offset % len] = value;
    }

    /// Split a PPU name-table address into (quadrant, offset-in-page).
    #[inline]
    pub fn split_nametable_addr(addr: u16) -> (usize, usize) {
        let a = (addr & 0x0FFF) as usize;
        (a / NAME_TABLE_SIZE, a % NAME_TABLE_SIZE)
    }
}

/// Common interface all cartridge boards implement.
pub trait Mapper {
    /// iNES mapper number.
    fn mapper_id(&self) -> u16;

    fn board(&self) -> &Board;
    fn board_mut(&mut self) -> &mut Board;

    /// CPU read at $4020..=$FFFF. `None` leaves the data bus undriven.
    fn read_prg(&mut self, addr: u16) -> Option<u8>;

    /// CPU write at $4020..=$FFFF (PRG RAM or control registers).
    fn write_prg(&mut self, addr: u16, value: u8);

    /// Byte offset into `Board::chr` for a pattern-table address.
    fn chr_offset(&self, addr: u16) -> usize;

    /// PPU pattern-table read. Boards that latch state from fetch patterns
    /// (MMC2/MMC4) override this.
    fn read_chr(&mut self, addr: u16) -> u8 {
        let offset = self.chr_offset(addr & 0x1FFF);
        self.board().chr_byte(offset)
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        let offset = self.chr_offset(addr & 0x1FFF);
        self.board_mut().write_chr_byte(offset, value);
    }

    /// Current mirroring policy.
    fn mirroring(&self) -> Mirroring {
        self.board().mirroring
    }

    /// Physical source of logical name table `quadrant` (0..=3).
    fn name_table(&self, quadrant: usize) -> NameTableSource {
        NameTableSource::Ciram(self.mirroring().page(quadrant))
    }

    /// Name-table read for PPU addresses $2000..=$3EFF.
    fn read_nametable(&mut self, addr: u16) -> u8 {
        let (quadrant, offset) = Board::split_nametable_addr(addr);
        match self.name_table(quadrant) {
            NameTableSource::Ciram(page) => self.board().ciram[page & 3][offset],
            NameTableSource::ExRam | NameTableSource::Fill => 0,
        }
    }

    fn write_nametable(&mut self, addr: u16, value: u8) {
        let (quadrant, offset) = Board::split_nametable_addr(addr);
        if let NameTableSource::Ciram(page) = self.name_table(quadrant) {
            self.board_mut().ciram[page & 3][offset] = value;
        }
    }

    /// CPU write to a PPU register ($2000..=$2007), visible to boards that
    /// snoop PPUCTRL/PPUMASK.
    fn ppu_register_write(&mut self, _reg: u16, _value: u8) {}

    /// Start of a rendered scanline (visible lines and the pre-render line).
    fn line_start(&mut self, _scanline: u16) {}

    /// Sprite pattern fetches for the next line begin (dot 257).
    fn sprite_memory_start(&mut self) {}

    /// Background prefetch for the next line begins (dot 321).
    fn background_memory_start(&mut self) {}

    /// The renderer switches from background to sprite pattern reads.
    fn sprite_render_start(&mut self) {}

    fn vblank_start(&mut self) {}

    /// Frame boundary at the end of the pre-render line.
    fn frame_start(&mut self) {}

    /// Advance cycle-driven state by `cpu_cycles`.
    fn tick(&mut self, _cpu_cycles: u32) {}

    /// Whether this board is asserting the IRQ line.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Expansion audio output in the same scale as the APU mixer (0.0..=1.0).
    fn expansion_audio(&self) -> f32 {
        0.0
    }

    /// Battery-backable PRG RAM contents.
    fn prg_ram(&self) -> &[u8] {
        &self.board().prg_ram
    }

    /// Restore PRG RAM (e.g. from a save file); extra bytes are ignored.
    fn load_prg_ram(&mut self, data: &[u8]) {
        let ram = &mut self.board_mut().prg_ram;
        let n = ram.len().min(data.len());
        ram[..n].copy_from_slice(&data[..n]);
    }
}

/// Construct the board for `mapper_id`.
pub fn create(mapper_id: u16, board: Board) -> Result<Box<dyn Mapper>> {
    let mapper: Box<dyn Mapper> = match mapper_id {
        0 => Box::new(Nrom::new(board)),
        1 => Box::new(Mmc1::new(board)),
        2 => Box::new(Uxrom::new(board)),
        3 => Box::new(Cnrom::new(board)),
        4 => Box::new(Mmc3::new(board)),
        5 => Box::new(Mmc5::new(board)),
        7 => Box::new(Axrom::new(board)),
        9 => Box::new(Mmc2::new(board, false)),
        10 => Box::new(Mmc2::new(board, true)),
        11 => Box::new(ColorDreams::new(board)),
        66 => Box::new(Gxrom::new(board)),
        69 => Box::new(Fme7::new(board)),
        other => {
            board
                .logger
                .error(format_args!("no handler for mapper {other}"));
            return Err(EmuError::UnsupportedMapper(other));
        }
    };
    Ok(mapper)
}

/// NROM (mapper 0).
///
/// - PRG ROM: 16 KiB (mirrored) or 32 KiB at $8000..=$FFFF.
/// - PRG RAM: optional, at $6000..=$7FFF.
/// - CHR: 8 KiB ROM or RAM, no banking.
pub struct Nrom {
    board: Board,
}

impl Nrom {
    pub fn new(board: Board) -> Self {
        Self { board }
    }

    /// Returns true if this is an NROM-128 (16 KiB PRG) ROM.
    pub fn is_nrom_128(&self) -> bool {
        self.board.prg_rom.len() == 16 * 1024
    }
}

impl Mapper for Nrom {
    fn mapper_id(&self) -> u16 {
        0
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
            _ => self
                .board
                .logger
                .debug(format_args!("NROM ignored write {value:#04X} -> {addr:#06X}")),
        }
    }

    fn chr_offset(&self, addr: u16) -> usize {
        addr as usize & 0x1FFF
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::logging::null_logger;

    /// Board with distinguishable PRG/CHR bank contents: every byte of bank
    /// `n` (in `prg_bank`/`chr_bank` units) holds `n`.
    pub(crate) fn banked_board(
        prg_len: usize,
        prg_bank: usize,
        chr_len: usize,
        chr_bank: usize,
        chr_is_ram: bool,
    ) -> Board {
        let prg: Vec<u8> = (0..prg_len).map(|i| (i / prg_bank) as u8).collect();
        let chr: Vec<u8> = if chr_is_ram {
            vec![0; chr_len]
        } else {
            (0..chr_len).map(|i| (i / chr_bank) as u8).collect()
        };
        Board::new(prg, 8 * 1024, chr, chr_is_ram, Mirroring::Horizontal, null_logger())
    }

    #[test]
    fn bank_offset_always_in_bounds() {
        for len in [0x2000usize, 0x4000, 0x6000, 0x20000] {
            for bank in 0..=u8::MAX as usize {
                for size in [0x400usize, 0x1000, 0x2000, 0x4000, 0x8000] {
                    assert!(Board::bank_offset(len, bank, size) < len);
                }
            }
        }
        assert_eq!(Board::bank_offset(0, 7, 0x2000), 0);
    }

    #[test]
    fn mirroring_pages() {
        assert_eq!(
            (0..4).map(|q| Mirroring::Horizontal.page(q)).collect::<Vec<_>>(),
            vec![0, 0, 1, 1]
        );
        assert_eq!(
            (0..4).map(|q| Mirroring::Vertical.page(q)).collect::<Vec<_>>(),
            vec![0, 1, 0, 1]
        );
        assert_eq!(Mirroring::SingleScreenUpper.page(2), 1);
        assert_eq!(Mirroring::FourScreen.page(3), 3);
    }

    #[test]
    fn nrom_32k_prg_basic() {
        let mut board = banked_board(32 * 1024, 0x4000, 8 * 1024, 0x2000, false);
        board.chr.fill(0xCC);
        let mut nrom = Nrom::new(board);

        assert_eq!(nrom.read_prg(0x8000), Some(0));
        assert_eq!(nrom.read_prg(0xFFFF), Some(1));

        nrom.write_prg(0x6000, 0x42);
        assert_eq!(nrom.read_prg(0x6000), Some(0x42));

        // CHR ROM read, write ignored
        assert_eq!(nrom.read_chr(0x0000), 0xCC);
        nrom.write_chr(0x0000, 0x11);
        assert_eq!(nrom.read_chr(0x0000), 0xCC);
    }

    #[test]
    fn nrom_16k_prg_mirroring() {
        let mut board = banked_board(16 * 1024, 0x4000, 8 * 1024, 0x2000, true);
        board.prg_rom[0] = 0x12;
        board.prg_rom[0x3FFF] = 0x34;
        let mut nrom = Nrom::new(board);
        assert!(nrom.is_nrom_128());

        assert_eq!(nrom.read_prg(0x8000), Some(0x12));
        assert_eq!(nrom.read_prg(0xBFFF), Some(0x34));
        assert_eq!(nrom.read_prg(0xC000), Some(0x12));
        assert_eq!(nrom.read_prg(0xFFFF), Some(0x34));
    }

    #[test]
    fn nrom_without_ram_leaves_bus_undriven() {
        let mut board = banked_board(16 * 1024, 0x4000, 8 * 1024, 0x2000, true);
        board.prg_ram.clear();
        let mut nrom = Nrom::new(board);
        assert_eq!(nrom.read_prg(0x6000), None);
        assert_eq!(nrom.read_prg(0x5000), None);
    }

    #[test]
    fn chr_ram_is_writable() {
        let board = banked_board(32 * 1024, 0x4000, 8 * 1024, 0x2000, true);
        let mut nrom = Nrom::new(board);
        nrom.write_chr(0x0001, 0x77);
        assert_eq!(nrom.read_chr(0x0001), 0x77);
    }

    #[test]
    fn nametables_follow_header_mirroring() {
        let mut board = banked_board(16 * 1024, 0x4000, 8 * 1024, 0x2000, true);
        board.mirroring = Mirroring::Vertical;
        let mut nrom = Nrom::new(board);
        nrom.write_nametable(0x2005, 0x9A);
        assert_eq!(nrom.read_nametable(0x2805), 0x9A);
        assert_eq!(nrom.read_nametable(0x2405), 0x00);
    }

    #[test]
    fn unknown_mapper_is_an_error() {
        let board = banked_board(16 * 1024, 0x4000, 8 * 1024, 0x2000, true);
        assert!(matches!(
            create(200, board),
            Err(EmuError::UnsupportedMapper(200))
        ));
    }
}
