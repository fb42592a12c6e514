/*!
PPU: CPU-visible registers, a phase state machine for timing, and a
scanline renderer.

STRUCTURE:
- `phase.rs`: the per-scanline phase chain. Each phase does its work and
  returns the next phase plus the dot delay until it runs.
- `registers.rs`: $2000..$2007 semantics and the loopy `v`/`t`/`x`/`w`
  scroll registers.
- `memory.rs`: PPU address space (CHR and name tables through the mapper,
  palette RAM here) and OAM.
- `sprite.rs`: decoded sprite cache, per-line evaluation and pattern fetch.
- `renderer.rs`: background strip, sprite compositing, palette transform.

TIMING:
- `tick(cpu_cycles, ..)` adds `3 * cpu_cycles` dots and drains every phase
  whose dot has been reached. A frame is 341 x 262 dots, one dot shorter on
  odd frames while rendering is enabled.
- The PPU never holds a reference to the mapper or interrupt controller;
  the bus lends them for each call.

OUTPUT:
- Each visible line is composed at dot 256 into the RGB frame buffer and
  handed to the optional `VideoSink`.
*/

use crate::bus::InterruptController;
use crate::logging::SharedLogger;
use crate::mapper::Mapper;

pub(crate) mod memory;
pub(crate) mod phase;
pub(crate) mod registers;
pub(crate) mod renderer;
pub(crate) mod sprite;

pub use phase::Phase;
pub use sprite::Sprite;

/// Screen width in pixels.
pub const NES_WIDTH: usize = 256;
/// Screen height in pixels.
pub const NES_HEIGHT: usize = 240;
/// RGB bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 3;

pub const DOTS_PER_LINE: u32 = 341;
pub const LINES_PER_FRAME: u16 = 262;
pub const PRE_RENDER_LINE: u16 = 261;

// PPUCTRL
const CTRL_INCREMENT_32: u8 = 0x04;
const CTRL_SPRITE_TABLE: u8 = 0x08;
const CTRL_BG_TABLE: u8 = 0x10;
const CTRL_SPRITE_16: u8 = 0x20;
const CTRL_NMI: u8 = 0x80;

// PPUMASK
const MASK_GREYSCALE: u8 = 0x01;
const MASK_BG_LEFT: u8 = 0x02;
const MASK_SPRITE_LEFT: u8 = 0x04;
const MASK_BG: u8 = 0x08;
const MASK_SPRITES: u8 = 0x10;

// PPUSTATUS
const STATUS_OVERFLOW: u8 = 0x20;
const STATUS_SPRITE_ZERO: u8 = 0x40;
const STATUS_VBLANK: u8 = 0x80;

/// Canonical (approximate) NES master palette (RGB).
pub const NES_PALETTE: [[u8; 3]; 64] = [
    [0x75, 0x75, 0x75],
    [0x27, 0x1B, 0x8F],
    [0x00, 0x00, 0xAB],
    [0x47, 0x00, 0x9F],
    [0x8F, 0x00, 0x77],
    [0xAB, 0x00, 0x13],
    [0xA7, 0x00, 0x00],
    [0x7F, 0x0B, 0x00],
    [0x43, 0x2F, 0x00],
    [0x00, 0x47, 0x00],
    [0x00, 0x51, 0x00],
    [0x00, 0x3F, 0x17],
    [0x1B, 0x3F, 0x5F],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xBC, 0xBC, 0xBC],
    [0x00, 0x73, 0xEF],
    [0x23, 0x3B, 0xEF],
    [0x83, 0x00, 0xF3],
    [0xBF, 0x00, 0xBF],
    [0xE7, 0x00, 0x5B],
    [0xDB, 0x2B, 0x00],
    [0xCB, 0x4F, 0x0F],
    [0x8B, 0x73, 0x00],
    [0x00, 0x97, 0x00],
    [0x00, 0xAB, 0x00],
    [0x00, 0x93, 0x3B],
    [0x00, 0x83, 0x8B],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0x3F, 0xBF, 0xFF],
    [0x5F, 0x97, 0xFF],
    [0xA7, 0x8B, 0xFD],
    [0xF7, 0x7B, 0xFF],
    [0xFF, 0x77, 0xB7],
    [0xFF, 0x77, 0x63],
    [0xFF, 0x9B, 0x3B],
    [0xF3, 0xBF, 0x3F],
    [0x83, 0xD3, 0x13],
    [0x4F, 0xDF, 0x4B],
    [0x58, 0xF8, 0x98],
    [0x00, 0xEB, 0xDB],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0xAB, 0xE7, 0xFF],
    [0xC7, 0xD7, 0xFF],
    [0xD7, 0xCB, 0xFF],
    [0xFF, 0xC7, 0xFF],
    [0xFF, 0xC7, 0xDB],
    [0xFF, 0xBF, 0xB3],
    [0xFF, 0xDB, 0xAB],
    [0xFF, 0xE7, 0xA3],
    [0xE3, 0xFF, 0xA3],
    [0xAB, 0xF3, 0xBF],
    [0xB3, 0xFF, 0xCF],
    [0x9F, 0xFF, 0xF3],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
];

/// Receives each composed scanline: `NES_WIDTH` RGB triples.
pub trait VideoSink {
    fn scanline(&mut self, y: usize, rgb: &[u8]);
}

pub struct Ppu {
    // CPU-visible registers
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,
    read_buffer: u8,

    // Loopy scroll registers
    v: u16,
    t: u16,
    fine_x: u8,
    write_toggle: bool,

    // Memory
    palette: [u8; 32],
    oam: [u8; 256],
    sprites: [Sprite; 64],

    // Timing
    scanline: u16,
    dot: u16,
    odd_frame: bool,
    phase: Phase,
    /// Dots until `phase` runs.
    wait: u32,
    /// Dots received but not yet consumed by a phase.
    budget: u32,
    frame_complete: bool,
    frame_count: u64,

    // Output
    frame_buffer: Vec<u8>,
    sink: Option<Box<dyn VideoSink>>,

    logger: SharedLogger,
}

impl Ppu {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            read_buffer: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_toggle: false,
            palette: [0; 32],
            oam: [0; 256],
            sprites: [Sprite::default(); 64],
            scanline: 0,
            dot: 0,
            odd_frame: false,
            phase: Phase::LineStart,
            wait: 0,
            budget: 0,
            frame_complete: false,
            frame_count: 0,
            frame_buffer: vec![0; NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL],
            sink: None,
            logger,
        }
    }

    pub fn set_video_sink(&mut self, sink: Box<dyn VideoSink>) {
        self.logger.debug(format_args!("PPU video sink attached"));
        self.sink = Some(sink);
    }

    /// Advance by `cpu_cycles` CPU cycles (three dots each).
    pub fn tick(
        &mut self,
        cpu_cycles: u32,
        mapper: &mut dyn Mapper,
        interrupts: &mut InterruptController,
    ) {
        self.tick_dots(cpu_cycles * 3, mapper, interrupts);
    }

    /// Advance by raw dots, running every phase that comes due.
    pub fn tick_dots(
        &mut self,
        dots: u32,
        mapper: &mut dyn Mapper,
        interrupts: &mut InterruptController,
    ) {
        self.budget += dots;
        while self.budget >= self.wait {
            self.budget -= self.wait;
            self.dot += self.wait as u16;
            let (next, delay) = self.run_phase(self.phase, mapper, interrupts);
            self.phase = next;
            self.wait = delay;
        }
    }

    // ---------------------------------------------------------------------
    // Status and accessors
    // ---------------------------------------------------------------------

    #[inline]
    pub fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BG | MASK_SPRITES) != 0
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// Dot of the most recently executed phase within the current line.
    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn odd_frame(&self) -> bool {
        self.odd_frame
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn vblank(&self) -> bool {
        self.status & STATUS_VBLANK != 0
    }

    pub fn sprite_zero_hit(&self) -> bool {
        self.status & STATUS_SPRITE_ZERO != 0
    }

    pub fn sprite_overflow(&self) -> bool {
        self.status & STATUS_OVERFLOW != 0
    }

    pub fn ctrl(&self) -> u8 {
        self.ctrl
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn vram_addr(&self) -> u16 {
        self.v
    }

    pub fn temp_addr(&self) -> u16 {
        self.t
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    pub fn write_toggle(&self) -> bool {
        self.write_toggle
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    pub fn sprites(&self) -> &[Sprite; 64] {
        &self.sprites
    }

    /// 256 x 240 RGB frame buffer.
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    /// True once per frame, when vblank starts.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    fn set_status(&mut self, bit: u8, on: bool) {
        if on {
            self.status |= bit;
        } else {
            self.status &= !bit;
        }
    }
}
