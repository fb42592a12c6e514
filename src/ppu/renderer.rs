#![doc = r#"
PPU renderer module

Composes one visible scanline at a time, at dot 256 of that line.

Background
- A strip of 34 tiles is fetched starting from a copy of `v`; pixel `x` of
  the line is strip pixel `x + fine_x`. Each tile fetches its name-table byte,
  attribute byte, then the low and high pattern planes. Coarse X wraps into
  the horizontal neighbour name table.

Sprites
- `sprite_render_start` is signalled before sprite pattern fetches.
- Up to eight sprites are evaluated for the line; the lowest OAM index with
  an opaque pixel wins. Priority bit 5 puts a sprite behind opaque
  background.
- Sprite-0 hit sets when an opaque sprite-0 pixel overlaps an opaque
  background pixel, never at x = 255 and never inside a clipped left column.

Output
- Palette indices pass through greyscale (PPUMASK bit 0) and colour
  emphasis (bits 5-7) into RGB, land in the frame buffer and go to the
  optional `VideoSink`.
- With rendering disabled the line is the backdrop colour, or the palette
  entry `v` points at when `v` is inside $3F00..=$3FFF.
"#]

use super::sprite::{LineSprite, SPRITES_PER_LINE};
use super::*;

const STRIP_TILES: usize = 34;

impl Ppu {
    pub(in crate::ppu) fn render_line(&mut self, mapper: &mut dyn Mapper) {
        let mut line = [0u8; NES_WIDTH];
        if self.rendering_enabled() {
            self.compose_line(&mut line, mapper);
        } else {
            let backdrop = if self.v & 0x3F00 == 0x3F00 {
                (self.v & 0x1F) as u8
            } else {
                0
            };
            line.fill(backdrop);
        }
        self.emit_line(&line);
    }

    /// Palette addresses (0..32) for every pixel of the current line.
    fn compose_line(&mut self, line: &mut [u8; NES_WIDTH], mapper: &mut dyn Mapper) {
        let mut background = [0u8; NES_WIDTH];
        if self.mask & MASK_BG != 0 {
            self.fetch_background(&mut background, mapper);
        }

        mapper.sprite_render_start();
        let (found, count) = self.evaluate_sprites(self.scanline);
        let mut sprites = [LineSprite::default(); SPRITES_PER_LINE];
        if self.mask & MASK_SPRITES != 0 {
            for (slot, &index) in found[..count].iter().enumerate() {
                sprites[slot] = self.fetch_sprite(index, self.scanline, mapper);
            }
        }
        let sprites = if self.mask & MASK_SPRITES != 0 {
            &sprites[..count]
        } else {
            &sprites[..0]
        };

        let bg_left = self.mask & MASK_BG_LEFT != 0;
        let sprite_left = self.mask & MASK_SPRITE_LEFT != 0;
        for (x, out) in line.iter_mut().enumerate() {
            let bg = if x < 8 && !bg_left { 0 } else { background[x] };
            let bg_opaque = bg & 0x03 != 0;

            let sprite = if x < 8 && !sprite_left {
                None
            } else {
                sprites.iter().find_map(|s| {
                    let offset = x.checked_sub(s.x as usize).filter(|&o| o < 8)?;
                    let px = s.pixel(offset as u8);
                    (px != 0).then_some((s, px))
                })
            };

            *out = match sprite {
                Some((s, px)) => {
                    if s.is_sprite_zero && bg_opaque && x != 255 {
                        self.status |= STATUS_SPRITE_ZERO;
                    }
                    if s.behind_background && bg_opaque {
                        bg
                    } else {
                        0x10 | (s.palette << 2) | px
                    }
                }
                None if bg_opaque => bg,
                None => 0,
            };
        }
    }

    /// Background pixels as palette addresses, 0 where transparent.
    fn fetch_background(&mut self, out: &mut [u8; NES_WIDTH], mapper: &mut dyn Mapper) {
        let table: u16 = if self.ctrl & CTRL_BG_TABLE != 0 { 0x1000 } else { 0 };
        let mut strip = [0u8; STRIP_TILES * 8];
        let mut v = self.v;
        for tile in strip.chunks_exact_mut(8) {
            let index = self.read_vram(0x2000 | (v & 0x0FFF), mapper) as u16;
            let attr_addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
            let shift = ((v >> 4) & 0x04) | (v & 0x02);
            let palette = (self.read_vram(attr_addr, mapper) >> shift) & 0x03;

            let addr = table | (index << 4) | ((v >> 12) & 0x07);
            let low = self.read_vram(addr, mapper);
            let high = self.read_vram(addr + 8, mapper);
            for (bit, px) in tile.iter_mut().enumerate() {
                let shift = 7 - bit;
                let value = ((low >> shift) & 1) | (((high >> shift) & 1) << 1);
                *px = if value == 0 { 0 } else { (palette << 2) | value };
            }

            if v & 0x001F == 31 {
                v = (v & !0x001F) ^ 0x0400;
            } else {
                v += 1;
            }
        }
        let start = self.fine_x as usize;
        out.copy_from_slice(&strip[start..start + NES_WIDTH]);
    }

    fn emit_line(&mut self, line: &[u8; NES_WIDTH]) {
        let y = self.scanline as usize;
        let row_len = NES_WIDTH * BYTES_PER_PIXEL;
        let start = y * row_len;
        for (x, &entry) in line.iter().enumerate() {
            let rgb = self.color(entry);
            let at = start + x * BYTES_PER_PIXEL;
            self.frame_buffer[at..at + BYTES_PER_PIXEL].copy_from_slice(&rgb);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.scanline(y, &self.frame_buffer[start..start + row_len]);
        }
    }

    /// RGB for palette address `entry`, after greyscale and emphasis.
    fn color(&self, entry: u8) -> [u8; 3] {
        let mut index = self.palette_entry(entry as usize) & 0x3F;
        if self.mask & MASK_GREYSCALE != 0 {
            index &= 0x30;
        }
        let mut rgb = NES_PALETTE[index as usize];
        let emphasis = self.mask >> 5;
        if emphasis != 0 {
            for (channel, value) in rgb.iter_mut().enumerate() {
                // Emphasising one channel darkens the other two.
                if emphasis & !(1 << channel) & 0x07 != 0 {
                    *value = (*value as u16 * 3 / 4) as u8;
                }
            }
        }
        rgb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::test_support::ppu_rig;
    use std::cell::RefCell;
    use std::rc::Rc;

    const ALL_ON: u8 = MASK_BG | MASK_SPRITES | MASK_BG_LEFT | MASK_SPRITE_LEFT;

    /// Tile 1 is solid colour 1; name-table row 0 is all tile 1.
    fn solid_rig() -> (Ppu, Box<dyn Mapper>) {
        let (mut p, mut mapper, _) = ppu_rig();
        for row in 0..8 {
            mapper.write_chr(0x0010 + row, 0xFF);
        }
        for col in 0..32 {
            mapper.write_nametable(0x2000 + col, 1);
        }
        p.palette[0x01] = 0x16;
        p.palette[0x11] = 0x2A;
        p.mask = ALL_ON;
        p.scanline = 10;
        p.sprites = [Sprite { y: 0xFF, ..Sprite::default() }; 64];
        (p, mapper)
    }

    fn set_sprite(p: &mut Ppu, slot: usize, attr: u8, x: u8) {
        p.sprites[slot] = Sprite::from_oam(&[9, 1, attr, x]);
    }

    fn pixel(p: &Ppu, x: usize, y: usize) -> [u8; 3] {
        let at = (y * NES_WIDTH + x) * BYTES_PER_PIXEL;
        let fb = p.frame_buffer();
        [fb[at], fb[at + 1], fb[at + 2]]
    }

    #[test]
    fn sprite_zero_hit_over_opaque_background() {
        let (mut p, mut mapper) = solid_rig();
        set_sprite(&mut p, 0, 0x00, 100);
        p.render_line(mapper.as_mut());
        assert!(p.sprite_zero_hit());
        assert_eq!(pixel(&p, 100, 10), NES_PALETTE[0x2A]);
        assert_eq!(pixel(&p, 99, 10), NES_PALETTE[0x16]);
    }

    #[test]
    fn no_hit_at_last_column() {
        let (mut p, mut mapper) = solid_rig();
        set_sprite(&mut p, 0, 0x00, 255);
        p.render_line(mapper.as_mut());
        assert!(!p.sprite_zero_hit());
        assert_eq!(pixel(&p, 255, 10), NES_PALETTE[0x2A]);
    }

    #[test]
    fn no_hit_inside_clipped_left_column() {
        let (mut p, mut mapper) = solid_rig();
        p.mask &= !MASK_BG_LEFT;
        set_sprite(&mut p, 0, 0x00, 0);
        p.render_line(mapper.as_mut());
        assert!(!p.sprite_zero_hit());

        p.mask = ALL_ON & !MASK_SPRITE_LEFT;
        p.render_line(mapper.as_mut());
        assert!(!p.sprite_zero_hit());
        assert_eq!(pixel(&p, 3, 10), NES_PALETTE[0x16], "sprite clipped");
    }

    #[test]
    fn behind_background_priority_still_hits() {
        let (mut p, mut mapper) = solid_rig();
        set_sprite(&mut p, 0, 0x20, 50);
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 50, 10), NES_PALETTE[0x16]);
        assert!(p.sprite_zero_hit());
    }

    #[test]
    fn lower_oam_index_wins() {
        let (mut p, mut mapper) = solid_rig();
        p.palette[0x15] = 0x30;
        set_sprite(&mut p, 4, 0x01, 60);
        set_sprite(&mut p, 7, 0x00, 60);
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 60, 10), NES_PALETTE[0x30]);
        assert!(!p.sprite_zero_hit());
    }

    #[test]
    fn fine_x_shifts_the_background() {
        let (mut p, mut mapper, _) = ppu_rig();
        for row in 0..8 {
            mapper.write_chr(0x0010 + row, 0xFF);
        }
        mapper.write_nametable(0x2001, 1);
        p.palette[0x01] = 0x16;
        p.palette[0x00] = 0x0F;
        p.mask = MASK_BG | MASK_BG_LEFT;
        p.fine_x = 3;
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 4, 0), NES_PALETTE[0x0F]);
        assert_eq!(pixel(&p, 5, 0), NES_PALETTE[0x16]);
        assert_eq!(pixel(&p, 12, 0), NES_PALETTE[0x16]);
        assert_eq!(pixel(&p, 13, 0), NES_PALETTE[0x0F]);
    }

    #[test]
    fn attribute_quadrants_select_palettes() {
        let (mut p, mut mapper) = solid_rig();
        mapper.write_nametable(0x23C0, 0b11_10_01_00);
        p.palette[0x05] = 0x21;
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 0, 10), NES_PALETTE[0x16]);
        assert_eq!(pixel(&p, 16, 10), NES_PALETTE[0x21]);
    }

    #[test]
    fn disabled_rendering_shows_backdrop_or_palette_at_v() {
        let (mut p, mut mapper, _) = ppu_rig();
        p.palette[0x00] = 0x21;
        p.palette[0x07] = 0x05;
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 128, 0), NES_PALETTE[0x21]);

        p.v = 0x3F07;
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 128, 0), NES_PALETTE[0x05]);
    }

    #[test]
    fn greyscale_and_emphasis() {
        let (mut p, mut mapper, _) = ppu_rig();
        p.palette[0x00] = 0x16;
        p.mask = MASK_GREYSCALE;
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 0, 0), NES_PALETTE[0x10]);

        p.palette[0x00] = 0x30;
        p.mask = 0x20;
        p.render_line(mapper.as_mut());
        assert_eq!(pixel(&p, 0, 0), [0xFF, 0xBF, 0xBF]);
    }

    struct RecordingSink(Rc<RefCell<Vec<usize>>>);

    impl VideoSink for RecordingSink {
        fn scanline(&mut self, y: usize, rgb: &[u8]) {
            assert_eq!(rgb.len(), NES_WIDTH * BYTES_PER_PIXEL);
            self.0.borrow_mut().push(y);
        }
    }

    #[test]
    fn sink_receives_every_visible_line_once_per_frame() {
        let (mut p, mut mapper, mut ic) = ppu_rig();
        let lines = Rc::new(RefCell::new(Vec::new()));
        p.set_video_sink(Box::new(RecordingSink(lines.clone())));
        p.tick_dots(DOTS_PER_LINE * LINES_PER_FRAME as u32, mapper.as_mut(), &mut ic);
        assert_eq!(*lines.borrow(), (0..NES_HEIGHT).collect::<Vec<_>>());
    }
}
