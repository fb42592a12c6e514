#![doc = r#"
PPU sprite module

- `Sprite` is the decoded form of one 4-byte OAM entry. The PPU keeps all 64
  decoded and refreshes a slot on every OAM write.
- `evaluate_sprites(line)` scans OAM in order and keeps the first eight
  sprites covering `line`; a ninth sets the overflow flag.
- Pattern rows are fetched through the mapper so CHR latches observe sprite
  fetches, for 8x8 and 8x16 sprites with both flips applied.
"#]

use super::*;

/// Sprites drawn per scanline.
pub const SPRITES_PER_LINE: usize = 8;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    /// OAM Y: the sprite's top row is `y + 1`.
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    /// Sprite palette 0..=3 (palette RAM $10 + 4 * palette).
    pub palette: u8,
    pub behind_background: bool,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Sprite {
    pub fn from_oam(entry: &[u8]) -> Self {
        let attr = entry[2];
        Self {
            y: entry[0],
            tile: entry[1],
            palette: attr & 0x03,
            behind_background: attr & 0x20 != 0,
            flip_h: attr & 0x40 != 0,
            flip_v: attr & 0x80 != 0,
            x: entry[3],
        }
    }
}

/// A sprite selected for the current line with its pattern row fetched.
#[derive(Debug, Default, Clone, Copy)]
pub(in crate::ppu) struct LineSprite {
    pub x: u8,
    pub palette: u8,
    pub behind_background: bool,
    pub is_sprite_zero: bool,
    /// Pattern row, already mirrored for horizontal flip; bit 7 is the
    /// leftmost pixel.
    pub low: u8,
    pub high: u8,
}

impl LineSprite {
    /// 2-bit pixel at `offset` (0..8) from the sprite's left edge.
    #[inline]
    pub fn pixel(&self, offset: u8) -> u8 {
        let shift = 7 - offset;
        ((self.low >> shift) & 1) | (((self.high >> shift) & 1) << 1)
    }
}

impl Ppu {
    pub(in crate::ppu) fn sprite_height(&self) -> u16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 { 16 } else { 8 }
    }

    /// Indices of up to eight sprites on `line`, in OAM order. Sets the
    /// overflow flag when more sprites cover the line.
    pub(in crate::ppu) fn evaluate_sprites(&mut self, line: u16) -> ([usize; SPRITES_PER_LINE], usize) {
        let height = self.sprite_height();
        let mut found = [0usize; SPRITES_PER_LINE];
        let mut count = 0;
        for (index, sprite) in self.sprites.iter().enumerate() {
            let top = sprite.y as u16 + 1;
            if line < top || line >= top + height {
                continue;
            }
            if count == SPRITES_PER_LINE {
                self.status |= STATUS_OVERFLOW;
                break;
            }
            found[count] = index;
            count += 1;
        }
        (found, count)
    }

    /// Fetch the pattern row of sprite `index` for `line`.
    pub(in crate::ppu) fn fetch_sprite(
        &mut self,
        index: usize,
        line: u16,
        mapper: &mut dyn Mapper,
    ) -> LineSprite {
        let sprite = self.sprites[index];
        let height = self.sprite_height();
        let mut row = line - (sprite.y as u16 + 1);
        if sprite.flip_v {
            row = height - 1 - row;
        }
        let (table, tile) = if height == 16 {
            let tile = (sprite.tile & 0xFE) as u16 + (row >> 3);
            (((sprite.tile & 1) as u16) << 12, tile)
        } else {
            let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 { 0x1000 } else { 0 };
            (table, sprite.tile as u16)
        };
        let addr = table | (tile << 4) | (row & 7);
        let mut low = self.read_vram(addr, mapper);
        let mut high = self.read_vram(addr + 8, mapper);
        if sprite.flip_h {
            low = low.reverse_bits();
            high = high.reverse_bits();
        }
        LineSprite {
            x: sprite.x,
            palette: sprite.palette,
            behind_background: sprite.behind_background,
            is_sprite_zero: index == 0,
            low,
            high,
        }
    }
}
