#![doc = r#"
PPU memory module

PPU address space ($0000..=$3FFF) and OAM.

- $0000..=$1FFF: pattern tables, through `Mapper::read_chr`/`write_chr`.
- $2000..=$3EFF: name tables, through `Mapper::read_nametable`/`write_nametable`
  ($3000..=$3EFF mirrors $2000..=$2EFF).
- $3F00..=$3FFF: 32 bytes of palette RAM mirrored every 32 bytes; entries
  $10/$14/$18/$1C alias $00/$04/$08/$0C.
- OAM writes through OAMDATA store the byte, increment OAMADDR and refresh the
  decoded sprite cache entry for that slot.
"#]

use super::*;

#[inline]
fn palette_index(addr: u16) -> usize {
    let i = (addr & 0x1F) as usize;
    if i & 0x13 == 0x10 { i & !0x10 } else { i }
}

impl Ppu {
    pub(in crate::ppu) fn read_vram(&mut self, addr: u16, mapper: &mut dyn Mapper) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => mapper.read_chr(addr),
            0x2000..=0x3EFF => mapper.read_nametable(0x2000 | (addr & 0x0FFF)),
            _ => self.palette[palette_index(addr)] & 0x3F,
        }
    }

    pub(in crate::ppu) fn write_vram(&mut self, addr: u16, value: u8, mapper: &mut dyn Mapper) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => mapper.write_chr(addr, value),
            0x2000..=0x3EFF => mapper.write_nametable(0x2000 | (addr & 0x0FFF), value),
            _ => self.palette[palette_index(addr)] = value & 0x3F,
        }
    }

    /// OAMDATA write; also the target of OAM DMA.
    pub fn write_oam_data(&mut self, value: u8) {
        let addr = self.oam_addr as usize;
        self.oam[addr] = value;
        let slot = addr / 4;
        self.sprites[slot] = Sprite::from_oam(&self.oam[slot * 4..slot * 4 + 4]);
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    /// Palette RAM entry `index` (0..32) as a master-palette index.
    pub(in crate::ppu) fn palette_entry(&self, index: usize) -> u8 {
        self.palette[palette_index(index as u16)]
    }

    /// Background palette `n` (0..4), backdrop first.
    pub fn background_palette(&self, n: usize) -> [u8; 4] {
        let base = (n & 3) * 4;
        std::array::from_fn(|i| self.palette_entry(base + i))
    }

    /// Sprite palette `n` (0..4). Entry 0 aliases the background entry.
    pub fn sprite_palette(&self, n: usize) -> [u8; 4] {
        let base = 0x10 + (n & 3) * 4;
        std::array::from_fn(|i| self.palette_entry(base + i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::test_support::ppu_rig;

    #[test]
    fn palette_backdrop_mirrors_alias() {
        let (mut p, mut mapper, _) = ppu_rig();
        for (alias, base) in [(0x3F10, 0x3F00), (0x3F14, 0x3F04), (0x3F18, 0x3F08), (0x3F1C, 0x3F0C)] {
            p.write_vram(alias, 0x21, mapper.as_mut());
            assert_eq!(p.read_vram(base, mapper.as_mut()), 0x21, "{alias:04X}");
        }
        // Non-backdrop sprite entries are distinct.
        p.write_vram(0x3F11, 0x05, mapper.as_mut());
        assert_ne!(p.read_vram(0x3F01, mapper.as_mut()), 0x05);
    }

    #[test]
    fn palette_repeats_every_32_bytes() {
        let (mut p, mut mapper, _) = ppu_rig();
        p.write_vram(0x3F03, 0x2A, mapper.as_mut());
        assert_eq!(p.read_vram(0x3FE3, mapper.as_mut()), 0x2A);
    }

    #[test]
    fn name_table_mirror_at_3000() {
        let (mut p, mut mapper, _) = ppu_rig();
        p.write_vram(0x3123, 0x77, mapper.as_mut());
        assert_eq!(p.read_vram(0x2123, mapper.as_mut()), 0x77);
        // Vertical mirroring: $2800 aliases $2000.
        assert_eq!(p.read_vram(0x2923, mapper.as_mut()), 0x77);
    }

    #[test]
    fn oam_data_write_refreshes_sprite_cache_and_wraps() {
        let (mut p, _, _) = ppu_rig();
        p.oam_addr = 0xFC;
        for b in [0x10, 0x22, 0xE3, 0x40] {
            p.write_oam_data(b);
        }
        assert_eq!(p.oam_addr, 0x00);
        let s = p.sprites()[63];
        assert_eq!((s.y, s.tile, s.x), (0x10, 0x22, 0x40));
        assert_eq!(s.palette, 3);
        assert!(s.behind_background && s.flip_h && s.flip_v);
    }

    #[test]
    fn palette_groups_share_the_backdrop() {
        let (mut p, mut mapper, _) = ppu_rig();
        for (i, addr) in (0x3F00..0x3F20).enumerate() {
            p.write_vram(addr, i as u8, mapper.as_mut());
        }
        assert_eq!(p.background_palette(1), [0x14, 0x05, 0x06, 0x07]);
        assert_eq!(p.sprite_palette(2), [0x18, 0x19, 0x1A, 0x1B]);
        // $3F10 and $3F14 were written after their aliases.
        assert_eq!(p.background_palette(0)[0], 0x10);
    }
}
