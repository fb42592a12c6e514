//! PNG export of the PPU frame buffer (feature `screenshot`).

use std::path::Path;

use image::RgbImage;

use crate::error::{EmuError, Result};
use crate::ppu::{BYTES_PER_PIXEL, NES_HEIGHT, NES_WIDTH};

/// Write a 256 x 240 RGB frame to `path`. The format follows the extension.
pub fn save_png<P: AsRef<Path>>(frame: &[u8], path: P) -> Result<()> {
    let image = RgbImage::from_raw(NES_WIDTH as u32, NES_HEIGHT as u32, frame.to_vec()).ok_or(
        EmuError::Truncated {
            what: "frame buffer",
            needed: NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL,
            actual: frame.len(),
        },
    )?;
    image.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_frame_is_rejected() {
        let err = save_png(&[0u8; 16], std::env::temp_dir().join("lockstep-short.png"));
        assert!(matches!(err, Err(EmuError::Truncated { actual: 16, .. })));
    }

    #[test]
    fn writes_png() {
        let frame = vec![0x40u8; NES_WIDTH * NES_HEIGHT * BYTES_PER_PIXEL];
        let path = std::env::temp_dir().join("lockstep-frame.png");
        save_png(&frame, &path).expect("save");
        let loaded = image::open(&path).expect("reload").to_rgb8();
        assert_eq!(loaded.dimensions(), (256, 240));
        assert_eq!(loaded.get_pixel(10, 10).0, [0x40, 0x40, 0x40]);
        let _ = std::fs::remove_file(path);
    }
}
