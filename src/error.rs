/*!
Error types for the emulator core.

Only structural load-time problems (bad image, unknown mapper) and gaps in the
CPU dispatch table are surfaced as errors. Everything the hardware itself
tolerates (stray register offsets, writes to ROM, unimplemented mapper
registers) is logged and answered with open bus instead.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmuError {
    /// The first four bytes of the image are not `NES<1A>`.
    #[error("invalid iNES header magic (expected NES<1A>)")]
    InvalidMagic,

    /// The image ends before a region the header promises.
    #[error("image too small for {what}: need {needed} bytes, have {actual}")]
    Truncated {
        what: &'static str,
        needed: usize,
        actual: usize,
    },

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(&'static str),

    #[error("unsupported mapper id: {0}")]
    UnsupportedMapper(u16),

    /// Opcode with no entry in the dispatch table.
    #[error("unknown opcode ${opcode:02X} at ${pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "screenshot")]
    #[error("failed to write screenshot: {0}")]
    Screenshot(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, EmuError>;
