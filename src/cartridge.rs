/*!
Cartridge with iNES (v1) loader and mapper construction.

Features:
- Parse the iNES (v1) header from bytes or a file path
- Extract PRG ROM, CHR (ROM, or CHR RAM when the CHR size is 0) and the PRG RAM size
- Determine mirroring, battery-backed RAM and the mapper number
- Hand the storage to `mapper::create`, which picks the concrete board

Notes:
- iNES 2.0 is detected and rejected.
- PRG RAM allocation policy:
  - If header byte 8 (PRG-RAM size in 8 KiB units) is 0, allocate 8 KiB by convention.
  - Otherwise allocate size_in_units * 8 KiB.
- A 512-byte trainer is skipped, not loaded.
*/

use std::fs;
use std::path::Path;

use crate::config::fill_power_on;
use crate::error::{EmuError, Result};
use crate::logging::SharedLogger;
use crate::mapper::{self, Board, Mapper, Mirroring};

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_UNIT: usize = 16 * 1024;
const CHR_UNIT: usize = 8 * 1024;
const PRG_RAM_UNIT: usize = 8 * 1024;

/// Parsed iNES header fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub mapper_id: u16,
    pub prg_rom_len: usize,
    pub chr_len: usize,
    pub chr_is_ram: bool,
    pub prg_ram_len: usize,
    pub mirroring: Mirroring,
    pub battery: bool,
    pub has_trainer: bool,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 || &data[0..4] != b"NES\x1A" {
            return Err(EmuError::InvalidMagic);
        }
        if data.len() < HEADER_LEN {
            return Err(EmuError::Truncated {
                what: "header",
                needed: HEADER_LEN,
                actual: data.len(),
            });
        }

        let flags6 = data[6];
        let flags7 = data[7];

        // NES 2.0 if (flags7 & 0x0C) == 0x08.
        if flags7 & 0x0C == 0x08 {
            return Err(EmuError::UnsupportedFormat("NES 2.0"));
        }

        // Mapper ID: high nibble from flags7 and low nibble from flags6
        let mapper_id = ((flags7 & 0xF0) | (flags6 >> 4)) as u16;

        let mirroring = if flags6 & 0b0000_1000 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0b0000_0001 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        if data[4] == 0 {
            return Err(EmuError::UnsupportedFormat("image has no PRG ROM"));
        }
        let prg_rom_len = data[4] as usize * PRG_UNIT;
        let (chr_len, chr_is_ram) = match data[5] {
            0 => (CHR_UNIT, true),
            units => (units as usize * CHR_UNIT, false),
        };
        let prg_ram_len = match data[8] {
            0 => PRG_RAM_UNIT,
            units => units as usize * PRG_RAM_UNIT,
        };

        Ok(Self {
            mapper_id,
            prg_rom_len,
            chr_len,
            chr_is_ram,
            prg_ram_len,
            mirroring,
            battery: flags6 & 0b0000_0010 != 0,
            has_trainer: flags6 & 0b0000_0100 != 0,
        })
    }
}

pub struct Cartridge {
    pub header: Header,
    pub mapper: Box<dyn Mapper>,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl Cartridge {
    /// Load a cartridge from raw iNES bytes and construct its mapper.
    pub fn from_ines_bytes(data: &[u8], logger: SharedLogger) -> Result<Self> {
        Self::from_ines_bytes_seeded(data, logger, None)
    }

    /// As `from_ines_bytes`, filling CIRAM from `ram_seed` when given.
    pub fn from_ines_bytes_seeded(
        data: &[u8],
        logger: SharedLogger,
        ram_seed: Option<u64>,
    ) -> Result<Self> {
        let header = Header::parse(data)?;

        let mut offset = HEADER_LEN;
        if header.has_trainer {
            offset += TRAINER_LEN;
        }

        let prg_end = offset + header.prg_rom_len;
        let prg_rom = data
            .get(offset..prg_end)
            .ok_or(EmuError::Truncated {
                what: "PRG ROM",
                needed: prg_end,
                actual: data.len(),
            })?
            .to_vec();

        let chr = if header.chr_is_ram {
            vec![0; header.chr_len]
        } else {
            let chr_end = prg_end + header.chr_len;
            data.get(prg_end..chr_end)
                .ok_or(EmuError::Truncated {
                    what: "CHR ROM",
                    needed: chr_end,
                    actual: data.len(),
                })?
                .to_vec()
        };

        logger.debug(format_args!(
            "iNES: mapper {} PRG {}K CHR {}K{} PRG-RAM {}K {:?}",
            header.mapper_id,
            header.prg_rom_len / 1024,
            header.chr_len / 1024,
            if header.chr_is_ram { " (RAM)" } else { "" },
            header.prg_ram_len / 1024,
            header.mirroring,
        ));

        let mut board = Board::new(
            prg_rom,
            header.prg_ram_len,
            chr,
            header.chr_is_ram,
            header.mirroring,
            logger,
        );
        board.battery = header.battery;
        for (i, page) in board.ciram.iter_mut().enumerate() {
            fill_power_on(page, ram_seed.map(|s| s.wrapping_add(i as u64 + 1)));
        }

        let mapper = mapper::create(header.mapper_id, board)?;
        Ok(Self { header, mapper })
    }

    /// Load a cartridge from an iNES file (.nes).
    pub fn from_path<P: AsRef<Path>>(path: P, logger: SharedLogger) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_ines_bytes(&bytes, logger)
    }

    pub fn mapper_id(&self) -> u16 {
        self.header.mapper_id
    }

    pub fn has_battery(&self) -> bool {
        self.header.battery
    }

    pub fn into_mapper(self) -> Box<dyn Mapper> {
        self.mapper
    }
}
