//! iNES image builders and machine rigs shared by unit tests.
//!
//! Header layout written here (iNES v1):
//! - `NES<1A>`, PRG size (16 KiB units), CHR size (8 KiB units, 0 = CHR RAM)
//! - flags 6 (mirroring, battery, trainer, mapper low nibble)
//! - flags 7 (mapper high nibble; bits 2-3 mark NES 2.0)
//! - PRG RAM size (8 KiB units, 0 = 8 KiB), then seven zero bytes
//!
//! PRG is filled with `$AA` and CHR with `$CC` so tests can tell them apart
//! from zeroed RAM.

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::config::Config;
use crate::cpu::Cpu;
use crate::logging::null_logger;

const PRG_UNIT: usize = 16 * 1024;
const CHR_UNIT: usize = 8 * 1024;

pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut rom = b"NES\x1A".to_vec();
    rom.extend_from_slice(&[prg_16k as u8, chr_8k as u8, flags6, flags7, prg_ram_8k]);
    rom.resize(16, 0);
    if let Some(t) = trainer {
        rom.extend_from_slice(t);
    }
    rom.resize(rom.len() + prg_16k * PRG_UNIT, 0xAA);
    rom.resize(rom.len() + chr_8k * CHR_UNIT, 0xCC);
    rom
}

/// One-bank NROM image running `prg` from $8000. `vectors` is
/// `(reset, nmi, irq)` and defaults to $8000 for all three.
pub fn build_nrom_with_prg(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    vectors: Option<(u16, u16, u16)>,
) -> Vec<u8> {
    assert!(prg.len() <= PRG_UNIT, "program larger than one PRG bank");
    let mut rom = build_ines(1, chr_8k, 0, 0, prg_ram_8k, None);
    let bank = &mut rom[16..16 + PRG_UNIT];
    bank[..prg.len()].copy_from_slice(prg);
    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    set_vectors_in_prg(bank, reset, nmi, irq);
    rom
}

/// Store NMI, RESET and IRQ in the last six bytes of a 16 or 32 KiB PRG image.
pub fn set_vectors_in_prg(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    assert!(
        prg.len() == PRG_UNIT || prg.len() == 2 * PRG_UNIT,
        "vectors need a 16 or 32 KiB PRG image, got {} bytes",
        prg.len()
    );
    let top = prg.len() - 6;
    for (slot, vector) in [nmi, reset, irq].into_iter().enumerate() {
        prg[top + slot * 2..top + slot * 2 + 2].copy_from_slice(&vector.to_le_bytes());
    }
}

/// Silent configuration for tests.
pub fn test_config() -> Config {
    Config::default().with_logger(null_logger())
}

/// Bus over an NROM cartridge holding `prg` at $8000, all vectors at $8000.
pub fn bus_with_prg(prg: &[u8]) -> Bus {
    bus_with_prg_and_vectors(prg, None)
}

pub fn bus_with_prg_and_vectors(prg: &[u8], vectors: Option<(u16, u16, u16)>) -> Bus {
    let rom = build_nrom_with_prg(prg, 1, 1, vectors);
    let cart = Cartridge::from_ines_bytes(&rom, null_logger()).expect("parse test image");
    Bus::new(cart.into_mapper(), &test_config())
}

/// CPU reset onto `prg`, with the bus clock at 7 after reset.
pub fn cpu_with_prg(prg: &[u8]) -> (Cpu, Bus) {
    let mut bus = bus_with_prg(prg);
    let mut cpu = Cpu::new(null_logger());
    cpu.reset(&mut bus);
    (cpu, bus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_payload_sizes() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(&rom[4..9], &[2, 1, 0x01, 0x00, 1]);
        assert_eq!(rom.len(), 16 + 2 * PRG_UNIT + CHR_UNIT);
        assert_eq!(rom[16], 0xAA);
        assert_eq!(rom[rom.len() - 1], 0xCC);
    }

    #[test]
    fn vectors_land_at_top_of_either_size() {
        for len in [PRG_UNIT, 2 * PRG_UNIT] {
            let mut prg = vec![0u8; len];
            set_vectors_in_prg(&mut prg, 0x8123, 0x8456, 0x8ABC);
            assert_eq!(&prg[len - 6..], &[0x56, 0x84, 0x23, 0x81, 0xBC, 0x8A]);
        }
    }

    #[test]
    fn nrom_image_carries_program_and_reset_vector() {
        let rom = build_nrom_with_prg(&[0xA9, 0x01], 1, 1, Some((0x8010, 0x8000, 0x8000)));
        assert_eq!(&rom[16..18], &[0xA9, 0x01]);
        assert_eq!(&rom[16 + 0x3FFC..16 + 0x3FFE], &[0x10, 0x80]);
    }
}
