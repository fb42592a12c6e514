#![doc = r#"
Lockstep: a cycle-counted NES emulator core.

The CPU executes one instruction (or interrupt entry, or DMA byte) at a time
and reports how many cycles it took; the console then advances the PPU, the
APU and the cartridge mapper by exactly that many cycles. Nothing runs on
its own thread.

Modules:
- apu: pulse, triangle, noise and DMC channels, frame sequencer, mixer
- bus: CPU address space, open bus, interrupt lines, OAM DMA, clock
- cartridge: iNES loader; builds a `Mapper`
- config: sample rate, power-on RAM seed, logger
- console: the driving loop and host-facing API
- controller: standard joypad shift register and input source trait
- cpu: 6502 core (state, addressing, table, execute)
- mapper / mappers: `Mapper` trait, shared board storage, supported boards
- ppu: registers, phase-driven timing, scanline renderer

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod mappers;
pub mod ppu;
#[cfg(feature = "screenshot")]
pub mod screenshot;

// Re-export commonly used types at the crate root for convenience.
pub use apu::AudioSink;
pub use bus::Bus;
pub use cartridge::Cartridge;
pub use config::Config;
pub use console::Console;
pub use controller::{Button, InputSource};
pub use cpu::Cpu;
pub use error::{EmuError, Result};
pub use ppu::VideoSink;

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub(crate) mod test_utils;
