/*!
Bus module: the CPU-visible address decoder and owner of every device.

Overview
- `Bus` owns RAM, PPU, APU, controllers, the OAM DMA controller, the
  interrupt controller, the master clock and the cartridge mapper. Cross
  device calls borrow disjoint fields, so no device holds a reference to
  another.
- `advance(cycles)` is the only place time moves: clock first, then PPU,
  APU and mapper, in that order, by the cycle count of the CPU action that
  just completed.

Address decode
- $0000-$1FFF: 2 KiB RAM, mirrored every $0800
- $2000-$3FFF: PPU registers, mirrored every 8 bytes
- $4000-$4013, $4015, $4017 (write): APU
- $4014: OAM DMA trigger (write-only)
- $4016, $4017 (read): controller ports
- $4018-$FFFF: mapper

Open bus
- Devices answer reads with an encoded `u16` (see `open_bus`); the Bus
  resolves undriven bits from the last value driven in either direction.

Modules
- clock: monotonic CPU-cycle counter.
- interrupts: NMI latch and DMA-in-progress level.
- dma: OAM DMA controller plus the `CpuMemory`/`OamWriter` traits.
- ram: 2 KiB internal RAM.
- open_bus: encoded read helpers and the retained bus value.
*/

pub mod clock;
pub mod dma;
pub mod interrupts;
pub mod open_bus;
pub mod ram;


pub use clock::Clock;
pub use dma::{CpuMemory, DmaController, OamWriter};
pub use interrupts::InterruptController;
pub use open_bus::OpenBus;
pub use ram::Ram;

use crate::apu::{Apu, SampleMemory};
use crate::config::Config;
use crate::controller::{Controller, InputSource};
use crate::logging::SharedLogger;
use crate::mapper::Mapper;
use crate::ppu::Ppu;
use open_bus::{UNDRIVEN, driven, partial};

/// Controller ports only drive bits 0-4.
const CONTROLLER_UNDRIVEN: u8 = 0xE0;

pub struct Bus {
    ram: Ram,
    open_bus: OpenBus,
    pub ppu: Ppu,
    pub apu: Apu,
    pub controllers: [Controller; 2],
    input: Option<Box<dyn InputSource>>,
    dma: DmaController,
    pub interrupts: InterruptController,
    pub clock: Clock,
    mapper: Box<dyn Mapper>,
    logger: SharedLogger,
}

/// DMC sample fetches and expansion audio, served by the cartridge.
struct CartridgeSamples<'a>(&'a mut dyn Mapper);

impl SampleMemory for CartridgeSamples<'_> {
    fn read_sample(&mut self, addr: u16) -> u8 {
        self.0.read_prg(addr).unwrap_or(0)
    }

    fn expansion_audio(&self) -> f32 {
        self.0.expansion_audio()
    }
}

impl Bus {
    pub fn new(mapper: Box<dyn Mapper>, config: &Config) -> Self {
        Self {
            ram: Ram::new(config.ram_seed),
            open_bus: OpenBus::default(),
            ppu: Ppu::new(config.logger.clone()),
            apu: Apu::new(config.sample_rate, config.logger.clone()),
            controllers: [Controller::new(), Controller::new()],
            input: None,
            dma: DmaController::new(),
            interrupts: InterruptController::new(),
            clock: Clock::new(),
            mapper,
            logger: config.logger.clone(),
        }
    }

    pub fn set_input(&mut self, input: Box<dyn InputSource>) {
        self.input = Some(input);
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    pub fn mapper_mut(&mut self) -> &mut dyn Mapper {
        self.mapper.as_mut()
    }

    /// Last value driven onto the data bus.
    pub fn open_bus(&self) -> u8 {
        self.open_bus.last()
    }

    // ---------------------------------------------------------------------
    // CPU-visible access
    // ---------------------------------------------------------------------

    /// CPU read with all device side effects.
    pub fn read(&mut self, addr: u16) -> u8 {
        let encoded = self.read_device(addr);
        self.open_bus.resolve(encoded)
    }

    fn read_device(&mut self, addr: u16) -> u16 {
        match addr {
            0x0000..=0x1FFF => driven(self.ram.read(addr)),
            0x2000..=0x3FFF => self.ppu.read_register(addr, self.mapper.as_mut()),
            0x4015 => self.apu.read_status(),
            0x4016 => partial(self.controllers[0].read(), CONTROLLER_UNDRIVEN),
            0x4017 => partial(self.controllers[1].read(), CONTROLLER_UNDRIVEN),
            0x4000..=0x4014 => UNDRIVEN,
            0x4018..=0xFFFF => match self.mapper.read_prg(addr) {
                Some(value) => driven(value),
                None => UNDRIVEN,
            },
        }
    }

    /// CPU write. Every write also sets the retained open-bus value.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.open_bus.drive(value);
        match addr {
            0x0000..=0x1FFF => self.ram.write(addr, value),
            0x2000..=0x3FFF => {
                self.mapper.ppu_register_write(0x2000 | (addr & 0x0007), value);
                self.ppu.write_register(
                    addr,
                    value,
                    self.mapper.as_mut(),
                    &mut self.interrupts,
                );
            }
            0x4014 => self.begin_dma(value),
            0x4016 => self.write_strobe(value),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, value),
            0x4018..=0xFFFF => self.mapper.write_prg(addr, value),
        }
    }

    /// Little-endian word read that carries into the next page.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian word read whose high byte stays in the same page
    /// (`$xxFF` wraps to `$xx00`).
    pub fn read_word_page_wrapped(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read(hi_addr) as u16;
        (hi << 8) | lo
    }

    /// Read without device side effects, for tracing and tests. Only RAM
    /// and cartridge space at $6000 and above are visible.
    pub fn peek(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram.read(addr),
            0x6000..=0xFFFF => self
                .mapper
                .read_prg(addr)
                .unwrap_or(self.open_bus.last()),
            _ => self.open_bus.last(),
        }
    }

    fn write_strobe(&mut self, value: u8) {
        if value & 1 != 0
            && let Some(input) = self.input.as_mut()
        {
            for (port, pad) in self.controllers.iter_mut().enumerate() {
                pad.set_state_mask(input.poll(port));
            }
        }
        for pad in &mut self.controllers {
            pad.write_strobe(value);
        }
    }

    // ---------------------------------------------------------------------
    // DMA
    // ---------------------------------------------------------------------

    fn begin_dma(&mut self, page: u8) {
        self.logger
            .debug(format_args!("OAM DMA from ${:04X}", (page as u16) << 8));
        self.dma.begin(page);
        self.interrupts.set_dma_in_progress(true);
    }

    /// Run one DMA step (one byte). Returns the CPU cycles consumed.
    pub fn dma_step(&mut self) -> u32 {
        let mut dma = std::mem::take(&mut self.dma);
        let clock = self.clock.ticks();
        let cycles = dma.tick(self, clock);
        self.dma = dma;
        if !self.dma.is_active() {
            self.interrupts.set_dma_in_progress(false);
        }
        cycles
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    /// Advance every device by `cycles` CPU cycles: clock, PPU, APU, mapper.
    pub fn advance(&mut self, cycles: u32) {
        self.clock.advance(cycles as u64);
        self.ppu
            .tick(cycles, self.mapper.as_mut(), &mut self.interrupts);
        self.apu
            .tick(cycles, &mut CartridgeSamples(self.mapper.as_mut()));
        self.mapper.tick(cycles);
    }

    /// Level of the maskable IRQ line (APU frame/DMC or cartridge).
    pub fn irq_line(&self) -> bool {
        self.apu.irq() || self.mapper.irq_pending()
    }
}

impl CpuMemory for Bus {
    #[inline]
    fn cpu_read(&mut self, addr: u16) -> u8 {
        self.read(addr)
    }
}

impl OamWriter for Bus {
    #[inline]
    fn write_oam_data(&mut self, value: u8) {
        self.ppu.write_oam_data(value);
    }
}
