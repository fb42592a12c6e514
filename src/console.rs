/*!
Console: the driving loop.

`step` runs one CPU action (an instruction, an interrupt entry or one OAM DMA
byte) and then advances the bus by the cycles it reported, which moves the
PPU, the APU and the mapper in that order. `run_frame` steps until the PPU
enters vblank.

```ignore
let cart = Cartridge::from_path("game.nes", log_facade())?;
let mut console = Console::new(cart, Config::default());
console.set_video_sink(Box::new(window));
loop {
    console.run_frame()?;
}
```
*/

use crate::apu::AudioSink;
use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::config::Config;
use crate::controller::{Controller, InputSource};
use crate::cpu::Cpu;
use crate::error::Result;
use crate::logging::SharedLogger;
use crate::ppu::VideoSink;

pub struct Console {
    cpu: Cpu,
    bus: Bus,
    logger: SharedLogger,
}

impl Console {
    /// Power on with `cartridge` inserted. The CPU is reset before this
    /// returns.
    pub fn new(cartridge: Cartridge, config: Config) -> Self {
        let mapper_id = cartridge.mapper_id();
        let mut bus = Bus::new(cartridge.into_mapper(), &config);
        let mut cpu = Cpu::new(config.logger.clone());
        cpu.reset(&mut bus);
        config.logger.debug(format_args!(
            "console powered on: mapper {mapper_id}, {} Hz audio",
            config.sample_rate
        ));
        Self {
            cpu,
            bus,
            logger: config.logger,
        }
    }

    /// Parse an iNES image and power on. CIRAM takes the configured seed.
    pub fn from_ines_bytes(data: &[u8], config: Config) -> Result<Self> {
        let cartridge =
            Cartridge::from_ines_bytes_seeded(data, config.logger.clone(), config.ram_seed)?;
        Ok(Self::new(cartridge, config))
    }

    /// Reset button: CPU reset only; RAM and device state survive.
    pub fn reset(&mut self) {
        self.logger.debug(format_args!("console reset"));
        self.cpu.reset(&mut self.bus);
    }

    /// Run one CPU action and advance every device by its cycle count.
    pub fn step(&mut self) -> Result<u32> {
        let cycles = self.cpu.tick(&mut self.bus)?;
        self.bus.advance(cycles);
        Ok(cycles)
    }

    /// Step until the PPU completes a frame. Returns the CPU cycles run.
    pub fn run_frame(&mut self) -> Result<u64> {
        let start = self.bus.clock.ticks();
        loop {
            self.step()?;
            if self.bus.ppu.take_frame_complete() {
                break;
            }
        }
        Ok(self.bus.clock.ticks().wrapping_sub(start))
    }

    pub fn set_input(&mut self, input: Box<dyn InputSource>) {
        self.bus.set_input(input);
    }

    pub fn set_video_sink(&mut self, sink: Box<dyn VideoSink>) {
        self.bus.ppu.set_video_sink(sink);
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.bus.apu.set_audio_sink(sink);
    }

    /// Controller on `port` (0 or 1), for hosts that set buttons directly
    /// instead of through an `InputSource`.
    pub fn controller_mut(&mut self, port: usize) -> &mut Controller {
        &mut self.bus.controllers[port & 1]
    }

    /// Log a trace line before every instruction.
    pub fn set_trace(&mut self, on: bool) {
        self.cpu.set_trace(on);
    }

    /// 256 x 240 RGB frame buffer.
    pub fn frame_buffer(&self) -> &[u8] {
        self.bus.ppu.frame_buffer()
    }

    /// Drain interleaved audio samples produced since the last call.
    pub fn take_samples(&mut self) -> Vec<f32> {
        self.bus.apu.take_samples()
    }

    /// CPU cycles since power-on.
    pub fn cycles(&self) -> u64 {
        self.bus.clock.ticks()
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.ppu.frame_count()
    }

    /// Battery-backed save data, if the board has any.
    pub fn save_data(&self) -> Option<&[u8]> {
        let mapper = self.bus.mapper();
        mapper.board().battery.then(|| mapper.prg_ram())
    }

    pub fn load_save_data(&mut self, data: &[u8]) {
        self.bus.mapper_mut().load_prg_ram(data);
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}
