/*!
APU: frame sequencer, five channels, non-linear mixer and resampler.

Registers
- `$4000-$4003` pulse 1, `$4004-$4007` pulse 2, `$4008-$400B` triangle,
  `$400C-$400F` noise, `$4010-$4013` DMC.
- `$4015` write: channel enables (disabling clears the length counter),
  clears the DMC IRQ. Read: length-counter status in bits 0-3, DMC active in
  bit 4, frame IRQ in bit 6, DMC IRQ in bit 7; bit 5 is open bus. Reading
  acknowledges the frame IRQ.
- `$4017` write: sequencer mode (bit 7) and IRQ inhibit (bit 6). The
  sequencer restarts; selecting the 5-step mode clocks a quarter and a half
  frame immediately. Setting inhibit clears the frame IRQ.

Timing (NTSC CPU cycles since the sequencer restarted)
- 4-step: quarter frames at 7457, 14913, 22371, 29829; half frames at 14913
  and 29829; frame IRQ at 29829; period 29830.
- 5-step: quarter frames at 7457, 14913, 22371, 37281; half frames at 14913
  and 37281; no IRQ; period 37282.

Output
- Each CPU cycle, `acc += sample_rate`; when `acc` reaches the CPU clock a
  mixed sample is emitted as an interleaved stereo pair (left = right).
  Samples collect in an internal buffer, drained by `take_samples` or
  forwarded to an `AudioSink` at the end of each `tick`.
*/

mod dmc;
mod noise;
mod pulse;
mod triangle;
mod units;

use dmc::Dmc;
use noise::Noise;
use pulse::{Pulse, PulseId};
use triangle::Triangle;

use crate::bus::open_bus::partial;
use crate::logging::SharedLogger;

/// NTSC CPU clock in Hz.
pub const CPU_CLOCK_HZ: u32 = 1_789_773;

const STATUS_FRAME_IRQ: u8 = 0x40;
const STATUS_DMC_IRQ: u8 = 0x80;

/// Cartridge-side services the APU needs while ticking.
pub trait SampleMemory {
    /// DMC sample fetch from CPU space `$8000-$FFFF`.
    fn read_sample(&mut self, addr: u16) -> u8;
    /// Mapper expansion audio, added to the mix.
    fn expansion_audio(&self) -> f32;
}

/// Receives interleaved stereo samples as they are produced.
pub trait AudioSink {
    fn samples(&mut self, interleaved: &[f32]);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerMode {
    FourStep,
    FiveStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameClock {
    None,
    Quarter,
    Half,
}

#[derive(Debug, Clone)]
struct FrameSequencer {
    mode: SequencerMode,
    irq_inhibit: bool,
    cycle: u32,
}

impl FrameSequencer {
    fn new() -> Self {
        Self {
            mode: SequencerMode::FourStep,
            irq_inhibit: false,
            cycle: 0,
        }
    }

    /// Advance one CPU cycle. Returns the frame clock due on this cycle and
    /// whether the frame IRQ fires.
    fn clock(&mut self) -> (FrameClock, bool) {
        self.cycle += 1;
        let mut irq = false;
        let event = match (self.mode, self.cycle) {
            (_, 7457) | (_, 22371) => FrameClock::Quarter,
            (_, 14913) => FrameClock::Half,
            (SequencerMode::FourStep, 29829) => {
                irq = !self.irq_inhibit;
                FrameClock::Half
            }
            (SequencerMode::FiveStep, 37281) => FrameClock::Half,
            _ => FrameClock::None,
        };
        let period = match self.mode {
            SequencerMode::FourStep => 29830,
            SequencerMode::FiveStep => 37282,
        };
        if self.cycle >= period {
            self.cycle = 0;
        }
        (event, irq)
    }
}

pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    sequencer: FrameSequencer,
    frame_irq: bool,

    pulse_table: [f32; 31],
    tnd_table: [f32; 203],

    sample_rate: u32,
    sample_acc: u32,
    samples: Vec<f32>,
    sink: Option<Box<dyn AudioSink>>,

    logger: SharedLogger,
}

impl Apu {
    pub fn new(sample_rate: u32, logger: SharedLogger) -> Self {
        let mut pulse_table = [0.0; 31];
        for (n, out) in pulse_table.iter_mut().enumerate().skip(1) {
            *out = 95.52 / (8128.0 / n as f32 + 100.0);
        }
        let mut tnd_table = [0.0; 203];
        for (n, out) in tnd_table.iter_mut().enumerate().skip(1) {
            *out = 163.67 / (24329.0 / n as f32 + 100.0);
        }
        Self {
            pulse1: Pulse::new(PulseId::One),
            pulse2: Pulse::new(PulseId::Two),
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            sequencer: FrameSequencer::new(),
            frame_irq: false,
            pulse_table,
            tnd_table,
            sample_rate,
            sample_acc: 0,
            samples: Vec::new(),
            sink: None,
            logger,
        }
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.logger.debug(format_args!(
            "APU audio sink attached at {} Hz",
            self.sample_rate
        ));
        self.sink = Some(sink);
    }

    /// Drain buffered interleaved samples.
    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sequencer_mode(&self) -> SequencerMode {
        self.sequencer.mode
    }

    /// Level of the APU's contribution to the IRQ line.
    pub fn irq(&self) -> bool {
        self.frame_irq || self.dmc.irq
    }

    pub fn write_register(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000..=0x4003 => self.pulse1.write(addr & 3, value),
            0x4004..=0x4007 => self.pulse2.write(addr & 3, value),
            0x4008..=0x400B => self.triangle.write(addr & 3, value),
            0x400C..=0x400F => self.noise.write(addr & 3, value),
            0x4010..=0x4013 => self.dmc.write(addr & 3, value),
            0x4015 => {
                self.pulse1.length.set_enabled(value & 0x01 != 0);
                self.pulse2.length.set_enabled(value & 0x02 != 0);
                self.triangle.length.set_enabled(value & 0x04 != 0);
                self.noise.length.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }
            0x4017 => {
                self.sequencer.mode = if value & 0x80 != 0 {
                    SequencerMode::FiveStep
                } else {
                    SequencerMode::FourStep
                };
                self.sequencer.irq_inhibit = value & 0x40 != 0;
                self.sequencer.cycle = 0;
                if self.sequencer.irq_inhibit {
                    self.frame_irq = false;
                }
                if self.sequencer.mode == SequencerMode::FiveStep {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                self.logger.debug(format_args!(
                    "APU frame sequencer {:?}, IRQ inhibit {}",
                    self.sequencer.mode, self.sequencer.irq_inhibit
                ));
            }
            _ => self
                .logger
                .debug(format_args!("APU write to unused ${addr:04X}")),
        }
    }

    /// `$4015` read, open-bus encoded. Acknowledges the frame IRQ.
    pub fn read_status(&mut self) -> u16 {
        let mut status = 0;
        if self.pulse1.length.active() {
            status |= 0x01;
        }
        if self.pulse2.length.active() {
            status |= 0x02;
        }
        if self.triangle.length.active() {
            status |= 0x04;
        }
        if self.noise.length.active() {
            status |= 0x08;
        }
        if self.dmc.active() {
            status |= 0x10;
        }
        if self.frame_irq {
            status |= STATUS_FRAME_IRQ;
        }
        if self.dmc.irq {
            status |= STATUS_DMC_IRQ;
        }
        self.frame_irq = false;
        partial(status, 0x20)
    }

    /// Advance by `cpu_cycles`, emitting samples as they come due.
    pub fn tick(&mut self, cpu_cycles: u32, memory: &mut dyn SampleMemory) {
        for _ in 0..cpu_cycles {
            let (event, irq) = self.sequencer.clock();
            match event {
                FrameClock::Quarter => self.clock_quarter_frame(),
                FrameClock::Half => {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
                FrameClock::None => {}
            }
            if irq {
                self.frame_irq = true;
            }

            if self.sequencer.cycle & 1 == 0 {
                self.pulse1.clock_timer();
                self.pulse2.clock_timer();
            }
            self.triangle.clock_timer();
            self.noise.clock_timer();
            self.dmc.clock(memory);

            self.sample_acc += self.sample_rate;
            if self.sample_acc >= CPU_CLOCK_HZ {
                self.sample_acc -= CPU_CLOCK_HZ;
                let sample = self.mix(memory.expansion_audio());
                self.samples.extend_from_slice(&[sample, sample]);
            }
        }

        if let Some(sink) = self.sink.as_mut()
            && !self.samples.is_empty()
        {
            sink.samples(&self.samples);
            self.samples.clear();
        }
    }

    fn clock_quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.noise.clock_envelope();
        self.triangle.clock_linear();
    }

    fn clock_half_frame(&mut self) {
        self.pulse1.clock_length();
        self.pulse2.clock_length();
        self.triangle.clock_length();
        self.noise.clock_length();
        self.pulse1.clock_sweep();
        self.pulse2.clock_sweep();
    }

    fn mix(&self, expansion: f32) -> f32 {
        let pulse = (self.pulse1.output() + self.pulse2.output()) as usize;
        let tnd = 3 * self.triangle.output() as usize
            + 2 * self.noise.output() as usize
            + self.dmc.output() as usize;
        self.pulse_table[pulse] + self.tnd_table[tnd] + expansion
    }
}
