/*!
Machine configuration.

Everything here is fixed at cartridge-load time; there is no runtime
reconfiguration.
*/

use crate::logging::{SharedLogger, log_facade};

/// Default host audio rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Clone)]
pub struct Config {
    /// Output sample rate of the APU resampler, in Hz.
    pub sample_rate: u32,
    /// Seed for power-on RAM/VRAM contents. `None` zero-fills.
    pub ram_seed: Option<u64>,
    pub logger: SharedLogger,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            ram_seed: None,
            logger: log_facade(),
        }
    }
}

impl Config {
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate.max(1);
        self
    }

    pub fn with_ram_seed(mut self, seed: u64) -> Self {
        self.ram_seed = Some(seed);
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }
}

/// Deterministic xorshift64 fill for power-on memory contents.
pub fn fill_power_on(buf: &mut [u8], seed: Option<u64>) {
    let Some(seed) = seed else {
        buf.fill(0);
        return;
    };
    let mut state = seed | 1;
    for b in buf.iter_mut() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        *b = (state >> 24) as u8;
    }
}
