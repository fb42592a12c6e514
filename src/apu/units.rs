//! Building blocks shared by the APU channels: the length counter and the
//! volume envelope.

/// Length counter load values, indexed by bits 3-7 of the channel's fourth
/// register.
pub const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Counts down on half frames; the channel is silent at zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthCounter {
    value: u8,
    halt: bool,
    enabled: bool,
}

impl LengthCounter {
    /// Load from a register write; ignored while the channel is disabled.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.value = LENGTH_TABLE[(index & 0x1F) as usize];
        }
    }

    pub fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    /// `$4015` enable bit. Disabling clears the counter.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.value = 0;
        }
    }

    pub fn clock(&mut self) {
        if !self.halt && self.value > 0 {
            self.value -= 1;
        }
    }

    pub fn active(&self) -> bool {
        self.value > 0
    }
}

/// Decaying volume, or a constant volume, clocked on quarter frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct Envelope {
    start: bool,
    looping: bool,
    constant: bool,
    /// Constant volume, or the divider period.
    volume: u8,
    divider: u8,
    decay: u8,
}

impl Envelope {
    /// Bits 0-5 of `$4000`/`$4004`/`$400C`: loop (shared with length halt),
    /// constant volume, volume/period.
    pub fn write(&mut self, value: u8) {
        self.looping = value & 0x20 != 0;
        self.constant = value & 0x10 != 0;
        self.volume = value & 0x0F;
    }

    pub fn restart(&mut self) {
        self.start = true;
    }

    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = self.volume;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.volume;
            if self.decay > 0 {
                self.decay -= 1;
            } else if self.looping {
                self.decay = 15;
            }
        }
    }

    pub fn output(&self) -> u8 {
        if self.constant { self.volume } else { self.decay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counter_loads_only_when_enabled() {
        let mut lc = LengthCounter::default();
        lc.load(1);
        assert!(!lc.active());
        lc.set_enabled(true);
        lc.load(1);
        assert_eq!(lc.value, 254);
        lc.set_enabled(false);
        assert!(!lc.active());
    }

    #[test]
    fn halted_length_counter_holds() {
        let mut lc = LengthCounter::default();
        lc.set_enabled(true);
        lc.load(0);
        lc.set_halt(true);
        for _ in 0..20 {
            lc.clock();
        }
        assert_eq!(lc.value, 10);
        lc.set_halt(false);
        for _ in 0..10 {
            lc.clock();
        }
        assert!(!lc.active());
        lc.clock();
        assert_eq!(lc.value, 0);
    }

    #[test]
    fn envelope_decays_then_loops() {
        let mut env = Envelope::default();
        env.write(0x20); // loop, period 0
        env.restart();
        env.clock();
        assert_eq!(env.output(), 15);
        for _ in 0..15 {
            env.clock();
        }
        assert_eq!(env.output(), 0);
        env.clock();
        assert_eq!(env.output(), 15, "loop flag reloads the decay level");
    }

    #[test]
    fn envelope_constant_volume() {
        let mut env = Envelope::default();
        env.write(0x17);
        env.restart();
        env.clock();
        assert_eq!(env.output(), 7);
    }
}
