//! Triangle channel (`$4008-$400B`).
//!
//! The sequencer steps once per timer expiry (every CPU cycle) while both
//! the linear and length counters are non-zero. Periods below 2 are
//! ultrasonic; the sequencer is held so the output stays at its last level
//! instead of aliasing.

use super::units::LengthCounter;

const SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

#[derive(Debug, Default, Clone)]
pub struct Triangle {
    period: u16,
    timer: u16,
    step: u8,
    pub(super) length: LengthCounter,
    /// Control flag: halts the length counter and keeps the linear reload set.
    control: bool,
    linear_load: u8,
    linear: u8,
    linear_reload: bool,
}

impl Triangle {
    pub fn write(&mut self, reg: u16, value: u8) {
        match reg {
            0 => {
                self.control = value & 0x80 != 0;
                self.length.set_halt(self.control);
                self.linear_load = value & 0x7F;
            }
            1 => {}
            2 => self.period = (self.period & 0x0700) | value as u16,
            _ => {
                self.period = (self.period & 0x00FF) | (((value & 0x07) as u16) << 8);
                self.length.load(value >> 3);
                self.linear_reload = true;
            }
        }
    }

    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period;
        if self.length.active() && self.linear > 0 && self.period >= 2 {
            self.step = (self.step + 1) & 31;
        }
    }

    pub fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear = self.linear_load;
        } else if self.linear > 0 {
            self.linear -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    pub fn clock_length(&mut self) {
        self.length.clock();
    }

    pub fn output(&self) -> u8 {
        SEQUENCE[self.step as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(period: u16) -> Triangle {
        let mut t = Triangle::default();
        t.length.set_enabled(true);
        t.write(0, 0x10);
        t.write(2, (period & 0xFF) as u8);
        t.write(3, 0x08 | (period >> 8) as u8);
        t.clock_linear();
        t
    }

    #[test]
    fn steps_through_sequence() {
        let mut t = playing(4);
        assert_eq!(t.output(), 15);
        let mut seen = Vec::new();
        for _ in 0..32 * 5 {
            t.clock_timer();
            seen.push(t.output());
        }
        assert!(seen.contains(&0));
        assert_eq!(t.output(), 15, "full period returns to the start");
    }

    #[test]
    fn ultrasonic_period_holds_output() {
        let mut t = playing(1);
        for _ in 0..100 {
            t.clock_timer();
        }
        assert_eq!(t.output(), 15);
    }

    #[test]
    fn linear_counter_expiry_stops_sequencer() {
        let mut t = playing(0x20);
        t.write(0, 0x01);
        t.write(3, 0x08);
        t.clock_linear(); // reload to 1
        t.clock_linear(); // 0
        let before = t.output();
        for _ in 0..0x200 {
            t.clock_timer();
        }
        assert_eq!(t.output(), before);
    }
}
