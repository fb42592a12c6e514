//! Pulse channels (`$4000-$4003`, `$4004-$4007`).
//!
//! The timer is clocked every other CPU cycle. The channel is muted while
//! the period is below 8 or the sweep target exceeds `$7FF`, whether or not
//! the sweep is enabled. Pulse 1 negates with ones' complement (one less
//! than pulse 2).

use super::units::{Envelope, LengthCounter};

const DUTY_SEQUENCES: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseId {
    One,
    Two,
}

#[derive(Debug, Clone)]
pub struct Pulse {
    id: PulseId,
    duty: u8,
    step: u8,
    period: u16,
    timer: u16,
    pub(super) length: LengthCounter,
    envelope: Envelope,
    sweep_enabled: bool,
    sweep_period: u8,
    sweep_negate: bool,
    sweep_shift: u8,
    sweep_divider: u8,
    sweep_reload: bool,
}

impl Pulse {
    pub fn new(id: PulseId) -> Self {
        Self {
            id,
            duty: 0,
            step: 0,
            period: 0,
            timer: 0,
            length: LengthCounter::default(),
            envelope: Envelope::default(),
            sweep_enabled: false,
            sweep_period: 0,
            sweep_negate: false,
            sweep_shift: 0,
            sweep_divider: 0,
            sweep_reload: false,
        }
    }

    /// `reg` is the register offset 0..=3 within the channel.
    pub fn write(&mut self, reg: u16, value: u8) {
        match reg {
            0 => {
                self.duty = value >> 6;
                self.length.set_halt(value & 0x20 != 0);
                self.envelope.write(value);
            }
            1 => {
                self.sweep_enabled = value & 0x80 != 0;
                self.sweep_period = (value >> 4) & 0x07;
                self.sweep_negate = value & 0x08 != 0;
                self.sweep_shift = value & 0x07;
                self.sweep_reload = true;
            }
            2 => self.period = (self.period & 0x0700) | value as u16,
            _ => {
                self.period = (self.period & 0x00FF) | (((value & 0x07) as u16) << 8);
                self.length.load(value >> 3);
                self.step = 0;
                self.envelope.restart();
            }
        }
    }

    /// One APU cycle (two CPU cycles).
    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period;
            self.step = (self.step + 1) & 7;
        } else {
            self.timer -= 1;
        }
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    pub fn clock_length(&mut self) {
        self.length.clock();
    }

    pub fn clock_sweep(&mut self) {
        if self.sweep_divider == 0 && self.sweep_enabled && self.sweep_shift > 0 && !self.muted() {
            self.period = self.target_period();
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep_period;
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
        }
    }

    fn target_period(&self) -> u16 {
        let delta = self.period >> self.sweep_shift;
        if !self.sweep_negate {
            return self.period + delta;
        }
        match self.id {
            PulseId::One => self.period.saturating_sub(delta + 1),
            PulseId::Two => self.period.saturating_sub(delta),
        }
    }

    fn muted(&self) -> bool {
        self.period < 8 || self.target_period() > 0x7FF
    }

    pub fn output(&self) -> u8 {
        if !self.length.active()
            || self.muted()
            || DUTY_SEQUENCES[self.duty as usize][self.step as usize] == 0
        {
            return 0;
        }
        self.envelope.output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(id: PulseId, period: u16) -> Pulse {
        let mut p = Pulse::new(id);
        p.length.set_enabled(true);
        p.write(0, 0xBF); // duty 2, halt, constant volume 15
        p.write(2, (period & 0xFF) as u8);
        p.write(3, 0x08 | (period >> 8) as u8);
        p
    }

    #[test]
    fn low_periods_are_muted() {
        let mut p = playing(PulseId::Two, 7);
        for _ in 0..64 {
            p.clock_timer();
            assert_eq!(p.output(), 0);
        }
    }

    #[test]
    fn duty_half_outputs_half_the_sequence() {
        let mut p = playing(PulseId::Two, 100);
        let mut high = 0;
        for _ in 0..8 {
            for _ in 0..=100 {
                p.clock_timer();
            }
            if p.output() == 15 {
                high += 1;
            }
        }
        assert_eq!(high, 4);
    }

    #[test]
    fn sweep_target_overflow_mutes_even_when_disabled() {
        let mut p = playing(PulseId::Two, 0x600);
        p.write(1, 0x01); // disabled, shift 1: target 0x900
        assert!(p.muted());
        p.write(1, 0x09); // negate
        assert!(!p.muted());
    }

    #[test]
    fn pulse_one_negates_with_ones_complement() {
        let mut one = playing(PulseId::One, 0x100);
        let mut two = playing(PulseId::Two, 0x100);
        for p in [&mut one, &mut two] {
            p.write(1, 0x89); // enabled, period 0, negate, shift 1
            p.clock_sweep();
        }
        assert_eq!(one.period, 0x100 - 0x80 - 1);
        assert_eq!(two.period, 0x100 - 0x80);
    }

    #[test]
    fn sweep_adds_on_divider_expiry() {
        let mut p = playing(PulseId::Two, 0x100);
        p.write(1, 0x92); // enabled, divider period 1, shift 2
        p.clock_sweep();
        assert_eq!(p.period, 0x140);
        p.clock_sweep();
        assert_eq!(p.period, 0x140, "divider still counting");
        p.clock_sweep();
        assert_eq!(p.period, 0x190);
    }
}
