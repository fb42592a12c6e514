/*!
Standard joypad on `$4016`/`$4017`.

The pad is an 8-bit parallel-in, serial-out shift register:
- A write to `$4016` sets the strobe from bit 0. While strobe is high the
  register reloads from the live buttons continuously, so every read
  returns button A.
- With strobe low each read returns bit 0 and shifts right. Ones shift in
  from the top, so reads after the eighth return 1.

Bit order (bit 0 first): A, B, Select, Start, Up, Down, Left, Right. Only
bit 0 of a read is driven by the pad; the bus fills the rest.

Hosts supply buttons either through an `InputSource`, which the bus polls
on every strobe-high write, or by setting them on the controller directly.
*/

/// Host input collaborator: the pressed-button mask for `port` (0 or 1),
/// laid out as `Button`.
pub trait InputSource {
    fn poll(&mut self, port: usize) -> u8;
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

impl Button {
    #[inline]
    pub fn mask(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Clone, Debug, Default)]
pub struct Controller {
    /// Live state, bit set = pressed.
    buttons: u8,
    shift: u8,
    strobe: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    pub fn press(&mut self, button: Button) {
        self.set_button(button, true);
    }

    pub fn release(&mut self, button: Button) {
        self.set_button(button, false);
    }

    /// Replace the whole button state.
    pub fn set_state_mask(&mut self, mask: u8) {
        self.buttons = mask;
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// `$4016` write.
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 1 != 0;
        if self.strobe {
            self.shift = self.buttons;
        }
    }

    /// Serial read; only bit 0 is meaningful.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.shift = self.buttons;
            return self.shift & 1;
        }
        let bit = self.shift & 1;
        self.shift = (self.shift >> 1) | 0x80;
        bit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_buttons_in_order_then_ones() {
        let mut pad = Controller::new();
        pad.press(Button::A);
        pad.press(Button::Start);
        pad.press(Button::Left);
        pad.write_strobe(1);
        pad.write_strobe(0);

        let bits: Vec<u8> = (0..8).map(|_| pad.read()).collect();
        assert_eq!(bits, [1, 0, 0, 1, 0, 0, 1, 0]);
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 1);
    }

    #[test]
    fn strobe_high_keeps_returning_a() {
        let mut pad = Controller::new();
        pad.set_state_mask(Button::A.mask() | Button::B.mask());
        pad.write_strobe(1);
        for _ in 0..12 {
            assert_eq!(pad.read(), 1);
        }
        pad.release(Button::A);
        assert_eq!(pad.read(), 0, "reload sees the release immediately");
        assert_eq!(pad.buttons(), Button::B.mask());
    }

    #[test]
    fn state_changes_after_latch_are_not_shifted_out() {
        let mut pad = Controller::new();
        pad.write_strobe(1);
        pad.write_strobe(0);
        pad.press(Button::A);
        assert_eq!(pad.read(), 0);
    }
}
