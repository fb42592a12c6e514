/*!
Open-bus model.

Device reads return a `u16`: the low byte is the value the device drives, the
high byte is a mask of bits the device leaves undriven. The bus keeps a single
retained byte (the last value driven in either direction) and fills undriven
bits from it. This is a simplification of the physical bus and is kept as-is.
*/

/// Device read result with every bit driven.
#[inline]
pub const fn driven(value: u8) -> u16 {
    value as u16
}

/// Device read result driving only the bits clear in `undriven`.
#[inline]
pub const fn partial(value: u8, undriven: u8) -> u16 {
    ((undriven as u16) << 8) | (value & !undriven) as u16
}

/// Nothing drives the bus.
pub const UNDRIVEN: u16 = 0xFF00;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenBus {
    last: u8,
}

impl OpenBus {
    /// Resolve an encoded read and retain the result.
    #[inline]
    pub fn resolve(&mut self, encoded: u16) -> u8 {
        let value = encoded as u8;
        let mask = (encoded >> 8) as u8;
        self.last = (value & !mask) | (self.last & mask);
        self.last
    }

    /// Record a value driven by a CPU write.
    #[inline]
    pub fn drive(&mut self, value: u8) {
        self.last = value;
    }

    #[inline]
    pub fn last(&self) -> u8 {
        self.last
    }
}
