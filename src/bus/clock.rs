/*!
Master clock for the machine, counted in CPU cycles.

Purpose
- Single monotonic counter owned by the Bus and advanced by `Bus::advance`
  after every CPU action, before any device is ticked.
- Parity of the counter drives the OAM DMA alignment quirk.

The counter never decreases; it wraps only at `u64` overflow.
*/

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    ticks: u64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn advance(&mut self, cycles: u64) {
        self.ticks = self.ticks.wrapping_add(cycles);
    }

    /// CPU cycles elapsed since power-on.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn is_odd(&self) -> bool {
        self.ticks & 1 == 1
    }
}
