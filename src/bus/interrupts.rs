/*!
InterruptController: NMI latch and DMA-in-progress level.

- `trigger_nmi` is edge-like and coalesces: any number of triggers before the
  next `check_nmi` produce one event.
- `check_nmi` tests and clears.
- `set_dma_in_progress` is a level condition owned by the DMA path.
- `has_any_condition` is recomputed on every change; the CPU polls it once per
  step and services DMA before NMI.

The maskable IRQ line is not latched here: it is a level computed by the Bus
from its sources and acknowledged only by them.
*/

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InterruptController {
    nmi_pending: bool,
    dma_active: bool,
    any: bool,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn recompute(&mut self) {
        self.any = self.nmi_pending || self.dma_active;
    }

    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
        self.recompute();
    }

    /// Consume a pending NMI. Returns whether one was pending.
    pub fn check_nmi(&mut self) -> bool {
        let fired = self.nmi_pending;
        self.nmi_pending = false;
        self.recompute();
        fired
    }

    pub fn set_dma_in_progress(&mut self, active: bool) {
        self.dma_active = active;
        self.recompute();
    }

    #[inline]
    pub fn dma_in_progress(&self) -> bool {
        self.dma_active
    }

    #[inline]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    #[inline]
    pub fn has_any_condition(&self) -> bool {
        self.any
    }
}

#[cfg(test)]
mod tests {
    use super::InterruptController;

    #[test]
    fn nmi_triggers_coalesce() {
        let mut ic = InterruptController::new();
        ic.trigger_nmi();
        ic.trigger_nmi();
        assert!(ic.has_any_condition());
        assert!(ic.check_nmi());
        assert!(!ic.check_nmi());
        assert!(!ic.has_any_condition());
    }

    #[test]
    fn dma_level_is_independent_of_nmi() {
        let mut ic = InterruptController::new();
        ic.set_dma_in_progress(true);
        ic.trigger_nmi();
        assert!(ic.check_nmi());
        assert!(ic.has_any_condition());
        assert!(ic.dma_in_progress());
        ic.set_dma_in_progress(false);
        assert!(!ic.has_any_condition());
    }
}
