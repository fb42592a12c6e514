/*!
DmaController: OAM DMA state machine.

Purpose
- Encapsulate the OAM DMA lifecycle: `begin` latches the source page, each
  `tick` copies one byte and reports the CPU cycles it stole.
- Read from CPU memory and write to PPU OAM through two minimal traits so the
  controller never borrows the whole Bus.

Behavioral model
- Every byte costs 2 CPU cycles (one read, one write).
- The first byte of a transfer adds 1 alignment cycle on an even clock or 2
  on an odd clock, so a transfer totals 513 or 514 cycles.
- Reads go through the full CPU read path (side effects included).
- Writes go to OAMDATA ($2004), which increments OAMADDR.
- DMA-active clears exactly once, when the 256th byte has been written.
*/

/// CPU-memory interface used by DMA to fetch source bytes.
/// This must behave exactly like CPU-visible reads (including any side-effects).
pub trait CpuMemory {
    fn cpu_read(&mut self, addr: u16) -> u8;
}

/// OAM write interface used by DMA, equivalent to writing $2004.
pub trait OamWriter {
    fn write_oam_data(&mut self, value: u8);
}

pub const DMA_BYTES: u16 = 256;

#[derive(Debug, Default)]
pub struct DmaController {
    active: bool,
    src_addr: u16,
    index: u16,
}

impl DmaController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transfer from `page << 8`.
    pub fn begin(&mut self, page: u8) {
        self.active = true;
        self.src_addr = (page as u16) << 8;
        self.index = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Bytes copied so far in the current transfer.
    pub fn transferred(&self) -> u16 {
        self.index
    }

    /// Copy one byte. Returns the CPU cycles consumed, or 0 when idle.
    ///
    /// `clock` is the current CPU cycle count; its parity decides the
    /// alignment penalty on the first byte.
    pub fn tick<M: CpuMemory + OamWriter>(&mut self, mem: &mut M, clock: u64) -> u32 {
        if !self.active {
            return 0;
        }
        let mut cycles = 2;
        if self.index == 0 {
            cycles += 1 + (clock & 1) as u32;
        }

        let value = mem.cpu_read(self.src_addr.wrapping_add(self.index));
        mem.write_oam_data(value);
        self.index += 1;

        if self.index == DMA_BYTES {
            self.active = false;
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockMem {
        data: Vec<u8>,
        reads: Vec<u16>,
        oam: Vec<u8>,
    }

    impl MockMem {
        fn new_fill_pattern() -> Self {
            Self {
                data: (0..0x10000usize).map(|i| (i as u8) ^ 0x5A).collect(),
                reads: Vec::new(),
                oam: Vec::new(),
            }
        }
    }

    impl CpuMemory for MockMem {
        fn cpu_read(&mut self, addr: u16) -> u8 {
            self.reads.push(addr);
            self.data[addr as usize]
        }
    }

    impl OamWriter for MockMem {
        fn write_oam_data(&mut self, value: u8) {
            self.oam.push(value);
        }
    }

    fn drain(dma: &mut DmaController, mem: &mut MockMem, start_clock: u64) -> (u32, u32) {
        let mut clock = start_clock;
        let mut total = 0;
        let mut deactivations = 0;
        while dma.is_active() {
            let c = dma.tick(mem, clock);
            clock += c as u64;
            total += c;
            if !dma.is_active() {
                deactivations += 1;
            }
        }
        (total, deactivations)
    }

    #[test]
    fn copies_256_bytes_in_order_even_clock() {
        let mut dma = DmaController::new();
        let mut mem = MockMem::new_fill_pattern();
        dma.begin(0x02);
        let (cycles, deactivations) = drain(&mut dma, &mut mem, 0);

        assert_eq!(cycles, 513);
        assert_eq!(deactivations, 1);
        assert_eq!(mem.oam.len(), 256);
        for (i, &b) in mem.oam.iter().enumerate() {
            assert_eq!(b, ((0x0200 + i) as u8) ^ 0x5A);
        }
        assert_eq!(mem.reads.first(), Some(&0x0200));
        assert_eq!(mem.reads.last(), Some(&0x02FF));
    }

    #[test]
    fn odd_clock_adds_second_alignment_cycle() {
        let mut dma = DmaController::new();
        let mut mem = MockMem::new_fill_pattern();
        dma.begin(0x07);
        let (cycles, _) = drain(&mut dma, &mut mem, 1);
        assert_eq!(cycles, 514);
    }

    #[test]
    fn active_until_last_byte() {
        let mut dma = DmaController::new();
        let mut mem = MockMem::new_fill_pattern();
        dma.begin(0x00);
        for _ in 0..255 {
            dma.tick(&mut mem, 0);
            assert!(dma.is_active());
        }
        assert_eq!(dma.transferred(), 255);
        assert_eq!(dma.tick(&mut mem, 0), 2);
        assert!(!dma.is_active());
        assert_eq!(dma.tick(&mut mem, 0), 0);
    }
}
