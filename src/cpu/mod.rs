/*!
cpu::mod - Public façade for the 6502 CPU core.

Layout:

```text
state.rs       - Registers, flags, stack and fetch helpers.
addressing.rs  - Addressing modes, operand resolution, dummy reads.
table.rs       - Static 256-entry opcode table.
execute.rs     - The single generic executor.
```

`Cpu::tick` performs exactly one CPU action, in priority order:
  1. one OAM DMA byte while a transfer is in progress,
  2. NMI entry (7 cycles) when the NMI latch was set,
  3. IRQ entry (7 cycles) when the IRQ line is high and I is clear,
  4. one instruction.
It returns the cycles consumed; the caller advances the bus by that amount.

Usage:
```ignore
let mut cpu = Cpu::new(logger);
cpu.reset(&mut bus);
let cycles = cpu.tick(&mut bus)?;
bus.advance(cycles);
```
*/

pub mod addressing;
pub mod execute;
pub mod state;
pub mod table;


pub use addressing::AddressingMode;
pub use state::{BREAK, CARRY, CpuState, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, UNUSED, ZERO};
pub use table::{Opcode, Operation};

use crate::bus::Bus;
use crate::error::{EmuError, Result};
use crate::logging::SharedLogger;
use execute::IRQ_VECTOR;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;

/// Cycles spent in reset and in interrupt entry.
const INTERRUPT_CYCLES: u32 = 7;

pub struct Cpu {
    state: CpuState,
    trace: bool,
    logger: SharedLogger,
}

impl Cpu {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            state: CpuState::new(),
            trace: false,
            logger,
        }
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    /// Log a trace line before every instruction at debug level.
    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    /// Power-on/reset: PC from $FFFC, SP=$FD, I set. Costs 7 cycles on the
    /// bus clock.
    pub fn reset(&mut self, bus: &mut Bus) {
        self.state = CpuState::new();
        self.state.pc = bus.read_word(RESET_VECTOR);
        self.logger
            .debug(format_args!("CPU reset, PC=${:04X}", self.state.pc));
        bus.advance(INTERRUPT_CYCLES);
    }

    /// Perform one CPU action and return the cycles it consumed.
    pub fn tick(&mut self, bus: &mut Bus) -> Result<u32> {
        if bus.interrupts.has_any_condition() {
            if bus.interrupts.dma_in_progress() {
                return Ok(bus.dma_step());
            }
            if bus.interrupts.check_nmi() {
                self.interrupt(bus, NMI_VECTOR);
                return Ok(INTERRUPT_CYCLES);
            }
        }
        if bus.irq_line() && !self.state.is_flag_set(IRQ_DISABLE) {
            self.interrupt(bus, IRQ_VECTOR);
            return Ok(INTERRUPT_CYCLES);
        }
        self.step_instruction(bus)
    }

    fn step_instruction(&mut self, bus: &mut Bus) -> Result<u32> {
        if self.trace {
            let line = self.trace_line(bus);
            self.logger.debug(format_args!("{line}"));
        }
        let pc = self.state.pc;
        let opcode = self.state.fetch_u8(bus);
        let Some(entry) = table::lookup(opcode) else {
            self.logger
                .error(format_args!("unknown opcode ${opcode:02X} at ${pc:04X}"));
            return Err(EmuError::UnknownOpcode { opcode, pc });
        };
        Ok(execute::execute(&mut self.state, bus, entry))
    }

    /// Hardware interrupt entry: push PC and status (B clear), set I, vector.
    fn interrupt(&mut self, bus: &mut Bus, vector: u16) {
        let pc = self.state.pc;
        self.state.push_u16(bus, pc);
        let p = self.state.status_for_push(false);
        self.state.push_u8(bus, p);
        self.state.assign_flag(IRQ_DISABLE, true);
        self.state.pc = bus.read_word(vector);
    }

    /// nestest-style register dump for the instruction at PC, e.g.
    /// `C000  A9 42     LDA  A:00 X:00 Y:00 P:24 SP:FD CYC:7`.
    /// Uses side-effect-free reads only.
    pub fn trace_line(&self, bus: &mut Bus) -> String {
        let s = &self.state;
        let opcode = bus.peek(s.pc);
        let entry = table::lookup(opcode);
        let len = entry.map_or(0, |e| e.mode.operand_len());
        let mut bytes = format!("{opcode:02X}");
        for i in 1..=len {
            bytes.push_str(&format!(" {:02X}", bus.peek(s.pc.wrapping_add(i))));
        }
        let mnemonic = entry.map_or("???", |e| e.operation.mnemonic());
        format!(
            "{:04X}  {:<9} {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            s.pc,
            bytes,
            mnemonic,
            s.a,
            s.x,
            s.y,
            s.status,
            s.sp,
            bus.clock.ticks()
        )
    }
}
