/*!
execute.rs - The generic instruction executor.

`execute` interprets one `Opcode` record: it resolves the operand through
`addressing::resolve`, applies the operation, and returns the cycles the
instruction consumed (base + page-cross penalty + branch penalties). It
never advances the bus clock; the caller does that once per CPU action.

Notes
=====
- Decimal mode is stored but ignored by ADC/SBC.
- Read-modify-write instructions perform a single read and a single write.
*/

use crate::bus::Bus;
use crate::cpu::addressing::{Operand, resolve};
use crate::cpu::state::{CARRY, CpuState, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, ZERO};
use crate::cpu::table::{Opcode, Operation};

pub(crate) const IRQ_VECTOR: u16 = 0xFFFE;

/// Execute `op`; PC must already point past the opcode byte.
pub(crate) fn execute(cpu: &mut CpuState, bus: &mut Bus, op: &Opcode) -> u32 {
    let resolved = resolve(cpu, bus, op.mode, op.operation.access());
    let operand = resolved.operand;
    let mut cycles = op.cycles as u32;
    if op.page_penalty && resolved.page_crossed {
        cycles += 1;
    }

    use Operation::*;
    match op.operation {
        // Loads / stores
        Lda => {
            cpu.a = load(cpu, bus, operand);
            cpu.update_zn(cpu.a);
        }
        Ldx => {
            cpu.x = load(cpu, bus, operand);
            cpu.update_zn(cpu.x);
        }
        Ldy => {
            cpu.y = load(cpu, bus, operand);
            cpu.update_zn(cpu.y);
        }
        Sta => store(bus, operand, cpu.a),
        Stx => store(bus, operand, cpu.x),
        Sty => store(bus, operand, cpu.y),

        // Transfers
        Tax => {
            cpu.x = cpu.a;
            cpu.update_zn(cpu.x);
        }
        Tay => {
            cpu.y = cpu.a;
            cpu.update_zn(cpu.y);
        }
        Txa => {
            cpu.a = cpu.x;
            cpu.update_zn(cpu.a);
        }
        Tya => {
            cpu.a = cpu.y;
            cpu.update_zn(cpu.a);
        }
        Tsx => {
            cpu.x = cpu.sp;
            cpu.update_zn(cpu.x);
        }
        Txs => cpu.sp = cpu.x,

        // Stack
        Pha => {
            let a = cpu.a;
            cpu.push_u8(bus, a);
        }
        Php => {
            let p = cpu.status_for_push(true);
            cpu.push_u8(bus, p);
        }
        Pla => {
            cpu.a = cpu.pop_u8(bus);
            cpu.update_zn(cpu.a);
        }
        Plp => {
            let p = cpu.pop_u8(bus);
            cpu.restore_status(p);
        }

        // Logical
        And => {
            let v = load(cpu, bus, operand);
            cpu.a &= v;
            cpu.update_zn(cpu.a);
        }
        Ora => {
            let v = load(cpu, bus, operand);
            cpu.a |= v;
            cpu.update_zn(cpu.a);
        }
        Eor => {
            let v = load(cpu, bus, operand);
            cpu.a ^= v;
            cpu.update_zn(cpu.a);
        }
        Bit => {
            let v = load(cpu, bus, operand);
            cpu.assign_flag(ZERO, cpu.a & v == 0);
            cpu.assign_flag(NEGATIVE, v & 0x80 != 0);
            cpu.assign_flag(OVERFLOW, v & 0x40 != 0);
        }

        // Arithmetic
        Adc => {
            let v = load(cpu, bus, operand);
            add_with_carry(cpu, v);
        }
        Sbc => {
            let v = load(cpu, bus, operand);
            add_with_carry(cpu, v ^ 0xFF);
        }
        Cmp => {
            let v = load(cpu, bus, operand);
            let reg = cpu.a;
            compare(cpu, reg, v);
        }
        Cpx => {
            let v = load(cpu, bus, operand);
            let reg = cpu.x;
            compare(cpu, reg, v);
        }
        Cpy => {
            let v = load(cpu, bus, operand);
            let reg = cpu.y;
            compare(cpu, reg, v);
        }

        // Register increments
        Inx => {
            cpu.x = cpu.x.wrapping_add(1);
            cpu.update_zn(cpu.x);
        }
        Iny => {
            cpu.y = cpu.y.wrapping_add(1);
            cpu.update_zn(cpu.y);
        }
        Dex => {
            cpu.x = cpu.x.wrapping_sub(1);
            cpu.update_zn(cpu.x);
        }
        Dey => {
            cpu.y = cpu.y.wrapping_sub(1);
            cpu.update_zn(cpu.y);
        }

        // Read-modify-write
        Inc => read_modify_write(cpu, bus, operand, |_, v| v.wrapping_add(1)),
        Dec => read_modify_write(cpu, bus, operand, |_, v| v.wrapping_sub(1)),
        Asl => read_modify_write(cpu, bus, operand, |c, v| {
            c.assign_flag(CARRY, v & 0x80 != 0);
            v << 1
        }),
        Lsr => read_modify_write(cpu, bus, operand, |c, v| {
            c.assign_flag(CARRY, v & 0x01 != 0);
            v >> 1
        }),
        Rol => read_modify_write(cpu, bus, operand, |c, v| {
            let carry_in = c.carry();
            c.assign_flag(CARRY, v & 0x80 != 0);
            (v << 1) | carry_in
        }),
        Ror => read_modify_write(cpu, bus, operand, |c, v| {
            let carry_in = c.carry() << 7;
            c.assign_flag(CARRY, v & 0x01 != 0);
            (v >> 1) | carry_in
        }),

        // Control flow
        Jmp => cpu.pc = address(operand),
        Jsr => {
            let ret = cpu.pc.wrapping_sub(1);
            cpu.push_u16(bus, ret);
            cpu.pc = address(operand);
        }
        Rts => cpu.pc = cpu.pop_u16(bus).wrapping_add(1),
        Rti => {
            let p = cpu.pop_u8(bus);
            cpu.restore_status(p);
            cpu.pc = cpu.pop_u16(bus);
        }
        Brk => {
            // Return address skips the padding byte after BRK.
            let ret = cpu.pc.wrapping_add(1);
            cpu.push_u16(bus, ret);
            let p = cpu.status_for_push(true);
            cpu.push_u8(bus, p);
            cpu.assign_flag(IRQ_DISABLE, true);
            cpu.pc = bus.read_word(IRQ_VECTOR);
        }

        // Branches
        Bcc | Bcs | Bne | Beq | Bpl | Bmi | Bvc | Bvs => {
            if branch_condition(cpu, op.operation) {
                cpu.pc = address(operand);
                cycles += if resolved.page_crossed { 2 } else { 1 };
            }
        }

        // Flags
        Clc => cpu.assign_flag(CARRY, false),
        Sec => cpu.assign_flag(CARRY, true),
        Cli => cpu.assign_flag(IRQ_DISABLE, false),
        Sei => cpu.assign_flag(IRQ_DISABLE, true),
        Clv => cpu.assign_flag(OVERFLOW, false),
        Cld => cpu.assign_flag(DECIMAL, false),
        Sed => cpu.assign_flag(DECIMAL, true),

        Nop => {}
    }
    cycles
}

fn load(cpu: &CpuState, bus: &mut Bus, operand: Operand) -> u8 {
    match operand {
        Operand::Immediate(v) => v,
        Operand::Address(addr) => bus.read(addr),
        Operand::Accumulator => cpu.a,
        Operand::Implied => unreachable!("read instruction without an operand"),
    }
}

fn store(bus: &mut Bus, operand: Operand, value: u8) {
    bus.write(address(operand), value);
}

fn address(operand: Operand) -> u16 {
    match operand {
        Operand::Address(addr) => addr,
        other => unreachable!("instruction needs a memory operand, got {other:?}"),
    }
}

fn read_modify_write<F>(cpu: &mut CpuState, bus: &mut Bus, operand: Operand, transform: F)
where
    F: FnOnce(&mut CpuState, u8) -> u8,
{
    let result = match operand {
        Operand::Accumulator => {
            let a = cpu.a;
            let r = transform(cpu, a);
            cpu.a = r;
            r
        }
        Operand::Address(addr) => {
            let old = bus.read(addr);
            let r = transform(cpu, old);
            bus.write(addr, r);
            r
        }
        other => unreachable!("read-modify-write on {other:?}"),
    };
    cpu.update_zn(result);
}

fn add_with_carry(cpu: &mut CpuState, v: u8) {
    let a = cpu.a;
    let sum = a as u16 + v as u16 + cpu.carry() as u16;
    let result = sum as u8;
    cpu.assign_flag(CARRY, sum > 0xFF);
    cpu.assign_flag(OVERFLOW, (!(a ^ v) & (a ^ result) & 0x80) != 0);
    cpu.a = result;
    cpu.update_zn(result);
}

fn compare(cpu: &mut CpuState, reg: u8, v: u8) {
    cpu.assign_flag(CARRY, reg >= v);
    cpu.update_zn(reg.wrapping_sub(v));
}

/// Branches pay +1 cycle when taken and +1 more when the target is on
/// another page.
fn branch_condition(cpu: &CpuState, operation: Operation) -> bool {
    let (flag, want_set) = match operation {
        Operation::Bcc => (CARRY, false),
        Operation::Bcs => (CARRY, true),
        Operation::Bne => (ZERO, false),
        Operation::Beq => (ZERO, true),
        Operation::Bpl => (NEGATIVE, false),
        Operation::Bmi => (NEGATIVE, true),
        Operation::Bvc => (OVERFLOW, false),
        Operation::Bvs => (OVERFLOW, true),
        other => unreachable!("{other:?} is not a branch"),
    };
    cpu.is_flag_set(flag) == want_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::table::lookup;
    use crate::test_utils::bus_with_prg;

    /// Run the single instruction at $8000 and return (state, cycles).
    fn run(prg: &[u8], setup: impl FnOnce(&mut CpuState, &mut Bus)) -> (CpuState, Bus, u32) {
        let mut bus = bus_with_prg(prg);
        let mut cpu = CpuState {
            pc: 0x8000,
            ..CpuState::new()
        };
        setup(&mut cpu, &mut bus);
        let code = cpu.fetch_u8(&mut bus);
        let op = lookup(code).expect("documented opcode");
        let cycles = execute(&mut cpu, &mut bus, op);
        (cpu, bus, cycles)
    }

    #[test]
    fn adc_overflow_and_carry() {
        // ADC #$50 with A=$50 -> $A0, signed overflow
        let (cpu, _, _) = run(&[0x69, 0x50], |c, _| c.a = 0x50);
        assert_eq!(cpu.a, 0xA0);
        assert!(cpu.is_flag_set(OVERFLOW));
        assert!(!cpu.is_flag_set(CARRY));

        let (cpu, _, _) = run(&[0x69, 0x20], |c, _| c.a = 0xF0);
        assert_eq!(cpu.a, 0x10);
        assert!(cpu.is_flag_set(CARRY));
    }

    #[test]
    fn sbc_borrow_and_decimal_ignored() {
        let (cpu, _, _) = run(&[0xE9, 0x01], |c, _| {
            c.a = 0x10;
            c.status |= CARRY | DECIMAL;
        });
        assert_eq!(cpu.a, 0x0F);
        assert!(cpu.is_flag_set(CARRY));

        let (cpu, _, _) = run(&[0xE9, 0x01], |c, _| c.a = 0x00);
        // carry clear means borrow: 0 - 1 - 1
        assert_eq!(cpu.a, 0xFE);
        assert!(!cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(NEGATIVE));
    }

    #[test]
    fn compare_sets_carry_and_zero() {
        let (cpu, _, _) = run(&[0xC9, 0x40], |c, _| c.a = 0x40);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(ZERO));
        let (cpu, _, _) = run(&[0xE0, 0x41], |c, _| c.x = 0x40);
        assert!(!cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(NEGATIVE));
    }

    #[test]
    fn lda_absolute_x_page_penalty() {
        // LDA $02FF,X with X=1
        let (cpu, _, cycles) = run(&[0xBD, 0xFF, 0x02], |c, b| {
            c.x = 1;
            b.write(0x0300, 0x99);
        });
        assert_eq!(cpu.a, 0x99);
        assert_eq!(cycles, 5);

        let (_, _, cycles) = run(&[0xBD, 0x00, 0x02], |c, _| c.x = 1);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn sta_absolute_x_has_no_penalty() {
        let (_, mut bus, cycles) = run(&[0x9D, 0xFF, 0x02], |c, _| {
            c.x = 1;
            c.a = 0x5A;
        });
        assert_eq!(cycles, 5);
        assert_eq!(bus.peek(0x0300), 0x5A);
    }

    #[test]
    fn inc_memory_and_rotate_accumulator() {
        let (cpu, mut bus, cycles) = run(&[0xEE, 0x00, 0x02], |_, b| b.write(0x0200, 0xFF));
        assert_eq!(bus.peek(0x0200), 0x00);
        assert!(cpu.is_flag_set(ZERO));
        assert_eq!(cycles, 6);

        let (cpu, _, _) = run(&[0x2A], |c, _| c.a = 0x80);
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(ZERO));

        let (cpu, _, _) = run(&[0x6A], |c, _| {
            c.a = 0x01;
            c.status |= CARRY;
        });
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.is_flag_set(CARRY));
        assert!(cpu.is_flag_set(NEGATIVE));
    }

    #[test]
    fn branch_cycles() {
        // BNE +2, Z clear -> taken same page
        let (cpu, _, cycles) = run(&[0xD0, 0x02], |c, _| c.status &= !ZERO);
        assert_eq!(cpu.pc, 0x8004);
        assert_eq!(cycles, 3);

        // not taken
        let (cpu, _, cycles) = run(&[0xD0, 0x02], |c, _| c.status |= ZERO);
        assert_eq!(cpu.pc, 0x8002);
        assert_eq!(cycles, 2);

        // taken backwards across a page
        let (cpu, _, cycles) = run(&[0xF0, 0x80], |c, _| c.status |= ZERO);
        assert_eq!(cpu.pc, 0x7F82);
        assert_eq!(cycles, 4);
    }

    #[test]
    fn jsr_rts_round_trip() {
        let (cpu, mut bus, cycles) = run(&[0x20, 0x34, 0x92], |_, _| {});
        assert_eq!(cpu.pc, 0x9234);
        assert_eq!(cycles, 6);
        assert_eq!(bus.peek(0x01FD), 0x80);
        assert_eq!(bus.peek(0x01FC), 0x02);

        let mut cpu = cpu;
        let op = lookup(0x60).expect("RTS");
        execute(&mut cpu, &mut bus, op);
        assert_eq!(cpu.pc, 0x8003);
        assert_eq!(cpu.sp, 0xFD);
    }

    #[test]
    fn brk_pushes_pc_plus_two_with_break() {
        let (cpu, mut bus, cycles) = run(&[0x00, 0xFF], |c, _| c.status = CARRY);
        assert_eq!(cycles, 7);
        assert_eq!(cpu.pc, 0x8000); // IRQ vector of the test image
        assert!(cpu.is_flag_set(IRQ_DISABLE));
        assert_eq!(bus.peek(0x01FD), 0x80);
        assert_eq!(bus.peek(0x01FC), 0x02);
        assert_eq!(bus.peek(0x01FB), 0x31);
    }

    #[test]
    fn php_plp_break_handling() {
        let (cpu, mut bus, _) = run(&[0x08], |c, _| c.status = 0x00);
        assert_eq!(bus.peek(0x01FD), 0x30);
        let mut cpu = cpu;
        bus.write(0x01FD, 0xFF);
        execute(&mut cpu, &mut bus, lookup(0x28).expect("PLP"));
        assert_eq!(cpu.status, 0xEF);
    }
}
