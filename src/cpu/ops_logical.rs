//! Arithmetic, logic, shift/rotate, compare, and flag instruction handlers.

use super::{Cpu, Operand, StatusFlag};

/// Function: A:=A or {adr}
/// Flags: N Z
pub fn ora(cpu: &mut Cpu, operand: Operand) {
    cpu.a |= operand.read(cpu);
    cpu.compute_nz(cpu.a);
}

/// Function: A:=A and {adr}
/// Flags: N Z
pub fn and(cpu: &mut Cpu, operand: Operand) {
    cpu.a &= operand.read(cpu);
    cpu.compute_nz(cpu.a);
}

/// Function: A:=A xor {adr}
/// Flags: N Z
pub fn eor(cpu: &mut Cpu, operand: Operand) {
    cpu.a ^= operand.read(cpu);
    cpu.compute_nz(cpu.a);
}

/// Shared by ADC and SBC: both are `A + operand + C` in binary mode, SBC
/// feeding in the ones' complement of its operand. No BCD adjustment is
/// performed; the source this was distilled from computes in binary only
/// (see the design notes on decimal mode).
fn add_with_carry(cpu: &mut Cpu, operand: u8) {
    let carry_in = cpu.get_flag(StatusFlag::Carry) as u16;
    let a = cpu.a as u16;
    let m = operand as u16;
    let sum = a + m + carry_in;

    cpu.set_flag(StatusFlag::Carry, sum > 0xFF);
    let result = sum as u8;
    let overflow = (cpu.a ^ result) & (operand ^ result) & 0x80 != 0;
    cpu.set_flag(StatusFlag::Overflow, overflow);
    cpu.a = result;
    cpu.compute_nz(cpu.a);
}

/// Function: A:=A+{adr}
/// Flags: N V Z C
pub fn adc(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    add_with_carry(cpu, value);
}

/// Function: A:=A-{adr}
/// Flags: N V Z C
///
/// Implemented as `ADC(operand XOR 0xFF)`, which is exactly the binary-mode
/// subtraction with borrow folded into the existing carry machinery.
pub fn sbc(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    add_with_carry(cpu, !value);
}

fn compare(cpu: &mut Cpu, register: u8, operand: Operand) {
    let value = operand.read(cpu);
    let result = register.wrapping_sub(value);
    cpu.set_flag(StatusFlag::Carry, register >= value);
    cpu.set_flag(StatusFlag::Zero, register == value);
    cpu.set_flag(StatusFlag::Negative, result & 0x80 != 0);
}

/// Function: A-{adr}
/// Flags: N Z C
pub fn cmp(cpu: &mut Cpu, operand: Operand) {
    compare(cpu, cpu.a, operand);
}

/// Function: X-{adr}
/// Flags: N Z C
pub fn cpx(cpu: &mut Cpu, operand: Operand) {
    compare(cpu, cpu.x, operand);
}

/// Function: Y-{adr}
/// Flags: N Z C
pub fn cpy(cpu: &mut Cpu, operand: Operand) {
    compare(cpu, cpu.y, operand);
}

/// Function: {adr}:={adr}-1
/// Flags: N Z
pub fn dec(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu).wrapping_sub(1);
    operand.write(cpu, value);
    cpu.compute_nz(value);
}

/// Function: X:=X-1
/// Flags: N Z
pub fn dex(cpu: &mut Cpu) {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.compute_nz(cpu.x);
}

/// Function: Y:=Y-1
/// Flags: N Z
pub fn dey(cpu: &mut Cpu) {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.compute_nz(cpu.y);
}

/// Function: {adr}:={adr}+1
/// Flags: N Z
pub fn inc(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu).wrapping_add(1);
    operand.write(cpu, value);
    cpu.compute_nz(value);
}

/// Function: X:=X+1
/// Flags: N Z
pub fn inx(cpu: &mut Cpu) {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.compute_nz(cpu.x);
}

/// Function: Y:=Y+1
/// Flags: N Z
pub fn iny(cpu: &mut Cpu) {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.compute_nz(cpu.y);
}

/// Function: {adr}:={adr}*2
/// Flags: N Z C
pub fn asl(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    cpu.set_flag(StatusFlag::Carry, value & 0x80 != 0);
    let result = value << 1;
    operand.write(cpu, result);
    cpu.compute_nz(result);
}

/// Function: {adr}:={adr}/2
/// Flags: N Z C
pub fn lsr(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    cpu.set_flag(StatusFlag::Carry, value & 0x01 != 0);
    let result = value >> 1;
    operand.write(cpu, result);
    cpu.compute_nz(result);
}

/// Function: {adr}:={adr}*2+C
/// Flags: N Z C
pub fn rol(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    let carry_in = cpu.get_flag(StatusFlag::Carry) as u16;
    let shifted = ((value as u16) << 1) | carry_in;
    cpu.set_flag(StatusFlag::Carry, shifted & 0x100 != 0);
    let result = shifted as u8;
    operand.write(cpu, result);
    cpu.compute_nz(result);
}

/// Function: {adr}:={adr}/2+C*128
/// Flags: N Z C
pub fn ror(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    let carry_in = if cpu.get_flag(StatusFlag::Carry) { 0x100 } else { 0 };
    let combined = value as u16 | carry_in;
    cpu.set_flag(StatusFlag::Carry, combined & 0x01 != 0);
    let result = (combined >> 1) as u8;
    operand.write(cpu, result);
    cpu.compute_nz(result);
}

/// Function: N:=Bit 7 of {adr}, V:=Bit 6 of {adr}, Z:=((A and {adr})=0)
pub fn bit(cpu: &mut Cpu, operand: Operand) {
    let value = operand.read(cpu);
    cpu.set_flag(StatusFlag::Zero, cpu.a & value == 0);
    cpu.set_flag(StatusFlag::Negative, value & 0x80 != 0);
    cpu.set_flag(StatusFlag::Overflow, value & 0x40 != 0);
}

pub fn clc(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::Carry, false);
}

pub fn sec(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::Carry, true);
}

pub fn cld(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::Decimal, false);
}

pub fn sed(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::Decimal, true);
}

pub fn cli(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::InterruptDisable, false);
}

pub fn sei(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::InterruptDisable, true);
}

pub fn clv(cpu: &mut Cpu) {
    cpu.set_flag(StatusFlag::Overflow, false);
}

pub fn nop(_cpu: &mut Cpu) {
    // literally nothing to do
}

#[cfg(test)]
mod test {
    use super::super::test_support::cpu_with;
    use super::*;

    // http://www.6502.org/tutorials/vflag.html
    #[test]
    fn adc_1_plus_1() {
        let mut cpu = cpu_with(&[]);
        cpu.a = 1;
        adc(&mut cpu, Operand::Immediate(1));
        assert_eq!(cpu.a, 2);
        assert!(!cpu.get_flag(StatusFlag::Carry));
        assert!(!cpu.get_flag(StatusFlag::Overflow));
    }

    #[test]
    fn adc_127_plus_1_overflows_into_negative() {
        let mut cpu = cpu_with(&[]);
        cpu.a = 127;
        adc(&mut cpu, Operand::Immediate(1));
        assert_eq!(cpu.a, 128);
        assert!(!cpu.get_flag(StatusFlag::Carry));
        assert!(cpu.get_flag(StatusFlag::Overflow));
    }

    #[test]
    fn adc_neg128_plus_neg1_carries_and_overflows() {
        let mut cpu = cpu_with(&[]);
        cpu.a = 0x80; // -128
        adc(&mut cpu, Operand::Immediate(0xFF)); // -1
        assert_eq!(cpu.a, 0x7F);
        assert!(cpu.get_flag(StatusFlag::Carry));
        assert!(cpu.get_flag(StatusFlag::Overflow));
    }

    #[test]
    fn sbc_is_adc_of_the_ones_complement() {
        let mut cpu = cpu_with(&[]);
        cpu.a = 0x05;
        cpu.set_flag(StatusFlag::Carry, true); // no borrow
        sbc(&mut cpu, Operand::Immediate(0x03));
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.get_flag(StatusFlag::Carry));
    }

    #[test]
    fn cmp_sets_carry_when_register_is_greater_or_equal() {
        let mut cpu = cpu_with(&[]);
        cpu.a = 0x10;
        cmp(&mut cpu, Operand::Immediate(0x10));
        assert!(cpu.get_flag(StatusFlag::Carry));
        assert!(cpu.get_flag(StatusFlag::Zero));
    }

    #[test]
    fn ror_shifts_carry_in_and_out() {
        let mut cpu = cpu_with(&[]);
        cpu.a = 0x01;
        cpu.set_flag(StatusFlag::Carry, true);
        ror(&mut cpu, Operand::Accumulator);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.get_flag(StatusFlag::Carry));
    }

    #[test]
    fn dey_updates_y_not_x() {
        let mut cpu = cpu_with(&[]);
        cpu.x = 9;
        cpu.y = 0;
        dey(&mut cpu);
        assert_eq!(cpu.y, 0xFF);
        assert_eq!(cpu.x, 9);
    }
}
