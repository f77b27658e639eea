//! Load/store, register transfer, and stack instruction handlers.

use super::{Cpu, Operand};

/// Function: A:={adr}
/// Flags: N Z
pub fn lda(cpu: &mut Cpu, operand: Operand) {
    cpu.a = operand.read(cpu);
    cpu.compute_nz(cpu.a);
}

/// Function: X:={adr}
/// Flags: N Z
pub fn ldx(cpu: &mut Cpu, operand: Operand) {
    cpu.x = operand.read(cpu);
    cpu.compute_nz(cpu.x);
}

/// Function: Y:={adr}
/// Flags: N Z
pub fn ldy(cpu: &mut Cpu, operand: Operand) {
    cpu.y = operand.read(cpu);
    cpu.compute_nz(cpu.y);
}

/// Function: {adr}:=A
pub fn sta(cpu: &mut Cpu, operand: Operand) {
    operand.write(cpu, cpu.a);
}

/// Function: {adr}:=X
pub fn stx(cpu: &mut Cpu, operand: Operand) {
    operand.write(cpu, cpu.x);
}

/// Function: {adr}:=Y
pub fn sty(cpu: &mut Cpu, operand: Operand) {
    operand.write(cpu, cpu.y);
}

/// Function: X:=A
/// Flags: N Z
pub fn tax(cpu: &mut Cpu) {
    cpu.x = cpu.a;
    cpu.compute_nz(cpu.x);
}

/// Function: A:=X
/// Flags: N Z
pub fn txa(cpu: &mut Cpu) {
    cpu.a = cpu.x;
    cpu.compute_nz(cpu.a);
}

/// Function: Y:=A
/// Flags: N Z
pub fn tay(cpu: &mut Cpu) {
    cpu.y = cpu.a;
    cpu.compute_nz(cpu.y);
}

/// Function: A:=Y
/// Flags: N Z
pub fn tya(cpu: &mut Cpu) {
    cpu.a = cpu.y;
    cpu.compute_nz(cpu.a);
}

/// Function: X:=SP
/// Flags: N Z
pub fn tsx(cpu: &mut Cpu) {
    cpu.x = cpu.sp;
    cpu.compute_nz(cpu.x);
}

/// Function: SP:=X
pub fn txs(cpu: &mut Cpu) {
    cpu.sp = cpu.x;
}

/// Function: {sp}:=A
pub fn pha(cpu: &mut Cpu) {
    cpu.push_u8(cpu.a);
}

/// Function: A:={sp}
/// Flags: N Z
pub fn pla(cpu: &mut Cpu) {
    cpu.a = cpu.pull_u8();
    cpu.compute_nz(cpu.a);
}

/// Function: {sp}:=P, with B and bit 5 forced to 1.
pub fn php(cpu: &mut Cpu) {
    cpu.push_status();
}

/// Function: P:={sp}
///
/// B and the unused bit are architectural phantoms of the pushed byte;
/// they aren't stored back into the live flag register.
pub fn plp(cpu: &mut Cpu) {
    use super::StatusFlag;
    let pulled = cpu.pull_u8();
    cpu.p = pulled & !(StatusFlag::Break as u8 | StatusFlag::Unused as u8);
}

#[cfg(test)]
mod test {
    use crate::cpu::test_support::cpu_with;

    #[test]
    fn plp_does_not_store_break_or_unused_bits() {
        let mut cpu = cpu_with(&[]);
        cpu.push_u8(0xFF);
        super::plp(&mut cpu);
        assert_eq!(cpu.p & 0b0011_0000, 0);
    }
}
