//! The fetch/decode/execute loop, the register file, and the run-level
//! state machine that drives interrupt delivery.

mod ops_jump;
mod ops_logical;
mod ops_move;

use crate::constants::{InterruptVector, STACK_PAGE};
use crate::memory::SharedMemory;
use crate::opcodes::{decode, Mnemonic, Mode};

/// Bits of the processor status register `P`. Bit 5 is unused and always
/// reads as 1; `Break` only ever exists in a value pushed to the stack, not
/// in the live register (see [`Cpu::push_status`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusFlag {
    Carry = 0b0000_0001,
    Zero = 0b0000_0010,
    InterruptDisable = 0b0000_0100,
    Decimal = 0b0000_1000,
    Break = 0b0001_0000,
    Unused = 0b0010_0000,
    Overflow = 0b0100_0000,
    Negative = 0b1000_0000,
}

/// Flags set on reset: interrupts disabled, the unused bit, nothing else.
const RESET_STATUS: u8 = StatusFlag::InterruptDisable as u8 | StatusFlag::Unused as u8;

/// Priority order for pending interrupt/reset requests. `Program` is the
/// default continuous-run level; `SingleStep` exits the loop after one
/// instruction. Ordering matters: a request only overrides the current
/// run level if it ranks higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunLevel {
    Program = 0,
    SingleStep = 1,
    Irq = 2,
    Nmi = 3,
    Reset = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Stopping,
    Stopped,
    Halting,
    Halted,
}

/// The effective operand an addressing mode resolved to: a place a
/// semantic handler can read from and, for read-modify-write instructions,
/// write back to.
#[derive(Debug, Clone, Copy)]
pub enum Operand {
    /// Implied-mode instructions operate on registers directly and never
    /// touch this handle.
    None,
    Accumulator,
    Immediate(u8),
    Memory(u16),
}

impl Operand {
    fn read(self, cpu: &Cpu) -> u8 {
        match self {
            Operand::None => unreachable!("implied-mode instructions don't read an operand"),
            Operand::Accumulator => cpu.a,
            Operand::Immediate(v) => v,
            Operand::Memory(addr) => cpu.read_u8(addr),
        }
    }

    fn write(self, cpu: &mut Cpu, value: u8) {
        match self {
            Operand::Accumulator => cpu.a = value,
            Operand::Memory(addr) => cpu.write_u8(addr, value),
            Operand::None | Operand::Immediate(_) => {
                unreachable!("this addressing mode never writes back")
            }
        }
    }
}

pub struct Cpu {
    pub memory: SharedMemory,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,
    pub cycles: u64,
    pub state: ExecutionState,
    pub run_level: RunLevel,
    op8: u8,
    op16: u16,
    page_boundary_crossed: bool,
}

impl Cpu {
    pub fn new(memory: SharedMemory) -> Self {
        let mut cpu = Cpu {
            memory,
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0,
            p: 0,
            cycles: 0,
            state: ExecutionState::Idle,
            run_level: RunLevel::Program,
            op8: 0,
            op16: 0,
            page_boundary_crossed: false,
        };
        cpu.reset();
        cpu
    }

    #[inline]
    pub fn read_u8(&self, address: u16) -> u8 {
        self.memory.borrow().read_u8(address)
    }

    #[inline]
    pub fn write_u8(&mut self, address: u16, value: u8) {
        self.memory.borrow_mut().write_u8(address, value);
    }

    #[inline]
    pub fn read_u16(&self, address: u16) -> u16 {
        self.memory.borrow().read_u16(address)
    }

    pub fn get_flag(&self, flag: StatusFlag) -> bool {
        self.p & flag as u8 != 0
    }

    pub fn set_flag(&mut self, flag: StatusFlag, value: bool) {
        if value {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    /// Z and N both derive from the same byte on almost every instruction.
    pub fn compute_nz(&mut self, value: u8) {
        self.set_flag(StatusFlag::Zero, value == 0);
        self.set_flag(StatusFlag::Negative, value & 0x80 != 0);
    }

    pub fn push_u8(&mut self, value: u8) {
        let address = STACK_PAGE | self.sp as u16;
        self.write_u8(address, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub fn pull_u8(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let address = STACK_PAGE | self.sp as u16;
        self.read_u8(address)
    }

    pub fn push_u16(&mut self, value: u16) {
        self.push_u8((value >> 8) as u8);
        self.push_u8(value as u8);
    }

    pub fn pull_u16(&mut self) -> u16 {
        let lo = self.pull_u8() as u16;
        let hi = self.pull_u8() as u16;
        lo | (hi << 8)
    }

    /// Pushes P with bit 5 and Break forced to 1, per the architected
    /// convention for PHP/BRK/IRQ/NMI.
    fn push_status(&mut self) {
        let value = self.p | StatusFlag::Break as u8 | StatusFlag::Unused as u8;
        self.push_u8(value);
    }

    fn resolve_operand(&mut self, mode: Mode) -> Operand {
        self.page_boundary_crossed = false;
        match mode {
            Mode::Implied => Operand::None,
            Mode::Accumulator => Operand::Accumulator,
            Mode::Immediate => Operand::Immediate(self.op8),
            Mode::Relative => {
                let displacement = self.op8 as i8 as i16;
                Operand::Memory(self.pc.wrapping_add(displacement as u16))
            }
            Mode::ZeroPage => Operand::Memory(self.op8 as u16),
            Mode::ZeroPageX => Operand::Memory(self.op8.wrapping_add(self.x) as u16),
            Mode::ZeroPageY => Operand::Memory(self.op8.wrapping_add(self.y) as u16),
            Mode::Absolute => Operand::Memory(self.op16),
            Mode::AbsoluteX => {
                let effective = self.op16.wrapping_add(self.x as u16);
                self.page_boundary_crossed = (self.op16 & 0xFF00) != (effective & 0xFF00);
                Operand::Memory(effective)
            }
            Mode::AbsoluteY => {
                let effective = self.op16.wrapping_add(self.y as u16);
                self.page_boundary_crossed = (self.op16 & 0xFF00) != (effective & 0xFF00);
                Operand::Memory(effective)
            }
            // The classic hardware page-wrap bug at indirect vectors whose low
            // byte is $FF is not reproduced: this is a straight 16-bit read.
            Mode::Indirect => Operand::Memory(self.read_u16(self.op16)),
            Mode::IndexedIndirectX => {
                let pointer = self.op8.wrapping_add(self.x) as u16;
                Operand::Memory(self.read_u16(pointer))
            }
            Mode::IndirectIndexedY => {
                let base = self.read_u16(self.op8 as u16);
                let effective = base.wrapping_add(self.y as u16);
                self.page_boundary_crossed = (base & 0xFF00) != (effective & 0xFF00);
                Operand::Memory(effective)
            }
        }
    }

    fn dispatch(&mut self, mnemonic: Mnemonic, operand: Operand) {
        use Mnemonic::*;
        match mnemonic {
            LDA => ops_move::lda(self, operand),
            LDX => ops_move::ldx(self, operand),
            LDY => ops_move::ldy(self, operand),
            STA => ops_move::sta(self, operand),
            STX => ops_move::stx(self, operand),
            STY => ops_move::sty(self, operand),
            TAX => ops_move::tax(self),
            TXA => ops_move::txa(self),
            TAY => ops_move::tay(self),
            TYA => ops_move::tya(self),
            TSX => ops_move::tsx(self),
            TXS => ops_move::txs(self),
            PHA => ops_move::pha(self),
            PLA => ops_move::pla(self),
            PHP => ops_move::php(self),
            PLP => ops_move::plp(self),

            ORA => ops_logical::ora(self, operand),
            AND => ops_logical::and(self, operand),
            EOR => ops_logical::eor(self, operand),
            ADC => ops_logical::adc(self, operand),
            SBC => ops_logical::sbc(self, operand),
            CMP => ops_logical::cmp(self, operand),
            CPX => ops_logical::cpx(self, operand),
            CPY => ops_logical::cpy(self, operand),
            DEC => ops_logical::dec(self, operand),
            DEX => ops_logical::dex(self),
            DEY => ops_logical::dey(self),
            INC => ops_logical::inc(self, operand),
            INX => ops_logical::inx(self),
            INY => ops_logical::iny(self),
            ASL => ops_logical::asl(self, operand),
            LSR => ops_logical::lsr(self, operand),
            ROL => ops_logical::rol(self, operand),
            ROR => ops_logical::ror(self, operand),
            BIT => ops_logical::bit(self, operand),
            CLC => ops_logical::clc(self),
            SEC => ops_logical::sec(self),
            CLD => ops_logical::cld(self),
            SED => ops_logical::sed(self),
            CLI => ops_logical::cli(self),
            SEI => ops_logical::sei(self),
            CLV => ops_logical::clv(self),
            NOP => ops_logical::nop(self),

            BCC => ops_jump::bcc(self, operand),
            BCS => ops_jump::bcs(self, operand),
            BEQ => ops_jump::beq(self, operand),
            BMI => ops_jump::bmi(self, operand),
            BNE => ops_jump::bne(self, operand),
            BPL => ops_jump::bpl(self, operand),
            BVC => ops_jump::bvc(self, operand),
            BVS => ops_jump::bvs(self, operand),
            JMP => ops_jump::jmp(self, operand),
            JSR => ops_jump::jsr(self, operand),
            RTS => ops_jump::rts(self),
            RTI => ops_jump::rti(self),
            BRK => ops_jump::brk(self),
        }
    }

    /// Rewinds PC back onto the offending byte and halts. This is the fate
    /// of any opcode not in the 151-entry legal table.
    fn halt(&mut self) {
        self.pc = self.pc.wrapping_sub(1);
        self.state = ExecutionState::Halted;
    }

    /// Executes exactly one instruction (or halts), honoring a pending
    /// run-level request at the end. Does not touch `state`; callers that
    /// want the Idle/Running bookkeeping should go through [`Cpu::execute`].
    fn tick(&mut self) {
        let pc = self.pc;
        let opcode = self.read_u8(pc);
        match decode(opcode) {
            Some(ins) => {
                self.op8 = self.read_u8(pc.wrapping_add(1));
                self.op16 = self.read_u16(pc.wrapping_add(1));
                self.pc = pc.wrapping_add(ins.size as u16);
                self.cycles += ins.base_cycles as u64;

                let operand = self.resolve_operand(ins.mode);
                if ins.page_penalty && self.page_boundary_crossed {
                    self.cycles += 1;
                }

                log::trace!(
                    "{:#06X}: {:?} {:?} -> a={:#04X} x={:#04X} y={:#04X} p={:#010b}",
                    pc,
                    ins.mnemonic,
                    ins.mode,
                    self.a,
                    self.x,
                    self.y,
                    self.p
                );

                self.dispatch(ins.mnemonic, operand);
            }
            None => {
                log::debug!("halt: no legal instruction at opcode {:#04X}", opcode);
                self.halt();
            }
        }

        match self.run_level {
            RunLevel::Program | RunLevel::SingleStep => {}
            RunLevel::Reset => self.reset(),
            RunLevel::Nmi => self.nmi(),
            RunLevel::Irq => {
                if !self.get_flag(StatusFlag::InterruptDisable) {
                    self.irq();
                } else {
                    self.run_level = RunLevel::Program;
                }
            }
        }
    }

    /// Runs until the CPU stops being `Running`: either a single step
    /// completes, `stop_execution` was requested, or the halt sentinel
    /// fires on an illegal opcode.
    pub fn execute(&mut self, continuous: bool) {
        self.state = ExecutionState::Running;
        self.run_level = if continuous {
            RunLevel::Program
        } else {
            RunLevel::SingleStep
        };

        while self.state == ExecutionState::Running {
            self.tick();
            if self.run_level == RunLevel::SingleStep {
                break;
            }
        }

        self.state = match self.state {
            ExecutionState::Running => ExecutionState::Idle,
            ExecutionState::Stopping => ExecutionState::Stopped,
            ExecutionState::Halting => ExecutionState::Halted,
            other => other,
        };
    }

    /// Runs continuously until halted or stopped, or until `max_cycles`
    /// cycles have retired — whichever comes first. Convenient for tests
    /// that want a hard ceiling instead of relying on the program to halt
    /// itself.
    pub fn run_until(&mut self, max_cycles: u64) {
        self.state = ExecutionState::Running;
        self.run_level = RunLevel::Program;

        while self.state == ExecutionState::Running && self.cycles < max_cycles {
            self.tick();
        }

        self.state = match self.state {
            ExecutionState::Running => ExecutionState::Idle,
            ExecutionState::Stopping => ExecutionState::Stopped,
            ExecutionState::Halting => ExecutionState::Halted,
            other => other,
        };
    }

    fn running(&self) -> bool {
        self.state == ExecutionState::Running
    }

    /// A request, not a preemption: the running loop drains the current
    /// instruction and only then honors it.
    pub fn stop_execution(&mut self) {
        if self.state == ExecutionState::Running {
            self.state = ExecutionState::Stopping;
        }
    }

    pub fn trigger_reset(&mut self) {
        if self.run_level < RunLevel::Reset {
            if self.running() {
                self.run_level = RunLevel::Reset;
            } else {
                self.reset();
            }
        }
    }

    pub fn trigger_nmi(&mut self) {
        if self.run_level < RunLevel::Nmi {
            if self.running() {
                self.run_level = RunLevel::Nmi;
            } else {
                self.nmi();
            }
        }
    }

    /// Gated by the live I flag, read at service time rather than at the
    /// moment the caller made the request: when the CPU is running, the
    /// flag is rechecked by `tick` right before `irq` would run, so a
    /// `SEI` between this call and the next tick suppresses the interrupt.
    pub fn trigger_irq(&mut self) {
        if self.run_level < RunLevel::Irq {
            if self.running() {
                self.run_level = RunLevel::Irq;
            } else if !self.get_flag(StatusFlag::InterruptDisable) {
                self.irq();
            }
        }
    }

    fn irq(&mut self) {
        self.push_u16(self.pc);
        let status = self.p;
        self.push_u8(status);
        self.set_flag(StatusFlag::InterruptDisable, true);
        self.pc = self.read_u16(InterruptVector::IrqBrk.address());
        self.run_level = RunLevel::Program;
    }

    fn nmi(&mut self) {
        self.push_u16(self.pc);
        let status = self.p;
        self.push_u8(status);
        self.set_flag(StatusFlag::InterruptDisable, true);
        self.pc = self.read_u16(InterruptVector::Nmi.address());
        self.run_level = RunLevel::Program;
    }

    pub fn reset(&mut self) {
        self.pc = self.read_u16(InterruptVector::Reset.address());
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.p = RESET_STATUS;
        self.cycles = 0;
        self.run_level = RunLevel::Program;
        log::info!("reset: pc={:#06X}", self.pc);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Cpu;
    use crate::memory::Memory;

    /// Loads `program` at `$0200` and points the reset vector at it, the
    /// way the teacher's own `run_program` test helper does.
    pub(crate) fn cpu_with(program: &[u8]) -> Cpu {
        let memory = Memory::new_shared();
        memory.borrow_mut().write_slice(0x0200, program);
        memory.borrow_mut().write_u16(0xFFFC, 0x0200);
        Cpu::new(memory)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_support::cpu_with;

    #[test]
    fn reset_reads_the_reset_vector() {
        let memory = Memory::new_shared();
        memory.borrow_mut().write_u16(0xFFFC, 0x8000);
        let cpu = Cpu::new(memory);
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.a, 0);
        assert_eq!(cpu.x, 0);
        assert_eq!(cpu.y, 0);
        assert_eq!(cpu.sp, 0xFD);
        assert!(cpu.get_flag(StatusFlag::InterruptDisable));
        assert!(!cpu.get_flag(StatusFlag::Carry));
    }

    #[test]
    fn adc_then_halt_scenario() {
        // LDA #$05; ADC #$03; BRK (spec scenario: A9 05 69 03 00)
        let mut cpu = cpu_with(&[0xA9, 0x05, 0x69, 0x03, 0x00]);
        cpu.execute(false); // LDA
        cpu.execute(false); // ADC
        assert_eq!(cpu.a, 0x08);
        assert!(!cpu.get_flag(StatusFlag::Carry));
        assert!(!cpu.get_flag(StatusFlag::Zero));
        assert!(!cpu.get_flag(StatusFlag::Negative));
        assert_eq!(cpu.pc, 0x0204);
    }

    #[test]
    fn lda_zero_page_x_scenario() {
        let mut cpu = cpu_with(&[0xB5, 0x00, 0x00]);
        cpu.x = 0x05;
        cpu.write_u8(0x05, 0x42);
        cpu.run_until(1000);
        assert_eq!(cpu.a, 0x42);
        assert!(!cpu.get_flag(StatusFlag::Zero));
        assert!(!cpu.get_flag(StatusFlag::Negative));
    }

    #[test]
    fn pha_pla_round_trips_and_preserves_sp() {
        let mut cpu = cpu_with(&[]);
        let sp_before = cpu.sp;
        cpu.a = 0x99;
        ops_move::pha(&mut cpu);
        cpu.a = 0;
        ops_move::pla(&mut cpu);
        assert_eq!(cpu.a, 0x99);
        assert_eq!(cpu.sp, sp_before);
    }

    #[test]
    fn push_word_pull_word_round_trips() {
        let mut cpu = cpu_with(&[]);
        cpu.push_u16(0xBEEF);
        assert_eq!(cpu.pull_u16(), 0xBEEF);
    }

    #[test]
    fn unknown_opcode_halts_with_pc_rewound() {
        let mut cpu = cpu_with(&[0x02]); // not a legal opcode
        cpu.run_until(1000);
        assert_eq!(cpu.state, ExecutionState::Halted);
        assert_eq!(cpu.pc, 0x0200);
    }

    #[test]
    fn irq_is_gated_by_interrupt_disable_flag() {
        let mut cpu = cpu_with(&[]);
        cpu.write_u16(0xFFFE, 0x9000);
        cpu.set_flag(StatusFlag::InterruptDisable, true);
        cpu.trigger_irq();
        assert_ne!(cpu.pc, 0x9000);

        cpu.set_flag(StatusFlag::InterruptDisable, false);
        cpu.trigger_irq();
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.get_flag(StatusFlag::InterruptDisable));
    }

    #[test]
    fn irq_queued_while_running_is_suppressed_by_a_later_sei_before_service() {
        let mut cpu = cpu_with(&[0xEA]); // NOP
        cpu.write_u16(0xFFFE, 0x9000);
        cpu.state = ExecutionState::Running;
        cpu.trigger_irq();
        assert_eq!(cpu.run_level, RunLevel::Irq);

        cpu.set_flag(StatusFlag::InterruptDisable, true);
        cpu.tick();

        assert_ne!(cpu.pc, 0x9000);
        assert_eq!(cpu.run_level, RunLevel::Program);
    }
}
