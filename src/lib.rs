//! A MOS 6502 CPU emulator and two-pass assembler sharing one flat 64 KiB
//! address space.

pub mod asm;
pub mod constants;
pub mod cpu;
pub mod disassembler;
pub mod memory;
pub mod opcodes;

pub use asm::{AssembleError, Assembler};
pub use cpu::Cpu;
pub use disassembler::Disassembler;
pub use memory::{Memory, SharedMemory};
