//! Fetch-decode-execute loop with bounded termination.

use std::io::Write;

use tracing::warn;

use crate::decode::decode;
use crate::disasm::disassemble;
use crate::error::DriverStop;
use crate::exec::{execute, Outcome};
use crate::state::{State, MEM_SIZE};

/// Hard cap on retired instructions, guaranteeing termination on
/// non-terminating guest code.
pub const MAX_INSTRUCTIONS: u64 = 100_000;

/// Runs the fetch-decode-execute loop against `state`, writing the
/// per-instruction trace line and guest ecall output to `trace_out`.
/// Returns the reason the loop stopped; this is never itself an
/// error -- every stop condition is a graceful one.
pub fn run<W: Write>(state: &mut State, trace_out: &mut W) -> DriverStop {
    let mut retired: u64 = 0;
    loop {
        if (state.pc as usize) + 1 >= MEM_SIZE {
            let stop = DriverStop::EndOfMemory { pc: state.pc };
            warn!("{stop}");
            return stop;
        }

        let word = state.memory.read_halfword(state.pc);
        if word == 0 {
            let stop = DriverStop::ZeroInstruction { pc: state.pc };
            warn!("{stop}");
            return stop;
        }

        let instr = decode(word);
        let text = disassemble(instr, state.pc);
        let _ = writeln!(trace_out, "0x{:04X}: {word:04X} {text}", state.pc);

        let pc_before = state.pc;
        match execute(instr, state, trace_out) {
            Outcome::Halt => {
                // Guest halt is reported on stdout by the caller, not
                // logged as a diagnostic here.
                return DriverStop::Ecall3;
            }
            Outcome::PcWritten => {}
            Outcome::Advance => {
                state.pc = pc_before.wrapping_add(2);
            }
        }

        retired += 1;
        if retired >= MAX_INSTRUCTIONS {
            let stop = DriverStop::InstructionCap {
                limit: MAX_INSTRUCTIONS,
            };
            warn!("{stop}");
            return stop;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_i(imm7: u8, rd_rs1: u8, funct3: u8) -> u16 {
        ((imm7 as u16) << 9) | ((rd_rs1 as u16) << 6) | ((funct3 as u16) << 3) | 1
    }

    fn word_sys(service: u16) -> u16 {
        (service << 6) | 7
    }

    #[test]
    fn zero_instruction_halts_gracefully() {
        let mut state = State::new();
        // memory already all zero
        let mut out = Vec::new();
        let stop = run(&mut state, &mut out);
        assert_eq!(stop, DriverStop::ZeroInstruction { pc: 0 });
    }

    #[test]
    fn li_then_ecall_print_int() {
        let mut state = State::new();
        let li_a0_42 = word_i(42, 6, 7); // li a0, 42
        state.memory.write_halfword(0, li_a0_42);
        state.memory.write_halfword(2, word_sys(1)); // ecall 1
        state.memory.write_halfword(4, word_sys(3)); // ecall 3 (halt)
        let mut out = Vec::new();
        let stop = run(&mut state, &mut out);
        assert_eq!(stop, DriverStop::Ecall3);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n42\n"), "output was: {text}");
    }

    #[test]
    fn instruction_cap_is_enforced_on_backward_jump_to_self() {
        let mut state = State::new();
        // j 0 at address 0: opcode=5, link=0, offset_hi=0, rd=0, offset_lo=0
        state.memory.write_halfword(0, 5);
        let mut out = Vec::new();
        let stop = run(&mut state, &mut out);
        assert_eq!(
            stop,
            DriverStop::InstructionCap {
                limit: MAX_INSTRUCTIONS
            }
        );
    }

    #[test]
    fn end_of_memory_detected_before_fetch() {
        let mut state = State::new();
        state.pc = (MEM_SIZE - 1) as u16;
        let mut out = Vec::new();
        let stop = run(&mut state, &mut out);
        assert_eq!(
            stop,
            DriverStop::EndOfMemory {
                pc: (MEM_SIZE - 1) as u16
            }
        );
    }
}
