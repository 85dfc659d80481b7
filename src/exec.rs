//! Execution semantics: apply a decoded [`Instr`] to [`State`].
//!
//! Shares the same derived-value helpers (`decode::i_type_simm`,
//! `decode::b_type_offset`, ...) that [`crate::disasm`] uses, so the
//! two can never disagree about how a sub-encoding's immediate is
//! formed.

use std::io::Write;

use crate::decode::{self, Instr};
use crate::state::{State, A0};

/// What the driver should do after one instruction retires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The instruction wrote PC directly (taken branch, `j`/`jal`,
    /// `jr`/`jalr`); the driver must not also advance it.
    PcWritten,
    /// The driver should advance PC by 2, the default.
    Advance,
    /// `ecall 3` was executed; the simulation should stop.
    Halt,
}

/// Environment-call service number that terminates the simulation.
pub const ECALL_HALT: u16 = 3;
const ECALL_PRINT_INT: u16 = 1;
const ECALL_PRINT_STRING: u16 = 5;

/// Apply `instr` (fetched at `state.pc`) to `state`, writing ecall
/// console output to `out`. Returns the outcome the driver acts on.
///
/// Unknown sub-encodings within a known opcode leave `state`
/// unchanged and continue, matching the disassembler's `Unknown ...`
/// labels; unrecognized opcodes cannot occur since opcode is 3 bits
/// wide and all eight values are format classes.
pub fn execute<W: Write>(instr: Instr, state: &mut State, out: &mut W) -> Outcome {
    match instr {
        Instr::R {
            funct4,
            rs2,
            rd_rs1,
            funct3,
        } => exec_r(state, funct3, funct4, rd_rs1, rs2),
        Instr::I {
            imm7,
            rd_rs1,
            funct3,
        } => exec_i(state, funct3, imm7, rd_rs1),
        Instr::B {
            imm_hi,
            rs2,
            rs1,
            funct3,
        } => exec_b(state, funct3, imm_hi, rs1, rs2),
        Instr::S {
            imm,
            rs2,
            rs1,
            funct3,
        } => exec_s(state, funct3, imm, rs1, rs2),
        Instr::L {
            imm,
            rs2,
            rd,
            funct3,
        } => exec_l(state, funct3, imm, rd, rs2),
        Instr::J {
            link,
            offset_hi,
            rd,
            offset_lo,
        } => exec_j(state, link, offset_hi, offset_lo, rd),
        Instr::U {
            auipc,
            imm_hi,
            rd,
            imm_lo,
        } => exec_u(state, auipc, imm_hi, imm_lo, rd),
        Instr::Sys { service } => exec_ecall(state, service, out),
    }
}

fn exec_r(state: &mut State, funct3: u8, funct4: u8, rd_rs1: u8, rs2: u8) -> Outcome {
    let a = state.registers.get(rd_rs1);
    let b = state.registers.get(rs2);
    match funct3 {
        0 => match funct4 {
            0 => {
                state.registers.set(rd_rs1, a.wrapping_add(b));
                Outcome::Advance
            }
            1 => {
                state.registers.set(rd_rs1, a.wrapping_sub(b));
                Outcome::Advance
            }
            4 => {
                state.pc = b;
                Outcome::PcWritten
            }
            8 => {
                let link = state.pc.wrapping_add(2);
                state.pc = b;
                state.registers.set(rd_rs1, link);
                Outcome::PcWritten
            }
            _ => Outcome::Advance,
        },
        1 => {
            state.registers.set(rd_rs1, ((a as i16) < (b as i16)) as u16);
            Outcome::Advance
        }
        2 => {
            state.registers.set(rd_rs1, (a < b) as u16);
            Outcome::Advance
        }
        3 => {
            let shamt = b & 0xF;
            match funct4 {
                2 => {
                    state.registers.set(rd_rs1, a << shamt);
                    Outcome::Advance
                }
                4 => {
                    state.registers.set(rd_rs1, a >> shamt);
                    Outcome::Advance
                }
                8 => {
                    state.registers.set(rd_rs1, ((a as i16) >> shamt) as u16);
                    Outcome::Advance
                }
                _ => Outcome::Advance,
            }
        }
        4 => {
            state.registers.set(rd_rs1, a | b);
            Outcome::Advance
        }
        5 => {
            state.registers.set(rd_rs1, a & b);
            Outcome::Advance
        }
        6 => {
            state.registers.set(rd_rs1, a ^ b);
            Outcome::Advance
        }
        7 => {
            state.registers.set(rd_rs1, b);
            Outcome::Advance
        }
        _ => Outcome::Advance,
    }
}

fn exec_i(state: &mut State, funct3: u8, imm7: u8, rd_rs1: u8) -> Outcome {
    let a = state.registers.get(rd_rs1);
    let regs = &mut state.registers;
    let simm = decode::i_type_simm(imm7);
    match funct3 {
        0 => regs.set(rd_rs1, a.wrapping_add(simm as u16)),
        1 => regs.set(rd_rs1, ((a as i16) < simm) as u16),
        2 => regs.set(rd_rs1, (a < (simm as u16)) as u16),
        3 => {
            let (shift_type, shamt) = decode::shift_fields(imm7);
            match shift_type {
                1 => regs.set(rd_rs1, a << shamt),
                2 => regs.set(rd_rs1, a >> shamt),
                4 => regs.set(rd_rs1, ((a as i16) >> shamt) as u16),
                _ => {}
            }
        }
        4 => regs.set(rd_rs1, a | (simm as u16)),
        5 => regs.set(rd_rs1, a & (simm as u16)),
        6 => regs.set(rd_rs1, a ^ (simm as u16)),
        7 => regs.set(rd_rs1, simm as u16),
        _ => {}
    }
    Outcome::Advance
}

fn exec_b(state: &mut State, funct3: u8, imm_hi: u8, rs1: u8, rs2: u8) -> Outcome {
    let a = state.registers.get(rs1);
    let b = state.registers.get(rs2);
    let taken = match funct3 {
        0 => a == b,
        1 => a != b,
        2 => a == 0,
        3 => a != 0,
        4 => (a as i16) < (b as i16),
        5 => (a as i16) >= (b as i16),
        6 => a < b,
        7 => a >= b,
        _ => false,
    };
    if taken {
        let offset = decode::b_type_offset(imm_hi);
        state.pc = state.pc.wrapping_add(offset as u16);
        Outcome::PcWritten
    } else {
        Outcome::Advance
    }
}

fn exec_s(state: &mut State, funct3: u8, imm: u8, rs1: u8, rs2: u8) -> Outcome {
    let base = state.registers.get(rs1);
    let addr = base.wrapping_add(imm as u16);
    let value = state.registers.get(rs2);
    match funct3 {
        0 => state.memory.write_byte(addr, value as u8),
        1 => state.memory.write_halfword(addr, value),
        _ => {}
    }
    Outcome::Advance
}

fn exec_l(state: &mut State, funct3: u8, imm: u8, rd: u8, rs2: u8) -> Outcome {
    let base = state.registers.get(rs2);
    let addr = base.wrapping_add(imm as u16);
    match funct3 {
        0 => {
            let byte = state.memory.read_byte(addr) as i8;
            state.registers.set(rd, byte as i16 as u16);
        }
        1 => {
            let word = state.memory.read_halfword(addr);
            state.registers.set(rd, word);
        }
        4 => {
            let byte = state.memory.read_byte(addr);
            state.registers.set(rd, byte as u16);
        }
        _ => {}
    }
    Outcome::Advance
}

fn exec_j(state: &mut State, link: bool, offset_hi: u8, offset_lo: u8, rd: u8) -> Outcome {
    let offset = decode::j_type_offset(offset_hi, offset_lo);
    if link {
        state.registers.set(rd, state.pc.wrapping_add(2));
    }
    state.pc = state.pc.wrapping_add(offset as u16);
    Outcome::PcWritten
}

fn exec_u(state: &mut State, auipc: bool, imm_hi: u8, imm_lo: u8, rd: u8) -> Outcome {
    let imm = decode::u_type_imm(imm_hi, imm_lo);
    if auipc {
        state.registers.set(rd, state.pc.wrapping_add(imm));
    } else {
        state.registers.set(rd, imm);
    }
    Outcome::Advance
}

fn exec_ecall<W: Write>(state: &mut State, service: u16, out: &mut W) -> Outcome {
    match service {
        ECALL_PRINT_INT => {
            let value = state.registers.get(A0) as i16;
            let _ = writeln!(out, "{value}");
            Outcome::Advance
        }
        ECALL_PRINT_STRING => {
            let mut addr = state.registers.get(A0);
            let mut s = String::new();
            loop {
                let byte = state.memory.read_byte(addr);
                if byte == 0 {
                    break;
                }
                s.push(byte as char);
                if addr == u16::MAX {
                    break;
                }
                addr = addr.wrapping_add(1);
            }
            let _ = writeln!(out, "{s}");
            Outcome::Advance
        }
        ECALL_HALT => Outcome::Halt,
        _ => Outcome::Advance,
    }
}
