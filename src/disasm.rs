//! Disassembly: render a decoded [`Instr`] as its canonical assembly
//! text.

use crate::decode::{self, Instr};
use crate::state::Registers;

fn reg(index: u8) -> &'static str {
    Registers::name(index)
}

/// Render `instr` (fetched at `pc`) as a single ASCII disassembly
/// line, with no trailing newline.
pub fn disassemble(instr: Instr, pc: u16) -> String {
    match instr {
        Instr::R {
            funct4,
            rs2,
            rd_rs1,
            funct3,
        } => disassemble_r(funct3, funct4, rd_rs1, rs2),
        Instr::I {
            imm7,
            rd_rs1,
            funct3,
        } => disassemble_i(funct3, imm7, rd_rs1),
        Instr::B {
            imm_hi,
            rs2,
            rs1,
            funct3,
        } => disassemble_b(funct3, imm_hi, rs1, rs2, pc),
        Instr::S {
            imm,
            rs2,
            rs1,
            funct3,
        } => disassemble_s(funct3, imm, rs1, rs2),
        Instr::L {
            imm,
            rs2,
            rd,
            funct3,
        } => disassemble_l(funct3, imm, rd, rs2),
        Instr::J {
            link,
            offset_hi,
            rd,
            offset_lo,
        } => disassemble_j(link, offset_hi, offset_lo, rd, pc),
        Instr::U {
            auipc,
            imm_hi,
            rd,
            imm_lo,
        } => disassemble_u(auipc, imm_hi, imm_lo, rd),
        Instr::Sys { service } => format!("ecall {service}"),
    }
}

fn disassemble_r(funct3: u8, funct4: u8, rd_rs1: u8, rs2: u8) -> String {
    let (rd_rs1_name, rs2_name) = (reg(rd_rs1), reg(rs2));
    match funct3 {
        0 => match funct4 {
            0 => format!("add {rd_rs1_name}, {rs2_name}"),
            1 => format!("sub {rd_rs1_name}, {rs2_name}"),
            4 => format!("jr {rs2_name}"),
            8 => format!("jalr {rs2_name}"),
            _ => "Unknown R-type".to_string(),
        },
        1 => format!("slt {rd_rs1_name}, {rs2_name}"),
        2 => format!("sltu {rd_rs1_name}, {rs2_name}"),
        3 => match funct4 {
            2 => format!("sll {rd_rs1_name}, {rs2_name}"),
            4 => format!("srl {rd_rs1_name}, {rs2_name}"),
            8 => format!("sra {rd_rs1_name}, {rs2_name}"),
            _ => "Unknown shift".to_string(),
        },
        4 => format!("or {rd_rs1_name}, {rs2_name}"),
        5 => format!("and {rd_rs1_name}, {rs2_name}"),
        6 => format!("xor {rd_rs1_name}, {rs2_name}"),
        7 => format!("mv {rd_rs1_name}, {rs2_name}"),
        _ => "Unknown R-type".to_string(),
    }
}

fn disassemble_i(funct3: u8, imm7: u8, rd_rs1: u8) -> String {
    let rd_rs1_name = reg(rd_rs1);
    let simm = decode::i_type_simm(imm7);
    match funct3 {
        0 => format!("addi {rd_rs1_name}, {simm}"),
        1 => format!("slti {rd_rs1_name}, {simm}"),
        2 => format!("sltui {rd_rs1_name}, {simm}"),
        3 => {
            let (shift_type, shamt) = decode::shift_fields(imm7);
            match shift_type {
                1 => format!("slli {rd_rs1_name}, {shamt}"),
                2 => format!("srli {rd_rs1_name}, {shamt}"),
                4 => format!("srai {rd_rs1_name}, {shamt}"),
                _ => "Unknown shift immediate".to_string(),
            }
        }
        4 => format!("ori {rd_rs1_name}, {simm}"),
        5 => format!("andi {rd_rs1_name}, {simm}"),
        6 => format!("xori {rd_rs1_name}, {simm}"),
        7 => format!("li {rd_rs1_name}, {simm}"),
        _ => "Unknown I-type".to_string(),
    }
}

fn disassemble_b(funct3: u8, imm_hi: u8, rs1: u8, rs2: u8, pc: u16) -> String {
    let rs1_name = reg(rs1);
    let rs2_name = reg(rs2);
    let target = pc.wrapping_add(decode::b_type_offset(imm_hi) as u16);
    match funct3 {
        0 => format!("beq {rs1_name}, {rs2_name}, 0x{target:04X}"),
        1 => format!("bne {rs1_name}, {rs2_name}, 0x{target:04X}"),
        2 => format!("bz {rs1_name}, 0x{target:04X}"),
        3 => format!("bnz {rs1_name}, 0x{target:04X}"),
        4 => format!("blt {rs1_name}, {rs2_name}, 0x{target:04X}"),
        5 => format!("bge {rs1_name}, {rs2_name}, 0x{target:04X}"),
        6 => format!("bltu {rs1_name}, {rs2_name}, 0x{target:04X}"),
        7 => format!("bgeu {rs1_name}, {rs2_name}, 0x{target:04X}"),
        _ => "Unknown B-type".to_string(),
    }
}

fn disassemble_s(funct3: u8, imm: u8, rs1: u8, rs2: u8) -> String {
    let rs1_name = reg(rs1);
    let rs2_name = reg(rs2);
    match funct3 {
        0 => format!("sb {rs2_name}, {imm}({rs1_name})"),
        1 => format!("sw {rs2_name}, {imm}({rs1_name})"),
        _ => "Unknown S-type".to_string(),
    }
}

fn disassemble_l(funct3: u8, imm: u8, rd: u8, rs2: u8) -> String {
    let rd_name = reg(rd);
    let rs2_name = reg(rs2);
    match funct3 {
        0 => format!("lb {rd_name}, {imm}({rs2_name})"),
        1 => format!("lw {rd_name}, {imm}({rs2_name})"),
        4 => format!("lbu {rd_name}, {imm}({rs2_name})"),
        _ => "Unknown L-type".to_string(),
    }
}

fn disassemble_j(link: bool, offset_hi: u8, offset_lo: u8, rd: u8, pc: u16) -> String {
    let target = pc.wrapping_add(decode::j_type_offset(offset_hi, offset_lo) as u16);
    if link {
        format!("jal {}, 0x{target:04X}", reg(rd))
    } else {
        format!("j 0x{target:04X}")
    }
}

fn disassemble_u(auipc: bool, imm_hi: u8, imm_lo: u8, rd: u8) -> String {
    let imm = decode::u_type_imm(imm_hi, imm_lo);
    let rd_name = reg(rd);
    if auipc {
        format!("auipc {rd_name}, 0x{imm:04X}")
    } else {
        format!("lui {rd_name}, 0x{imm:04X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode;

    fn word_r(funct4: u8, rs2: u8, rd_rs1: u8, funct3: u8) -> u16 {
        ((funct4 as u16) << 12) | ((rs2 as u16) << 9) | ((rd_rs1 as u16) << 6) | ((funct3 as u16) << 3)
    }

    #[test]
    fn add_disassembles_two_operand() {
        let word = word_r(0, 6, 1, 0); // add ra, a0
        assert_eq!(disassemble(decode(word), 0), "add ra, a0");
    }

    #[test]
    fn jr_is_unary() {
        let word = word_r(4, 6, 1, 0);
        assert_eq!(disassemble(decode(word), 0), "jr a0");
    }

    #[test]
    fn unknown_r_subencoding() {
        let word = word_r(15, 0, 0, 0);
        assert_eq!(disassemble(decode(word), 0), "Unknown R-type");
    }

    #[test]
    fn li_renders_signed_decimal() {
        // opcode 1, funct3=7, rd_rs1=6, imm7 = 42
        let word = (42u16 << 9) | (6 << 6) | (7 << 3) | 1;
        assert_eq!(disassemble(decode(word), 0), "li a0, 42");
    }

    #[test]
    fn j_target_is_pc_relative() {
        // opcode 5, f=0 (j), offset_hi=1, offset_lo=0 -> offset = 1<<3<<1 = 16
        let word = (0u16 << 15) | (1 << 9) | (0 << 6) | (0 << 3) | 5;
        assert_eq!(disassemble(decode(word), 0x10), "j 0x0020");
    }

    #[test]
    fn j_offset_never_goes_negative() {
        // Maximum offset_hi/offset_lo: the sign bit of the shifted
        // 10-bit field sits at 1024, but the largest representable
        // shifted value is 1022, so this offset can never go
        // negative. See DESIGN.md.
        assert_eq!(decode::j_type_offset(0x3F, 0x7), 1022);
    }

    #[test]
    fn sys_always_renders_ecall() {
        let word = (3u16 << 6) | 7;
        assert_eq!(disassemble(decode(word), 0), "ecall 3");
    }
}
