//! Decoding helper functions
//!
//! Field extraction and immediate reconstruction use only slice and
//! concatenation on the raw word; mnemonic resolution matches on the
//! extracted bit patterns directly.

use super::Controls;
use super::Extensions;
use super::Fields;
use super::Format;
use super::Function;
use super::Opcode;
use super::PcSrc;
use super::ResultSrc;
use super::SrcA;
use super::SrcB;
use crate::alu::AluOp;
use crate::bits::{self, Bit};

/// Returns the opcode group from the low 7 bits of a raw instruction
pub fn raw_to_opcode(raw: &[Bit]) -> Opcode {
    match &raw[25..32] {
        [0, 1, 1, 0, 1, 1, 1] => Opcode::Lui,
        [0, 0, 1, 0, 1, 1, 1] => Opcode::AuiPc,
        [1, 1, 0, 1, 1, 1, 1] => Opcode::Jal,
        [1, 1, 0, 0, 1, 1, 1] => Opcode::Jalr,
        [1, 1, 0, 0, 0, 1, 1] => Opcode::Branch,
        [0, 0, 0, 0, 0, 1, 1] => Opcode::Load,
        [0, 1, 0, 0, 0, 1, 1] => Opcode::Store,
        [0, 1, 1, 0, 0, 1, 1] => Opcode::Op,
        [0, 0, 1, 0, 0, 1, 1] => Opcode::OpImm,
        [1, 0, 1, 0, 0, 1, 1] => Opcode::OpFp,
        _ => Opcode::Unknown,
    }
}

/// Returns the instruction format for an opcode group
pub fn opcode_to_format(opcode: Opcode) -> Format {
    match opcode {
        Opcode::Lui | Opcode::AuiPc => Format::U,
        Opcode::Jal => Format::J,
        Opcode::Jalr | Opcode::Load | Opcode::OpImm => Format::I,
        Opcode::Branch => Format::B,
        Opcode::Store => Format::S,
        Opcode::Op | Opcode::OpFp => Format::R,
        // Fields are still extracted so dumps can show them
        Opcode::Unknown => Format::R,
    }
}

/// Extracts every encoding field as the slice the format assigns it
pub fn extract_fields(raw: &[Bit]) -> Fields {
    Fields {
        funct7: bits::slice(raw, 0, 7),
        rs2: bits::slice(raw, 7, 12),
        rs1: bits::slice(raw, 12, 17),
        funct3: bits::slice(raw, 17, 20),
        rd: bits::slice(raw, 20, 25),
        opcode: bits::slice(raw, 25, 32),
    }
}

/// Reconstructs the 32-bit immediate for a format
pub fn immediate(format: Format, raw: &[Bit]) -> Vec<Bit> {
    match format {
        // R-type carries no immediate
        Format::R => bits::zeros(32),

        // imm[11:0] = raw[31:20]
        Format::I => bits::sign_extend(&bits::slice(raw, 0, 12), 32),

        // imm[11:5] = raw[31:25], imm[4:0] = raw[11:7]
        Format::S => {
            let imm = bits::concat(&[&bits::slice(raw, 0, 7), &bits::slice(raw, 20, 25)]);
            bits::sign_extend(&imm, 32)
        }

        // imm[12] = raw[31], imm[11] = raw[7], imm[10:5] = raw[30:25],
        // imm[4:1] = raw[11:8], imm[0] = 0
        Format::B => {
            let imm = bits::concat(&[
                &bits::slice(raw, 0, 1),
                &bits::slice(raw, 24, 25),
                &bits::slice(raw, 1, 7),
                &bits::slice(raw, 20, 24),
                &[0],
            ]);
            bits::sign_extend(&imm, 32)
        }

        // imm[31:12] = raw[31:12], low 12 bits zero
        Format::U => bits::concat(&[&bits::slice(raw, 0, 20), &bits::zeros(12)]),

        // imm[20] = raw[31], imm[19:12] = raw[19:12], imm[11] = raw[20],
        // imm[10:1] = raw[30:21], imm[0] = 0
        Format::J => {
            let imm = bits::concat(&[
                &bits::slice(raw, 0, 1),
                &bits::slice(raw, 12, 20),
                &bits::slice(raw, 11, 12),
                &bits::slice(raw, 1, 11),
                &[0],
            ]);
            bits::sign_extend(&imm, 32)
        }
    }
}

/// Determines an instruction's mnemonic, e.g., JAL, XOR, or FADD.S
pub fn get_function(opcode: Opcode, fields: &Fields, raw: &[Bit], exts: Extensions) -> Function {
    use Function::*;

    let funct3 = &fields.funct3[..];
    let funct7 = &fields.funct7[..];
    // Bit 30 distinguishes SRLI/SRAI inside the I-type shift encoding
    let funct7_bit = raw[1];

    match opcode {
        Opcode::Lui => Lui,
        Opcode::AuiPc => Auipc,
        Opcode::Jal => Jal,
        Opcode::Jalr => Jalr,

        Opcode::Branch => match funct3 {
            [0, 0, 0] => Beq,
            [0, 0, 1] => Bne,
            [1, 0, 0] => Blt,
            [1, 0, 1] => Bge,
            [1, 1, 0] => Bltu,
            [1, 1, 1] => Bgeu,
            _ => Unknown,
        },

        Opcode::Load => match funct3 {
            [0, 1, 0] => Lw,
            _ => Unknown,
        },

        Opcode::Store => match funct3 {
            [0, 1, 0] => Sw,
            _ => Unknown,
        },

        Opcode::OpImm => match (funct3, funct7_bit) {
            ([0, 0, 0], _) => Addi,
            ([0, 1, 0], _) => Slti,
            ([0, 1, 1], _) => Sltiu,
            ([1, 0, 0], _) => Xori,
            ([1, 1, 0], _) => Ori,
            ([1, 1, 1], _) => Andi,
            ([0, 0, 1], _) => Slli,
            ([1, 0, 1], 0) => Srli,
            ([1, 0, 1], 1) => Srai,
            _ => Unknown,
        },

        Opcode::Op => match funct7 {
            [0, 0, 0, 0, 0, 0, 0] => match funct3 {
                [0, 0, 0] => Add,
                [0, 0, 1] => Sll,
                [0, 1, 0] => Slt,
                [0, 1, 1] => Sltu,
                [1, 0, 0] => Xor,
                [1, 0, 1] => Srl,
                [1, 1, 0] => Or,
                [1, 1, 1] => And,
                _ => Unknown,
            },
            [0, 1, 0, 0, 0, 0, 0] => match funct3 {
                [0, 0, 0] => Sub,
                [1, 0, 1] => Sra,
                _ => Unknown,
            },
            [0, 0, 0, 0, 0, 0, 1] if exts.m => match funct3 {
                [0, 0, 0] => Mul,
                [0, 0, 1] => Mulh,
                [0, 1, 0] => Mulhsu,
                [0, 1, 1] => Mulhu,
                [1, 0, 0] => Div,
                [1, 0, 1] => Divu,
                [1, 1, 0] => Rem,
                [1, 1, 1] => Remu,
                _ => Unknown,
            },
            _ => Unknown,
        },

        Opcode::OpFp if exts.f => match funct7 {
            [0, 0, 0, 0, 0, 0, 0] => FaddS,
            [0, 0, 0, 0, 1, 0, 0] => FsubS,
            [0, 0, 0, 1, 0, 0, 0] => FmulS,
            _ => Unknown,
        },

        _ => Unknown,
    }
}

/// Derives the control word for a mnemonic
pub fn get_controls(function: Function, opcode: Opcode) -> Controls {
    use Function::*;

    let alu_op = match function {
        Sub | Beq | Bne | Blt | Bge | Bltu | Bgeu | Slt | Sltu | Slti | Sltiu => AluOp::Sub,
        And | Andi => AluOp::And,
        Or | Ori => AluOp::Or,
        Xor | Xori => AluOp::Xor,
        // Loads, stores, jumps and the U-types all ride the adder
        _ => AluOp::Add,
    };

    Controls {
        reg_write: !matches!(opcode, Opcode::Branch | Opcode::Store | Opcode::Unknown)
            && !function.is_f_extension()
            && function != Unknown,
        fp_reg_write: function.is_f_extension(),
        alu_op,
        src_a: match function {
            Auipc => SrcA::Pc,
            _ => SrcA::Reg,
        },
        src_b: match opcode {
            Opcode::Branch | Opcode::Op | Opcode::OpFp => SrcB::Reg,
            _ => SrcB::Imm,
        },
        mem_read: function == Lw,
        mem_write: function == Sw,
        branch: opcode == Opcode::Branch,
        jump: matches!(function, Jal | Jalr),
        result_src: match function {
            Lw => ResultSrc::Mem,
            Jal | Jalr => ResultSrc::PcPlus4,
            _ => ResultSrc::Alu,
        },
        pc_src: match function {
            Jal | Jalr => PcSrc::JumpTarget,
            Beq | Bne | Blt | Bge | Bltu | Bgeu => PcSrc::BranchTarget,
            _ => PcSrc::Seq,
        },
    }
}
