//! Instruction representation

use crate::alu::AluOp;
use crate::bits::Bit;

pub mod decode_helper;

/// Wrapped instruction
#[derive(Clone, Debug)]
pub struct Instruction {
    /// Raw 32-bit word
    pub raw: Vec<Bit>,
    /// Opcode group
    pub opcode: Opcode,
    /// Format
    pub format: Format,
    /// Mnemonic
    pub function: Function,
    /// Raw instruction fields
    pub fields: Fields,
    /// 32-bit immediate, sign-extended (zero-extended low bits for U-type)
    pub imm: Vec<Bit>,
    /// Control signals
    pub controls: Controls,
}

impl Instruction {
    pub fn decode(raw: &[Bit], exts: Extensions) -> Self {
        assert_eq!(raw.len(), 32, "decoder: instruction must be 32 bits, got {}", raw.len());

        let opcode = decode_helper::raw_to_opcode(raw);
        let format = decode_helper::opcode_to_format(opcode);
        let fields = decode_helper::extract_fields(raw);
        let function = decode_helper::get_function(opcode, &fields, raw, exts);
        let imm = decode_helper::immediate(format, raw);
        let controls = decode_helper::get_controls(function, opcode);

        Self { raw: raw.to_vec(), opcode, format, function, fields, imm, controls }
    }
}

/// Which instruction set extensions the decoder recognizes.
#[derive(Clone, Copy, Debug)]
pub struct Extensions {
    pub m: bool,
    pub f: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self { m: true, f: true }
    }
}

/// Opcode groups
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Lui,
    AuiPc,
    Jal,
    Jalr,
    Branch,
    Load,
    Store,
    Op,
    OpImm,
    OpFp,
    Unknown,
}

/// Instruction format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

/// Raw instruction fields, each the slice the encoding assigns it.
#[derive(Clone, Debug)]
pub struct Fields {
    pub opcode: Vec<Bit>,
    pub rd: Vec<Bit>,
    pub funct3: Vec<Bit>,
    pub rs1: Vec<Bit>,
    pub rs2: Vec<Bit>,
    pub funct7: Vec<Bit>,
}

/// Instruction mnemonic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Function {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lw,
    Sw,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
    FaddS,
    FsubS,
    FmulS,
    Unknown,
}

impl Function {
    pub fn is_m_extension(self) -> bool {
        matches!(
            self,
            Function::Mul
                | Function::Mulh
                | Function::Mulhsu
                | Function::Mulhu
                | Function::Div
                | Function::Divu
                | Function::Rem
                | Function::Remu
        )
    }

    pub fn is_f_extension(self) -> bool {
        matches!(self, Function::FaddS | Function::FsubS | Function::FmulS)
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Function::Lui => "LUI",
            Function::Auipc => "AUIPC",
            Function::Jal => "JAL",
            Function::Jalr => "JALR",
            Function::Beq => "BEQ",
            Function::Bne => "BNE",
            Function::Blt => "BLT",
            Function::Bge => "BGE",
            Function::Bltu => "BLTU",
            Function::Bgeu => "BGEU",
            Function::Lw => "LW",
            Function::Sw => "SW",
            Function::Addi => "ADDI",
            Function::Slti => "SLTI",
            Function::Sltiu => "SLTIU",
            Function::Xori => "XORI",
            Function::Ori => "ORI",
            Function::Andi => "ANDI",
            Function::Slli => "SLLI",
            Function::Srli => "SRLI",
            Function::Srai => "SRAI",
            Function::Add => "ADD",
            Function::Sub => "SUB",
            Function::Sll => "SLL",
            Function::Slt => "SLT",
            Function::Sltu => "SLTU",
            Function::Xor => "XOR",
            Function::Srl => "SRL",
            Function::Sra => "SRA",
            Function::Or => "OR",
            Function::And => "AND",
            Function::Mul => "MUL",
            Function::Mulh => "MULH",
            Function::Mulhsu => "MULHSU",
            Function::Mulhu => "MULHU",
            Function::Div => "DIV",
            Function::Divu => "DIVU",
            Function::Rem => "REM",
            Function::Remu => "REMU",
            Function::FaddS => "FADD.S",
            Function::FsubS => "FSUB.S",
            Function::FmulS => "FMUL.S",
            Function::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Selector for ALU operand A
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SrcA {
    #[default]
    Reg,
    Pc,
}

/// Selector for ALU operand B
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SrcB {
    #[default]
    Reg,
    Imm,
}

/// Selector for the writeback value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResultSrc {
    #[default]
    Alu,
    Mem,
    PcPlus4,
}

/// Selector for the next PC
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PcSrc {
    #[default]
    Seq,
    BranchTarget,
    JumpTarget,
}

/// Control signals
#[derive(Clone, Copy, Debug, Default)]
pub struct Controls {
    pub reg_write: bool,
    pub fp_reg_write: bool,
    pub alu_op: AluOp,
    pub src_a: SrcA,
    pub src_b: SrcB,
    pub mem_read: bool,
    pub mem_write: bool,
    pub branch: bool,
    pub jump: bool,
    pub result_src: ResultSrc,
    pub pc_src: PcSrc,
}
