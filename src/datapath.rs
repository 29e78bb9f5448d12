//! Single-cycle datapath
//!
//! Executes one instruction per cycle through fetch, decode, operand
//! preparation, execute, memory and writeback, then updates the PC. Every
//! address and PC computation goes through the ALU; shifts bypass it into
//! the barrel shifter, and the M/F instructions dispatch into the MDU and
//! FPU. Their per-iteration traces are dropped with the cycle record.

use crate::alu::{alu, AluOp};
use crate::bits::{self, Bit};
use crate::boundary::reg_index;
use crate::error::SimulatorResult;
use crate::fpu::{self, RoundingMode};
use crate::instruction::{Extensions, Function, Instruction, PcSrc, ResultSrc, SrcA, SrcB};
use crate::mdu::{self, MdOp};
use crate::memory::Memory;
use crate::registers::RegisterFile;
use crate::shifter::{shift, ShiftOp};

/// Result of one cycle of execution.
#[derive(Clone, Debug)]
pub struct CycleResult {
    /// PC at the start of the cycle
    pub pc: Vec<Bit>,
    /// Fetched instruction word
    pub instruction: Vec<Bit>,
    /// Decoded instruction, control signals included
    pub decoded: Instruction,
    /// Execute-stage output
    pub alu_result: Vec<Bit>,
    /// Memory read data, when the cycle loaded
    pub mem_data: Option<Vec<Bit>>,
    /// Value presented to the register file
    pub writeback_data: Vec<Bit>,
    /// Whether a branch condition held
    pub branch_taken: bool,
    /// Cycle index
    pub cycle: u64,
}

/// Single-cycle datapath owning the architectural state.
#[derive(Clone, Debug)]
pub struct Datapath {
    pub memory: Memory,
    pub register_file: RegisterFile,
    pc: Vec<Bit>,
    cycle_count: u64,
    exts: Extensions,
}

impl Datapath {
    pub fn new(memory: Memory, register_file: RegisterFile, exts: Extensions) -> Self {
        Self {
            memory,
            register_file,
            pc: bits::zeros(32),
            cycle_count: 0,
            exts,
        }
    }

    pub fn pc(&self) -> Vec<Bit> {
        self.pc.clone()
    }

    pub fn set_pc(&mut self, pc: &[Bit]) {
        assert_eq!(pc.len(), 32, "datapath: PC must be 32 bits");
        self.pc = pc.to_vec();
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn reset_cycle_count(&mut self) {
        self.cycle_count = 0;
    }

    fn pc_plus_4(&self) -> Vec<Bit> {
        let four = bits::concat(&[&bits::zeros(29), &[1, 0, 0]]);
        alu(&self.pc, &four, AluOp::Add).0
    }

    /// Execute one complete cycle.
    pub fn execute_cycle(&mut self) -> SimulatorResult<CycleResult> {
        let cycle = self.cycle_count;
        self.cycle_count += 1;

        // Fetch
        let pc = self.pc.clone();
        let instruction = self.memory.read_word(&pc)?;

        // Decode
        let decoded = Instruction::decode(&instruction, self.exts);
        let controls = decoded.controls;

        // Operand preparation
        let rs1_data = self.register_file.read_int(reg_index(&decoded.fields.rs1));
        let rs2_data = self.register_file.read_int(reg_index(&decoded.fields.rs2));

        let op_a = match controls.src_a {
            SrcA::Pc => pc.clone(),
            SrcA::Reg => rs1_data.clone(),
        };
        let op_b = match controls.src_b {
            SrcB::Imm => decoded.imm.clone(),
            SrcB::Reg => rs2_data.clone(),
        };

        // Execute
        let mut branch_taken = false;
        let mut fp_result: Option<Vec<Bit>> = None;

        let alu_result = match decoded.function {
            Function::Sll | Function::Slli => {
                let shamt = bits::slice(&op_b, 27, 32);
                shift(&op_a, &shamt, ShiftOp::Sll)
            }
            Function::Srl | Function::Srli => {
                let shamt = bits::slice(&op_b, 27, 32);
                shift(&op_a, &shamt, ShiftOp::Srl)
            }
            Function::Sra | Function::Srai => {
                let shamt = bits::slice(&op_b, 27, 32);
                shift(&op_a, &shamt, ShiftOp::Sra)
            }

            Function::Slt | Function::Slti => {
                let (_, flags) = alu(&op_a, &op_b, AluOp::Sub);
                bits::concat(&[&bits::zeros(31), &[flags.n ^ flags.v]])
            }
            Function::Sltu | Function::Sltiu => {
                let (_, flags) = alu(&op_a, &op_b, AluOp::Sub);
                bits::concat(&[&bits::zeros(31), &[1 ^ flags.c]])
            }

            // LUI forwards the immediate untouched
            Function::Lui => decoded.imm.clone(),

            Function::Beq | Function::Bne | Function::Blt | Function::Bge | Function::Bltu
            | Function::Bgeu => {
                let (_, flags) = alu(&rs1_data, &rs2_data, AluOp::Sub);
                branch_taken = match decoded.function {
                    Function::Beq => flags.z == 1,
                    Function::Bne => flags.z == 0,
                    Function::Blt => flags.n ^ flags.v == 1,
                    Function::Bge => flags.n ^ flags.v == 0,
                    Function::Bltu => flags.c == 0,
                    _ => flags.c == 1,
                };
                // Branch target: PC + immediate
                alu(&pc, &decoded.imm, AluOp::Add).0
            }

            Function::Mul | Function::Mulh | Function::Mulhsu | Function::Mulhu => {
                let op = match decoded.function {
                    Function::Mul => MdOp::Mul,
                    Function::Mulh => MdOp::Mulh,
                    Function::Mulhsu => MdOp::Mulhsu,
                    _ => MdOp::Mulhu,
                };
                mdu::multiply(&rs1_data, &rs2_data, op).result
            }
            Function::Div | Function::Divu => {
                let op = if decoded.function == Function::Div { MdOp::Div } else { MdOp::Divu };
                mdu::divide(&rs1_data, &rs2_data, op).quotient
            }
            Function::Rem | Function::Remu => {
                let op = if decoded.function == Function::Rem { MdOp::Rem } else { MdOp::Remu };
                mdu::divide(&rs1_data, &rs2_data, op).remainder
            }

            Function::FaddS | Function::FsubS | Function::FmulS => {
                let fa = self.register_file.read_fp(reg_index(&decoded.fields.rs1));
                let fb = self.register_file.read_fp(reg_index(&decoded.fields.rs2));
                let rm = RoundingMode::from_bits(&self.register_file.rounding_mode());
                let out = match decoded.function {
                    Function::FaddS => fpu::fadd(&fa, &fb, rm),
                    Function::FsubS => fpu::fsub(&fa, &fb, rm),
                    _ => fpu::fmul(&fa, &fb, rm),
                };
                self.register_file.accumulate_fflags(out.flags);
                fp_result = Some(out.result.clone());
                out.result
            }

            Function::Unknown => bits::zeros(32),

            // ADD/SUB and the logic family, plus every address computation
            _ => alu(&op_a, &op_b, controls.alu_op).0,
        };

        // Memory
        let mut mem_data = None;
        if controls.mem_read {
            mem_data = Some(self.memory.read_word(&alu_result)?);
        } else if controls.mem_write {
            self.memory.write_word(&alu_result, &rs2_data)?;
        }

        // Writeback
        let writeback_data = match controls.result_src {
            ResultSrc::Mem => mem_data.clone().unwrap_or_else(|| bits::zeros(32)),
            ResultSrc::PcPlus4 => self.pc_plus_4(),
            ResultSrc::Alu => alu_result.clone(),
        };

        if controls.reg_write {
            self.register_file
                .write_int(reg_index(&decoded.fields.rd), &writeback_data);
        }
        if controls.fp_reg_write {
            let value = fp_result.as_deref().unwrap_or(&alu_result);
            self.register_file.write_fp(reg_index(&decoded.fields.rd), value);
        }

        // PC update
        self.pc = match controls.pc_src {
            PcSrc::JumpTarget => {
                if decoded.function == Function::Jalr {
                    // Force the target's low bit to zero
                    bits::set_bit(&alu_result, 31, 0)
                } else {
                    alu_result.clone()
                }
            }
            PcSrc::BranchTarget if branch_taken => alu_result.clone(),
            _ => self.pc_plus_4(),
        };

        Ok(CycleResult {
            pc,
            instruction,
            decoded,
            alu_result,
            mem_data,
            writeback_data,
            branch_taken,
            cycle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{from_u32, to_u32};

    fn datapath_with(words: &[u32]) -> Datapath {
        let mut mem = Memory::default();
        let program: Vec<Vec<Bit>> = words.iter().map(|w| from_u32(*w, 32)).collect();
        mem.load_words(&program).unwrap();
        Datapath::new(mem, RegisterFile::new(), Extensions::default())
    }

    #[test]
    fn test_addi_cycle() {
        // ADDI x1, x0, 5
        let mut dp = datapath_with(&[0x0050_0093]);
        let result = dp.execute_cycle().unwrap();

        assert_eq!(result.decoded.function, Function::Addi);
        assert_eq!(to_u32(&result.writeback_data), 5);
        assert_eq!(to_u32(&dp.register_file.read_int(1)), 5);
        assert_eq!(to_u32(&dp.pc()), 4);
    }

    #[test]
    fn test_store_then_load() {
        // ADDI x1, x0, 77 ; LUI x5, 0x10 ; SW x1, 0(x5) ; LW x2, 0(x5)
        let mut dp = datapath_with(&[0x04D0_0093, 0x0001_02B7, 0x0012_A023, 0x0002_A103]);
        for _ in 0..4 {
            dp.execute_cycle().unwrap();
        }
        assert_eq!(to_u32(&dp.register_file.read_int(2)), 77);
        assert_eq!(
            to_u32(&dp.memory.read_word(&from_u32(0x0001_0000, 32)).unwrap()),
            77
        );
    }

    #[test]
    fn test_branch_taken_redirects_pc() {
        // BEQ x0, x0, +8
        let mut dp = datapath_with(&[0x0000_0463]);
        let result = dp.execute_cycle().unwrap();
        assert!(result.branch_taken);
        assert_eq!(to_u32(&dp.pc()), 8);
    }

    #[test]
    fn test_branch_not_taken_falls_through() {
        // ADDI x1, x0, 1 ; BEQ x0, x1, +8
        let mut dp = datapath_with(&[0x0010_0093, 0x0010_0463]);
        dp.execute_cycle().unwrap();
        let result = dp.execute_cycle().unwrap();
        assert!(!result.branch_taken);
        assert_eq!(to_u32(&dp.pc()), 8);
    }

    #[test]
    fn test_jal_links_and_jumps() {
        // ADDI x0, x0, 0 ; JAL x1, -4
        let mut dp = datapath_with(&[0x0000_0013, 0xFFDF_F0EF]);
        dp.execute_cycle().unwrap();
        let result = dp.execute_cycle().unwrap();

        assert_eq!(result.decoded.function, Function::Jal);
        // Link register holds PC + 4
        assert_eq!(to_u32(&dp.register_file.read_int(1)), 8);
        // Target is PC + immediate
        assert_eq!(to_u32(&dp.pc()), 0);
    }

    #[test]
    fn test_jalr_clears_target_lsb() {
        // ADDI x1, x0, 9 ; JALR x2, x1, 0
        let mut dp = datapath_with(&[0x0090_0093, 0x0000_8167]);
        dp.execute_cycle().unwrap();
        dp.execute_cycle().unwrap();
        assert_eq!(to_u32(&dp.pc()), 8); // 9 with the low bit forced off
    }

    #[test]
    fn test_slt_family() {
        // ADDI x1, x0, -1 ; ADDI x2, x0, 1 ; SLT x3, x1, x2 ; SLTU x4, x1, x2
        let mut dp = datapath_with(&[0xFFF0_0093, 0x0010_0113, 0x0020_A1B3, 0x0020_B233]);
        for _ in 0..4 {
            dp.execute_cycle().unwrap();
        }
        // Signed: -1 < 1
        assert_eq!(to_u32(&dp.register_file.read_int(3)), 1);
        // Unsigned: 0xFFFFFFFF > 1
        assert_eq!(to_u32(&dp.register_file.read_int(4)), 0);
    }

    #[test]
    fn test_auipc_adds_pc() {
        // ADDI x0, x0, 0 ; AUIPC x1, 0x1
        let mut dp = datapath_with(&[0x0000_0013, 0x0000_1097]);
        dp.execute_cycle().unwrap();
        dp.execute_cycle().unwrap();
        assert_eq!(to_u32(&dp.register_file.read_int(1)), 0x1004);
    }

    #[test]
    fn test_fp_flags_accumulate_in_fcsr() {
        // FADD.S f4, f1, f2 with f1 = f2 = 1e38 overflows
        let mut dp = datapath_with(&[0x0020_8253]);
        let big = from_u32(f32::to_bits(3e38), 32);
        dp.register_file.write_fp(1, &big);
        dp.register_file.write_fp(2, &big);
        dp.execute_cycle().unwrap();

        assert_eq!(to_u32(&dp.register_file.read_fp(4)), 0x7F80_0000);
        assert_eq!(dp.register_file.flag_of(), 1);
        assert_eq!(dp.register_file.flag_nx(), 1);
    }

    #[test]
    fn test_unknown_instruction_is_inert() {
        let mut dp = datapath_with(&[0xFFFF_FFFF]);
        let before = dp.register_file.clone();
        let result = dp.execute_cycle().unwrap();

        assert_eq!(result.decoded.function, Function::Unknown);
        for i in 0..32 {
            assert_eq!(before.read_int(i), dp.register_file.read_int(i));
        }
        assert_eq!(to_u32(&dp.pc()), 4);
    }
}
