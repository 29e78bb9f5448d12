//! CPU top level
//!
//! Owns the datapath and drives it: program loading, reset, single-step
//! and run loops with halt detection, statistics, and the inspection
//! helpers used by the binaries and tests. The halt convention is the
//! self-jump `JAL x0, 0` (word 0x0000006F); the run loop recognizes it at
//! the instruction about to execute.

use std::collections::HashMap;
use std::path::Path;

use crate::bits::{self, Bit};
use crate::boundary;
use crate::datapath::{CycleResult, Datapath};
use crate::error::SimulatorResult;
use crate::instruction::{Extensions, Format, Function};
use crate::loader;
use crate::memory::{Memory, INSTRUCTION_BASE};
use crate::registers::RegisterFile;
use crate::twos;

/// Encoded halt marker: JAL x0, 0.
pub const HALT_WORD: u32 = 0x0000_006F;

/// Standard ABI register aliases, for dumps only.
pub const REG_ALIASES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Why a run loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltCause {
    /// The halt marker was about to execute
    Halt,
    /// An unrecognized instruction executed
    InvalidInstruction,
    /// The cycle bound was exhausted
    MaxCycles,
    /// The requested PC was reached
    TargetReached,
}

/// Result of a run.
#[derive(Clone, Debug)]
pub struct ExecutionResult {
    pub cycles: u64,
    pub instructions: u64,
    pub final_pc: u32,
    pub cause: HaltCause,
    /// Full cycle trace, kept when the policy records it
    pub trace: Vec<CycleResult>,
}

/// Execution statistics.
#[derive(Clone, Debug, Default)]
pub struct CpuStatistics {
    pub total_cycles: u64,
    pub instructions_executed: u64,
    pub cpi: f64,
    pub instruction_mix: HashMap<Function, u64>,
    pub branch_taken_count: u64,
    pub branch_not_taken_count: u64,
    pub memory_reads: u64,
    pub memory_writes: u64,
}

/// CPU policy
#[derive(Clone, Copy, Debug)]
pub struct CpuPolicy {
    pub enable_m: bool,
    pub enable_f: bool,
    pub record_trace: bool,
    pub verbose: bool,
    pub memory_size: usize,
    pub pc_start: u32,
}

impl Default for CpuPolicy {
    fn default() -> Self {
        Self {
            enable_m: true,
            enable_f: true,
            record_trace: false,
            verbose: false,
            memory_size: crate::memory::DEFAULT_SIZE,
            pc_start: INSTRUCTION_BASE,
        }
    }
}

/// Top-level RISC-V CPU simulator.
pub struct Cpu {
    datapath: Datapath,
    policy: CpuPolicy,
    instruction_mix: HashMap<Function, u64>,
    branch_taken_count: u64,
    branch_not_taken_count: u64,
    memory_reads: u64,
    memory_writes: u64,
    instructions_executed: u64,
    trace: Vec<CycleResult>,
}

impl Cpu {
    pub fn new(policy: CpuPolicy) -> Self {
        let exts = Extensions { m: policy.enable_m, f: policy.enable_f };
        let mut datapath =
            Datapath::new(Memory::new(policy.memory_size), RegisterFile::new(), exts);
        datapath.set_pc(&boundary::from_u32(policy.pc_start, 32));

        Self {
            datapath,
            policy,
            instruction_mix: HashMap::new(),
            branch_taken_count: 0,
            branch_not_taken_count: 0,
            memory_reads: 0,
            memory_writes: 0,
            instructions_executed: 0,
            trace: Vec::new(),
        }
    }

    /// Load a hex program file into the instruction region.
    pub fn load_program(&mut self, path: impl AsRef<Path>) -> SimulatorResult<()> {
        let words = loader::load_hex_file(path)?;
        self.datapath.memory.load_words(&words)
    }

    /// Load raw instruction words; the injection path for tests and tools.
    pub fn load_words(&mut self, words: &[u32]) -> SimulatorResult<()> {
        let program: Vec<Vec<Bit>> = words.iter().map(|w| boundary::from_u32(*w, 32)).collect();
        self.datapath.memory.load_words(&program)
    }

    /// Reset registers, FCSR, PC and statistics. Loaded program bytes stay.
    pub fn reset(&mut self) {
        self.datapath.register_file.reset();
        self.datapath.set_pc(&boundary::from_u32(self.policy.pc_start, 32));
        self.datapath.reset_cycle_count();
        self.instruction_mix.clear();
        self.branch_taken_count = 0;
        self.branch_not_taken_count = 0;
        self.memory_reads = 0;
        self.memory_writes = 0;
        self.instructions_executed = 0;
        self.trace.clear();
    }

    /// Execute one cycle and fold it into the statistics.
    pub fn step(&mut self) -> SimulatorResult<CycleResult> {
        let result = self.datapath.execute_cycle()?;
        self.instructions_executed += 1;

        if self.policy.verbose {
            eprintln!(
                "[VERBOSE] cycle {}: PC 0x{} {}",
                result.cycle,
                bits::to_hex(&result.pc),
                result.decoded.function
            );
        }

        *self.instruction_mix.entry(result.decoded.function).or_insert(0) += 1;

        if result.decoded.format == Format::B {
            if result.branch_taken {
                self.branch_taken_count += 1;
            } else {
                self.branch_not_taken_count += 1;
            }
        }
        if result.decoded.controls.mem_read {
            self.memory_reads += 1;
        }
        if result.decoded.controls.mem_write {
            self.memory_writes += 1;
        }

        if self.policy.record_trace {
            self.trace.push(result.clone());
        }

        Ok(result)
    }

    /// True when the word at the current PC is the halt marker.
    fn at_halt_marker(&self) -> bool {
        let marker = boundary::from_u32(HALT_WORD, 32);
        match self.datapath.memory.read_word(&self.datapath.pc()) {
            Ok(word) => word == marker,
            Err(_) => false,
        }
    }

    fn finish(&mut self, cycles: u64, cause: HaltCause) -> ExecutionResult {
        ExecutionResult {
            cycles,
            instructions: cycles,
            final_pc: self.get_pc(),
            cause,
            trace: std::mem::take(&mut self.trace),
        }
    }

    /// Run until a halt condition fires.
    pub fn run(&mut self, max_cycles: u64) -> SimulatorResult<ExecutionResult> {
        self.run_inner(None, max_cycles)
    }

    /// Run until the PC reaches `target` or a halt condition fires.
    pub fn run_until_pc(&mut self, target: u32, max_cycles: u64) -> SimulatorResult<ExecutionResult> {
        self.run_inner(Some(target), max_cycles)
    }

    fn run_inner(&mut self, target: Option<u32>, max_cycles: u64) -> SimulatorResult<ExecutionResult> {
        for cycle in 0..max_cycles {
            // The halt marker outranks a target-PC match
            if self.at_halt_marker() {
                return Ok(self.finish(cycle, HaltCause::Halt));
            }

            if let Some(t) = target {
                if self.get_pc() == t {
                    return Ok(self.finish(cycle, HaltCause::TargetReached));
                }
            }

            let result = self.step()?;
            if result.decoded.function == Function::Unknown {
                let mut out = self.finish(cycle + 1, HaltCause::InvalidInstruction);
                out.final_pc = boundary::to_u32(&result.pc);
                return Ok(out);
            }
        }

        Ok(self.finish(max_cycles, HaltCause::MaxCycles))
    }

    pub fn get_pc(&self) -> u32 {
        boundary::to_u32(&self.datapath.pc())
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.datapath.set_pc(&boundary::from_u32(pc, 32));
    }

    pub fn get_register(&self, n: usize) -> u32 {
        boundary::to_u32(&self.datapath.register_file.read_int(n))
    }

    pub fn set_register(&mut self, n: usize, value: u32) {
        self.datapath
            .register_file
            .write_int(n, &boundary::from_u32(value, 32));
    }

    pub fn get_fp_register(&self, n: usize) -> u32 {
        boundary::to_u32(&self.datapath.register_file.read_fp(n))
    }

    pub fn set_fp_register(&mut self, n: usize, value: u32) {
        self.datapath
            .register_file
            .write_fp(n, &boundary::from_u32(value, 32));
    }

    pub fn get_memory_word(&self, addr: u32) -> SimulatorResult<u32> {
        let word = self.datapath.memory.read_word(&boundary::from_u32(addr, 32))?;
        Ok(boundary::to_u32(&word))
    }

    pub fn set_memory_word(&mut self, addr: u32, value: u32) -> SimulatorResult<()> {
        self.datapath
            .memory
            .write_word(&boundary::from_u32(addr, 32), &boundary::from_u32(value, 32))
    }

    pub fn fcsr(&self) -> Vec<Bit> {
        self.datapath.register_file.read_fcsr()
    }

    pub fn set_rounding_mode(&mut self, mode: &[Bit]) {
        self.datapath.register_file.set_rounding_mode(mode);
    }

    pub fn clear_fflags(&mut self) {
        self.datapath.register_file.set_fflags(&bits::zeros(5));
    }

    /// Snapshot the execution statistics.
    pub fn statistics(&self) -> CpuStatistics {
        let total_cycles = self.datapath.cycle_count();
        let cpi = if self.instructions_executed > 0 {
            total_cycles as f64 / self.instructions_executed as f64
        } else {
            0.0
        };
        CpuStatistics {
            total_cycles,
            instructions_executed: self.instructions_executed,
            cpi,
            instruction_mix: self.instruction_mix.clone(),
            branch_taken_count: self.branch_taken_count,
            branch_not_taken_count: self.branch_not_taken_count,
            memory_reads: self.memory_reads,
            memory_writes: self.memory_writes,
        }
    }

    /// Formatted dump of the integer registers with ABI aliases.
    pub fn dump_registers(&self) -> String {
        let mut lines = Vec::new();
        lines.push("Integer Registers".to_string());
        lines.push("-".repeat(48));

        for i in 0..32 {
            let value = self.datapath.register_file.read_int(i);
            let signed = twos::decode(&value);
            lines.push(format!(
                "x{:<2} ({:>4}): 0x{} ({})",
                i,
                REG_ALIASES[i],
                bits::to_hex(&value),
                signed
            ));
        }

        lines.push(format!("pc        : 0x{}", bits::to_hex(&self.datapath.pc())));
        lines.join("\n")
    }

    /// Formatted dump of a word-aligned memory range.
    pub fn dump_memory(&self, start: u32, end: u32) -> SimulatorResult<String> {
        let mut lines = Vec::new();
        lines.push(format!("Memory 0x{:08X}..0x{:08X}", start, end));
        lines.push("-".repeat(48));

        let mut addr = start & !3;
        while addr < end {
            let word = self.datapath.memory.read_word(&boundary::from_u32(addr, 32))?;
            lines.push(format!(
                "0x{:08X}: 0x{} ({})",
                addr,
                bits::to_hex(&word),
                twos::decode(&word)
            ));
            addr += 4;
        }

        Ok(lines.join("\n"))
    }
}
