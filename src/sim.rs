use std::process;

use rvsim::cpu::{Cpu, CpuPolicy, HaltCause};
use rvsim::error::SimulatorResult;

mod flags;

fn main() {
    let args = flags::RvSimArgs::from_env_or_exit();
    match run(&args) {
        Ok(cause) => process::exit(exit_code(cause)),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn exit_code(cause: HaltCause) -> i32 {
    match cause {
        HaltCause::Halt | HaltCause::TargetReached => 0,
        HaltCause::InvalidInstruction => 2,
        HaltCause::MaxCycles => 3,
    }
}

fn run(args: &flags::RvSimArgs) -> SimulatorResult<HaltCause> {
    let policy = CpuPolicy {
        enable_m: !args.no_m,
        enable_f: !args.no_f,
        record_trace: args.trace,
        verbose: args.verbose,
        ..Default::default()
    };

    let mut cpu = Cpu::new(policy);
    cpu.load_program(&args.program)?;

    let max_cycles = args.max_cycles.unwrap_or(100_000);
    let result = cpu.run(max_cycles)?;

    if args.trace {
        for cycle in &result.trace {
            eprintln!(
                "[TRACE] {:>6}  pc 0x{}  {:<8} wb 0x{}{}",
                cycle.cycle,
                rvsim::bits::to_hex(&cycle.pc),
                cycle.decoded.function.to_string(),
                rvsim::bits::to_hex(&cycle.writeback_data),
                if cycle.branch_taken { "  branch taken" } else { "" }
            );
        }
    }

    let stats = cpu.statistics();
    eprintln!("[HISTORY] halt cause = {:?}", result.cause);
    eprintln!("[HISTORY] final PC = 0x{:08X}", result.final_pc);
    eprintln!(
        "[HISTORY] # cycles = {}, # instructions = {}, CPI = {:.2}",
        stats.total_cycles, stats.instructions_executed, stats.cpi
    );
    eprintln!(
        "[HISTORY] branches taken = {}, not taken = {}, loads = {}, stores = {}",
        stats.branch_taken_count,
        stats.branch_not_taken_count,
        stats.memory_reads,
        stats.memory_writes
    );

    if args.dump_registers {
        println!("{}", cpu.dump_registers());
    }

    if let Some(range) = &args.dump_memory {
        let (start, end) = parse_range(range)?;
        println!("{}", cpu.dump_memory(start, end)?);
    }

    Ok(result.cause)
}

/// Parse a "START:END" hex range, e.g. 0x10000:0x10040.
fn parse_range(text: &str) -> SimulatorResult<(u32, u32)> {
    use rvsim::error::SimulatorError;

    let bad = || SimulatorError::ConfigError(format!("invalid memory range '{}'", text));
    let (start, end) = text.split_once(':').ok_or_else(bad)?;

    let parse = |s: &str| {
        let s = s.trim().trim_start_matches("0x").trim_start_matches("0X");
        u32::from_str_radix(s, 16).map_err(|_| bad())
    };
    Ok((parse(start)?, parse(end)?))
}
