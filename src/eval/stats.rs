use std::process;

use rvsim::cpu::{Cpu, CpuPolicy};
use rvsim::error::{SimulatorError, SimulatorResult};

fn main() {
    if let Err(e) = run_eval() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_eval() -> SimulatorResult<()> {
    let output_path = "demos/stats.csv".to_string();
    let mut writer = csv::Writer::from_path(&output_path).map_err(|e| {
        SimulatorError::IoError(std::io::Error::other(format!(
            "Failed to create CSV file '{}': {}",
            output_path, e
        )))
    })?;

    writer
        .write_record([
            "Program",
            "Cycles",
            "Instructions",
            "CPI",
            "Branches taken",
            "Branches not taken",
            "Loads",
            "Stores",
            "Halt cause",
        ])
        .map_err(|e| {
            SimulatorError::IoError(std::io::Error::other(format!(
                "Failed to write CSV header: {}",
                e
            )))
        })?;

    let programs = vec![
        "reference",
        "branch-not-taken",
        "shift-immediate",
        "mulh",
        "float-add",
        "div-by-zero",
    ];

    for program in programs {
        let path = format!("demos/{}.hex", program);

        let mut cpu = Cpu::new(CpuPolicy::default());
        cpu.load_program(&path)?;

        // The float demo reads preloaded FP registers
        if program == "float-add" {
            cpu.set_fp_register(1, 0x3F80_0000);
            cpu.set_fp_register(2, 0x4000_0000);
            cpu.set_fp_register(3, 0x4040_0000);
        }

        let result = cpu.run(100_000)?;
        let stats = cpu.statistics();

        writer
            .write_record([
                program.to_string(),
                stats.total_cycles.to_string(),
                stats.instructions_executed.to_string(),
                format!("{:.2}", stats.cpi),
                stats.branch_taken_count.to_string(),
                stats.branch_not_taken_count.to_string(),
                stats.memory_reads.to_string(),
                stats.memory_writes.to_string(),
                format!("{:?}", result.cause),
            ])
            .map_err(|e| {
                SimulatorError::IoError(std::io::Error::other(format!(
                    "Failed to write CSV row: {}",
                    e
                )))
            })?;
    }

    writer.flush()?;
    eprintln!("Wrote {}", output_path);
    Ok(())
}
