use std::path::PathBuf;

xflags::xflags! {
    /// Bit-accurate single-cycle RV32IMF simulator.
    cmd RvSimArgs {
        /// Path to the .hex program to simulate.
        required program: PathBuf

        /// Maximum number of cycles before the run is cut off.
        optional -c, --max-cycles cycles: u64

        /// Record and print the per-cycle execution trace.
        optional -t, --trace

        /// Print the integer register file after the run.
        optional -r, --dump-registers

        /// Dump a word-aligned memory range after the run (may repeat).
        optional --dump-memory range: String

        /// Disable the M extension (multiply/divide decode).
        optional --no-m

        /// Disable the F extension (floating-point decode).
        optional --no-f

        /// Enables verbose mode, printing each cycle to stderr.
        /// Largely used for debugging purposes.
        optional -v, --verbose
    }
}
