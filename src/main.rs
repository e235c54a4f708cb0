// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// main.rs
//
// Command-line driver for the Tomasulo scheduling simulator. Reads a
// textual trace, runs it to completion, and prints a summary (plus an
// optional per-cycle visualization and a JSON dump of final instruction
// timestamps).

use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tomasulo_sim::tomasulo::{CdbArbitration, TomasuloConfig, TomasuloEngine};
use tomasulo_sim::trace::{OpClass, OpcodeOracle};
use tomasulo_sim::trace_loader::parse_trace;
use tomasulo_sim::utils::logger::{LogLevel, Logger};
use tomasulo_sim::visualization::{CycleVisualizer, OutputFormat};

const DEMO_TRACE: &str = "\
# i0: r1 = add (independent)\n\
0 0x1000 -,-,- 1,-\n\
# i1: r3 = add r1, r2 (RAW on i0's r1)\n\
0 0x1004 1,2,- 3,-\n\
# i2: FP multiply, independent\n\
1 0x1008 -,-,- 4,-\n\
# i3: store using i1's result\n\
3 0x100c 3,-,- -,-\n\
";

/// Opcode classification for the demo trace format: 0 = integer compute,
/// 1 = floating-point compute, 2 = load, 3 = store, 4 = conditional
/// branch, 5 = unconditional jump, 6 = trap.
struct DemoIsa;

impl OpcodeOracle for DemoIsa {
    fn is_uncond_ctrl(&self, opcode: u32) -> bool {
        opcode == 5
    }
    fn is_cond_ctrl(&self, opcode: u32) -> bool {
        opcode == 4
    }
    fn is_icomp(&self, opcode: u32) -> bool {
        opcode == 0
    }
    fn is_fcomp(&self, opcode: u32) -> bool {
        opcode == 1
    }
    fn is_load(&self, opcode: u32) -> bool {
        opcode == 2
    }
    fn is_store(&self, opcode: u32) -> bool {
        opcode == 3
    }
    fn is_trap(&self, opcode: u32) -> bool {
        opcode == 6
    }
}

#[derive(Parser)]
#[command(name = "tomasulo-sim")]
#[command(about = "A cycle-accurate Tomasulo out-of-order scheduling simulator")]
#[command(version)]
struct Cli {
    /// Input trace file (see trace_loader for the textual format). Falls
    /// back to a small built-in demo trace when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Integer reservation station capacity
    #[arg(long, default_value = "4")]
    rs_int: usize,

    /// Floating-point reservation station capacity
    #[arg(long, default_value = "2")]
    rs_fp: usize,

    /// Integer functional unit count
    #[arg(long, default_value = "2")]
    fu_int: usize,

    /// Floating-point functional unit count
    #[arg(long, default_value = "1")]
    fu_fp: usize,

    /// Integer functional unit latency in cycles
    #[arg(long, default_value = "4")]
    latency_int: u64,

    /// Floating-point functional unit latency in cycles
    #[arg(long, default_value = "9")]
    latency_fp: u64,

    /// Instruction fetch queue capacity
    #[arg(long, default_value = "10")]
    ifq_size: usize,

    /// Number of architectural registers
    #[arg(long, default_value = "32")]
    total_regs: u16,

    /// Reproduce the original CDB-overwrite-on-collision behavior instead
    /// of stalling the losing completion
    #[arg(long)]
    stall_on_cdb_collision: bool,

    /// Watchdog cycle cap; the run aborts with an error past this many
    /// cycles instead of looping forever on a malformed trace
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Print a per-cycle visualization while running
    #[arg(short, long)]
    visualize: bool,

    /// Visualization format when --visualize is set
    #[arg(long, default_value = "text")]
    format: String,

    /// Write final per-instruction timestamps to this file as JSON
    #[arg(long)]
    dump_json: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_log_level(level: &str) -> LogLevel {
    match level.to_lowercase().as_str() {
        "error" => LogLevel::Error,
        "warn" | "warning" => LogLevel::Warning,
        "debug" | "trace" => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

fn parse_format(format: &str) -> OutputFormat {
    match format.to_lowercase().as_str() {
        "csv" => OutputFormat::Csv,
        "json" => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

fn dump_json_report(engine: &TomasuloEngine, total_cycles: u64, path: &PathBuf) -> std::io::Result<()> {
    #[derive(serde::Serialize)]
    struct InstrReport {
        index: usize,
        pc: u32,
        dispatch_cycle: u64,
        issue_cycle: u64,
        execute_cycle: u64,
        cdb_cycle: u64,
    }

    #[derive(serde::Serialize)]
    struct Report {
        total_cycles: u64,
        instructions: Vec<InstrReport>,
    }

    let instructions = engine
        .instructions()
        .iter()
        .map(|i| InstrReport {
            index: i.index,
            pc: i.pc,
            dispatch_cycle: i.dispatch_cycle,
            issue_cycle: i.issue_cycle,
            execute_cycle: i.execute_cycle,
            cdb_cycle: i.cdb_cycle,
        })
        .collect();

    let report = Report { total_cycles, instructions };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json)
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match parse_log_level(&cli.log_level) {
            LogLevel::Debug => log::LevelFilter::Trace,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        })
        .init();

    let mut logger = Logger::new(None, parse_log_level(&cli.log_level));
    logger.info("starting tomasulo-sim");

    let source = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                eprintln!("{} failed to read {}: {}", "error:".red(), path.display(), e);
                std::process::exit(1);
            },
        },
        None => DEMO_TRACE.to_string(),
    };

    let chain = match parse_trace(&source) {
        Ok(chain) => chain,
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);
            std::process::exit(1);
        },
    };

    let config = TomasuloConfig::new(cli.total_regs)
        .with_ifq_size(cli.ifq_size)
        .with_rs_sizes(cli.rs_int, cli.rs_fp)
        .with_fu_counts(cli.fu_int, cli.fu_fp)
        .with_latencies(cli.latency_int, cli.latency_fp)
        .with_cdb_arbitration(if cli.stall_on_cdb_collision {
            CdbArbitration::StallLoser
        } else {
            CdbArbitration::OverwriteOnCollision
        })
        .with_max_cycles(cli.max_cycles);

    let mut engine = match TomasuloEngine::new(chain, config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);
            std::process::exit(1);
        },
    };

    let oracle = DemoIsa;
    let visualizer = CycleVisualizer { colorize: true, format: parse_format(&cli.format) };

    let total_cycles = if cli.visualize {
        let mut cycle = 1;
        loop {
            let done = match engine.step(&oracle) {
                Ok(done) => done,
                Err(e) => {
                    eprintln!("{} {}", "error:".red(), e);
                    std::process::exit(1);
                },
            };
            print!("{}", visualizer.render(&engine, cycle));
            cycle += 1;
            if done {
                break cycle - 1;
            }
        }
    } else {
        match engine.run(&oracle) {
            Ok(cycles) => cycles,
            Err(e) => {
                eprintln!("{} {}", "error:".red(), e);
                std::process::exit(1);
            },
        }
    };

    println!("{}", format!("simulation complete in {} cycles", total_cycles).green().bold());

    let retired = engine
        .instructions()
        .iter()
        .filter(|i| i.cdb_cycle != 0 || oracle.classify(i.opcode) == OpClass::CondCtrl || oracle.classify(i.opcode) == OpClass::UncondCtrl)
        .count();
    println!("{} / {} instructions retired", retired, engine.instructions().len());

    if let Some(path) = &cli.dump_json {
        if let Err(e) = dump_json_report(&engine, total_cycles, path) {
            eprintln!("{} failed to write {}: {}", "error:".red(), path.display(), e);
            std::process::exit(1);
        }
        logger.info(&format!("wrote report to {}", path.display()));
    }
}
