//! # sim6502 CLI
//!
//! Headless harness around the CPU core: load a raw machine-code image
//! into flat memory, reset, and run a fixed number of instructions,
//! printing the engine's trace line for each one.

use anyhow::Result;
use clap::Parser;
use sim6502_core::{Cpu, FlatMemory};
use std::path::PathBuf;

/// 6502 instruction-set simulator
#[derive(Parser, Debug)]
#[command(name = "sim6502")]
#[command(about = "Run a raw 6502 machine-code image", long_about = None)]
struct Args {
    /// Raw program image
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Address the image is loaded at, in hex
    #[arg(short, long, default_value = "0200", value_parser = parse_address)]
    base: u16,

    /// Reset vector target; defaults to the load address
    #[arg(short, long, value_parser = parse_address)]
    reset: Option<u16>,

    /// Number of instructions to execute
    #[arg(short, long, default_value_t = 100)]
    steps: usize,

    /// Print the CPU state line after every instruction
    #[arg(short, long)]
    trace: bool,
}

fn parse_address(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches('$');
    let s = s.strip_prefix("0x").unwrap_or(s);
    u16::from_str_radix(s, 16).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let image = std::fs::read(&args.image_path)?;
    log::info!("loaded {} bytes from {:?}", image.len(), args.image_path);

    let mut memory = FlatMemory::new();
    memory.load(args.base, &image)?;
    memory.set_reset_vector(args.reset.unwrap_or(args.base));

    let mut cpu = Cpu::new(memory);
    cpu.reset();

    for _ in 0..args.steps {
        cpu.step();
        if args.trace {
            println!("{}", cpu);
        }
    }

    println!("{}", cpu);
    Ok(())
}
