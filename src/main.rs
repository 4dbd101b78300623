use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Env};
use log::{info, LevelFilter};

use cachesim_dir::trace::{self, TraceEntry};
use cachesim_dir::{Protocol, Simulation, SystemSpec, Verbosity};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProtocolArg {
    Msi,
    Mesi,
}

#[derive(Parser, Debug)]
#[command(version, about = "Directory based MSI/MESI cache coherence simulator")]
struct Args {
    /// Trace file to replay
    trace: PathBuf,

    /// Coherence protocol, MESI adds the Exclusive state
    #[arg(long, value_enum, default_value_t = ProtocolArg::Msi)]
    protocol: ProtocolArg,

    /// Lines per cache, a power of two
    #[arg(long, default_value_t = 512)]
    cache_size: u32,

    /// Bytes per line, a power of two
    #[arg(long, default_value_t = 4)]
    line_size: u32,

    /// Number of cores on the ring
    #[arg(long, default_value_t = 4)]
    caches: usize,

    /// Write the key statistics to out_<trace name>
    #[arg(long)]
    save: bool,

    /// Log every instruction
    #[arg(short, long)]
    verbose: bool,
}

const LOG_LEVEL_ENV: &str = "CACHESIM_LOG_LEVEL";

fn toggle_verbose(verbosity: &mut Verbosity) {
    let level = verbosity.toggle();
    println!("switching line by line output to {level}");
    log::set_max_level(level);
}

fn main() -> Result<()> {
    let args = Args::parse();

    // logging, the level variable only picks the starting point
    let env = Env::default()
        .filter_or(LOG_LEVEL_ENV, "trace")
        .write_style_or("CACHESIM_LOG_STYLE", "always");
    Builder::from_env(env).filter_level(LevelFilter::Trace).init();
    let mut verbosity = Verbosity::new(std::env::var(LOG_LEVEL_ENV).ok().as_deref(), args.verbose);
    log::set_max_level(verbosity.level());

    let specs = SystemSpec {
        protocol: match args.protocol {
            ProtocolArg::Msi => Protocol::Msi,
            ProtocolArg::Mesi => Protocol::Mesi,
        },
        cache_size: args.cache_size,
        line_size: args.line_size,
        num_caches: args.caches,
    };

    // load instructions
    let text = trace::read_trace(&args.trace)
        .with_context(|| format!("reading trace {}", args.trace.display()))?;
    let entries = trace::parse_str(&text)
        .with_context(|| format!("parsing trace {}", args.trace.display()))?;

    let mut sim = Simulation::new(specs).context("invalid system configuration")?;

    // run simulation
    for entry in entries {
        match entry {
            TraceEntry::Access { core, instr } => {
                sim.execute(core, instr)?;
                info!("{}", sim.stats().key_report());
            }
            TraceEntry::Verbose => toggle_verbose(&mut verbosity),
            TraceEntry::HitRate => println!("hit rate: {}", sim.stats().hit_rate()),
            TraceEntry::Print => print!("{}", sim.dump()),
        }
    }

    // print stats
    println!("{}", sim.stats().key_report());
    if args.save {
        let out = sim
            .stats()
            .save(&args.trace)
            .context("saving statistics")?;
        println!("statistics written to {}", out.display());
    }
    Ok(())
}
