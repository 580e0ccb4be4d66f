// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. `clap` parses the
// arguments; all work is delegated to Layer 2 (application).
//
//   init     — write a template options file
//   inspect  — dump dataset tiles as PNGs
//   load     — run the data loader and report batch shapes
//   plan     — print the network plan
//   forward  — build the network on Wgpu and run one forward
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, ForwardArgs, InitArgs, InspectArgs, LoadArgs, PlanArgs};

use crate::infra::options::{ExperimentOptions, OptionsStore};

type CliBackend = burn::backend::Wgpu;

#[derive(Parser, Debug)]
#[command(
    name = "multiscale-vocoder",
    version = "0.1.0",
    about = "Multiscale tile datasets and a truncated-top diffusion vocoder."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case; this layer only routes
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init(args)    => run_init(args),
            Commands::Inspect(args) => run_inspect(args),
            Commands::Load(args)    => run_load(args),
            Commands::Plan(args)    => run_plan(args),
            Commands::Forward(args) => run_forward(args),
        }
    }
}

fn run_init(args: InitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        anyhow::bail!("'{}' already exists; pass --force to overwrite", args.path.display());
    }
    OptionsStore::new(&args.path).save(&ExperimentOptions::default())?;
    println!("Wrote options template to {}", args.path.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    use crate::application::inspect_use_case::InspectUseCase;

    let written = InspectUseCase::new(args.into()).execute()?;
    println!("Wrote {} tiles", written.len());
    Ok(())
}

fn run_load(args: LoadArgs) -> Result<()> {
    use crate::application::load_use_case::LoadUseCase;

    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let report = LoadUseCase::new(args.into()).execute::<CliBackend>(&device)?;
    println!(
        "{} batches, {} samples, {} slots; HQ {:?}, LQ {:?}",
        report.batches, report.samples, report.slots, report.hq_shape, report.lq_shape
    );
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    use crate::application::vocoder_use_case::describe_network;

    let opts = OptionsStore::load_or_default(args.options.as_deref())?;
    for line in describe_network(&opts)? {
        println!("{line}");
    }
    Ok(())
}

fn run_forward(args: ForwardArgs) -> Result<()> {
    use crate::application::vocoder_use_case::ForwardUseCase;

    let opts   = OptionsStore::load_or_default(args.options.as_deref())?;
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);

    let report = ForwardUseCase::new((&args).into()).execute::<CliBackend>(&opts, &device)?;
    println!(
        "Output {:?}, top window {}..{}, {} parameters ({} trainable)",
        report.output_shape, report.bounds.start, report.bounds.stop, report.params, report.trainable_params
    );
    Ok(())
}
