use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use rust_convt_shape::{
    ContextProperties, DeviceKind, OpError, OperatorRegistry, ProgramValidator,
    load_program_from_path,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Infer transposed convolution output shapes", long_about = None)]
struct Cli {
    /// Path to a JSON program description (variables and operators).
    program: PathBuf,
    /// Backend whose registered operators are used (cpu, mali-gpu, fpga).
    #[arg(long, default_value = "cpu")]
    backend: DeviceKind,
    /// Optional override for the tensor byte length limit.
    #[arg(long)]
    tensor_limit: Option<usize>,
    /// Print the inferred outputs as JSON.
    #[arg(long)]
    json: bool,
}

fn run() -> Result<(), OpError> {
    let cli = Cli::parse();
    let program = load_program_from_path(&cli.program)?;
    let mut context = ContextProperties {
        backend: cli.backend,
        ..ContextProperties::default()
    };
    if let Some(limit) = cli.tensor_limit {
        context.tensor_byte_length_limit = limit;
    }

    let registry = OperatorRegistry::with_defaults();
    let artifacts = ProgramValidator::new(&program, &registry, context).validate()?;

    if cli.json {
        println!("{}", artifacts.outputs_json()?);
        return Ok(());
    }

    println!(
        "Inferred `{}` on {} with {} variables and {} operations.",
        cli.program.display(),
        cli.backend,
        artifacts.scope.len(),
        program.ops.len()
    );
    for output in &artifacts.outputs {
        println!(
            "  - {} ({}): {:?} {:?}",
            output.variable, output.operation, output.descriptor.data_type, output.descriptor.shape
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
