use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use implgen::codegen::insn::disassemble;
use implgen::pool::ClassHandle;
use implgen::{Compiler, Config, JsonModelBuilder, WriteMode};

/// Environment variable consulted before `RUST_LOG`
const LOG_ENV: &str = "IMPLGEN_LOG";

#[derive(Parser)]
#[command(name = "implgen")]
#[command(about = "Generate implementation classes for annotated JVM types")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate classes for every annotated type of the model
    Generate {
        /// Serialized type model; later files override earlier declarations
        #[arg(short, long = "model", value_name = "JSON", required = true)]
        models: Vec<PathBuf>,

        /// Source root searched when a class must be compiled on demand
        #[arg(short = 'i', long = "input", value_name = "DIR")]
        inputs: Vec<PathBuf>,

        /// Binary classpath (directories and jars, platform separator)
        #[arg(long, value_name = "PATH")]
        classpath: Option<String>,

        /// Output directory for .class files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,

        /// Java release the generated classes target
        #[arg(long, value_name = "N", default_value_t = 8)]
        release: u16,

        /// Fail on unresolvable supertypes instead of skipping them
        #[arg(long)]
        validate: bool,

        /// Only prefixed method names (get/set/is/has/keeps) map to fields
        #[arg(long)]
        no_fluent: bool,

        /// Refuse to replace existing class files
        #[arg(long)]
        no_clobber: bool,

        /// javac executable used for on-demand compilation
        #[arg(long, value_name = "PATH", default_value = "javac")]
        javac: PathBuf,
    },

    /// Print a summary and disassembly of a class file
    Dump {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate { models, inputs, classpath, output, release, validate, no_fluent, no_clobber, javac } => {
            let mut config = Config::from_env()
                .with_language_level(release)
                .with_validate(validate)
                .with_fluent_naming(!no_fluent)
                .with_javac(javac);
            if let Some(classpath) = &classpath {
                config = config.with_class_path(classpath);
            }
            for input in inputs {
                config = config.with_source_root(input);
            }
            let mode = if no_clobber { WriteMode::CreateNew } else { WriteMode::Overwrite };
            generate(config, &models, &output, mode)?;
        }
        Commands::Dump { input } => {
            dump(&input)?;
        }
    }

    Ok(())
}

fn generate(config: Config, models: &[PathBuf], output: &PathBuf, mode: WriteMode) -> Result<()> {
    let builder = models.iter().fold(JsonModelBuilder::new(), |builder, model| builder.with_file(model));
    let session = Compiler::new(config).compile_with(&builder).context("generation failed")?;
    let results = session.results();
    if results.is_empty() {
        println!("Nothing to generate");
        return Ok(());
    }
    for result in results.iter() {
        let path = result
            .write_to_file(output, mode)
            .with_context(|| format!("unable to write {}", result.qualified_name()))?;
        println!("Generated {}", path.display());
    }
    Ok(())
}

fn dump(input: &PathBuf) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("unable to read {}", input.display()))?;
    if bytes.len() < 4 {
        bail!("{} is not a class file", input.display());
    }
    let class = ClassHandle::from_bytes(&bytes)?;
    let file = class.class_file();

    print!("class {}", class.name());
    if let Some(superclass) = class.superclass()? {
        print!(" extends {superclass}");
    }
    let interfaces = class.interfaces()?;
    if !interfaces.is_empty() {
        let names: Vec<String> = interfaces.iter().map(ToString::to_string).collect();
        print!(" implements {}", names.join(", "));
    }
    println!();
    println!("  version {}.{}, flags 0x{:04x}", file.major_version, file.minor_version, class.access_flags());

    for field in class.fields()? {
        println!("  field {} {} (0x{:04x})", field.ty, field.name, field.access_flags);
    }
    for (sig, info) in class.methods()?.iter().zip(&file.methods) {
        println!("  method {}{} (0x{:04x})", sig.name, sig.descriptor(), sig.access_flags);
        if let Some(code) = info.code(&file.constant_pool)? {
            println!("    stack={}, locals={}", code.max_stack, code.max_locals);
            for (pc, text) in disassemble(&code.code, &file.constant_pool)? {
                println!("    {pc:>4}: {text}");
            }
        }
    }
    Ok(())
}
