//! sdflc - Command-line compiler for SDFL scenes

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sdfl_engine::{
    Compilation, Compiler, GeneratorOptions, InputKind, OutputPaths, ProgramSubmission,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sdflc")]
#[command(about = "Compile SDFL scenes to GLSL raymarching and voxelizing shaders", long_about = None)]
#[command(version)]
struct Cli {
    /// Log pass stages and dumps (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source or sequence file once
    Compile {
        /// Input file
        input: PathBuf,

        /// Treat the input as an instruction sequence
        #[arg(short, long)]
        seq: bool,

        /// Directory for out_frag.glsl, out_compute.glsl and ast_sequence.txt
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Generator options (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the token stream
        #[arg(long)]
        tokens: bool,

        /// Print the AST
        #[arg(long)]
        ast: bool,
    },

    /// Recompile whenever the input changes
    Watch {
        /// Input file
        input: PathBuf,

        /// Treat the input as an instruction sequence
        #[arg(short, long)]
        seq: bool,

        /// Debounce window in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval: u64,

        /// Directory for the output files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Generator options (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export the sequences of several source files into one file
    ExportSeq {
        /// Source files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Multi-document sequence file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Add to the output file instead of replacing it
        #[arg(short, long)]
        append: bool,
    },

    /// Build a relay submission payload for a source file
    Submit {
        /// Source file
        input: PathBuf,

        /// Program name
        #[arg(short, long)]
        name: String,

        /// Program description
        #[arg(short, long)]
        description: String,

        /// Tag (repeat; at least three)
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Preview image to embed
        #[arg(short, long)]
        preview: Option<PathBuf>,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            input,
            seq,
            out_dir,
            config,
            tokens,
            ast,
        } => {
            run_compile(&input, InputKind::from_flag(seq), &out_dir, config.as_deref(), tokens, ast)?;
        }
        Commands::Watch {
            input,
            seq,
            interval,
            out_dir,
            config,
        } => {
            run_watch(&input, InputKind::from_flag(seq), interval, &out_dir, config.as_deref())?;
        }
        Commands::ExportSeq {
            inputs,
            output,
            append,
        } => {
            run_export(&inputs, &output, append)?;
        }
        Commands::Submit {
            input,
            name,
            description,
            tags,
            preview,
            output,
        } => {
            run_submit(&input, name, description, tags, preview.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_compiler(config: Option<&Path>) -> Result<Compiler> {
    let options = match config {
        Some(path) => GeneratorOptions::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GeneratorOptions::default(),
    };
    tracing::debug!("Generator options: {:?}", options);
    Ok(Compiler::new(options))
}

fn run_compile(
    input: &Path,
    kind: InputKind,
    out_dir: &Path,
    config: Option<&Path>,
    show_tokens: bool,
    show_ast: bool,
) -> Result<()> {
    let compiler = load_compiler(config)?;
    let compilation = compiler
        .build(input, kind, &OutputPaths::in_dir(out_dir))
        .with_context(|| format!("Failed to compile {}", input.display()))?;

    if show_tokens {
        for token in &compilation.tokens {
            println!("{}", token);
        }
    }
    if show_ast {
        println!("{}", compilation.program);
    }
    report(&compilation);
    Ok(())
}

fn run_watch(
    input: &Path,
    kind: InputKind,
    interval: u64,
    out_dir: &Path,
    config: Option<&Path>,
) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    let compiler = load_compiler(config)?;

    println!("Watching {} (Ctrl+C to stop)", input.display());
    sdfl_engine::watch_and_build(
        &compiler,
        input,
        kind,
        &OutputPaths::in_dir(out_dir),
        Some(interval),
        |result| {
            match result {
                Ok(compilation) => report(compilation),
                Err(e) => eprintln!("ERROR: {}", e),
            }
            ControlFlow::Continue(())
        },
    )
}

fn run_export(inputs: &[PathBuf], output: &Path, append: bool) -> Result<()> {
    let export = sdfl_engine::export_sequences(&Compiler::default(), inputs, output, append)?;

    for (path, error) in &export.failed {
        eprintln!("FAILED {}: {}", path.display(), error);
    }
    println!(
        "Exported {} of {} program(s) to {}",
        export.exported.len(),
        inputs.len(),
        output.display()
    );
    if export.exported.is_empty() {
        bail!("No program could be exported");
    }
    Ok(())
}

fn run_submit(
    input: &Path,
    name: String,
    description: String,
    tags: Vec<String>,
    preview: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let code = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let compilation = Compiler::default()
        .compile_source(&code)
        .with_context(|| format!("Failed to compile {}", input.display()))?;
    if compilation.has_errors() {
        bail!(
            "{} has {} generation error(s); fix them before submitting",
            input.display(),
            compilation.error_count()
        );
    }

    let mut submission =
        ProgramSubmission::new(name, description, code, &compilation).with_tags(tags);
    if let Some(path) = preview {
        let image = std::fs::read(path)
            .with_context(|| format!("Failed to read preview {}", path.display()))?;
        submission = submission.with_preview(&image);
    }
    let json = submission.to_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Submission written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn report(compilation: &Compilation) {
    if compilation.has_errors() {
        eprintln!(
            "Compiled with {} error(s) and {} warning(s)",
            compilation.error_count(),
            compilation.warning_count()
        );
    } else {
        println!(
            "OK - {} instructions, {} warning(s)",
            compilation.sequence.len(),
            compilation.warning_count()
        );
    }
}
