use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use parking_lot::Mutex;

use lslc::compiler::{self, CompileOptions};
use lslc::settings::{self, CompilerSettings};
use lslc::{CompileError, CompileUnit};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "lslc", about = "Front end for LSL-family scripts", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding lslc.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the logical token lines of a script
    Tokens { file: PathBuf },
    /// Compile scripts and report the first error of each
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Compile a script and print the compile unit as JSON
    Dump {
        file: PathBuf,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn setup_logging(verbose: u8, quiet: bool, log_format: LogFormat) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        EnvFilter::new(match verbose {
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry().with(formatter).with(filter).init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry().with(formatter.json()).with(filter).init();
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1)
}

fn compile_options(config_dir: Option<PathBuf>) -> CompileOptions {
    let dir = config_dir.unwrap_or_else(lslc::paths::default_config_dir);
    let loaded: CompilerSettings = settings::load_settings(&dir).unwrap_or_else(|e| fail(e));
    loaded.compile_options().unwrap_or_else(|e| fail(e))
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

// ── Commands ─────────────────────────────────────────────────────

fn cmd_tokens(file: &Path) {
    let source = std::fs::read_to_string(file).unwrap_or_else(|e| fail(CompileError::io(&display_name(file), &e)));
    match compiler::tokenize(&source) {
        Ok(lines) => {
            for line in lines {
                println!("{:>5}  {line}", line.line);
            }
        }
        Err(e) => fail(e.format_with_file(&display_name(file))),
    }
}

fn cmd_check(files: &[PathBuf], options: &CompileOptions) {
    let results: Mutex<Vec<(usize, Result<CompileUnit, CompileError>)>> = Mutex::new(Vec::with_capacity(files.len()));
    std::thread::scope(|scope| {
        for (index, file) in files.iter().enumerate() {
            let results = &results;
            scope.spawn(move || {
                let outcome = compiler::compile_file(file, options);
                results.lock().push((index, outcome));
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);
    let mut failed = 0usize;
    for (file, (_, outcome)) in files.iter().zip(results) {
        let name = display_name(file);
        match outcome {
            Ok(unit) => println!(
                "{name}: ok ({} globals, {} functions, {} states)",
                unit.globals.len(),
                unit.functions.len(),
                unit.states.len()
            ),
            Err(e) => {
                failed += 1;
                println!("{}", e.format_with_file(&name));
            }
        }
    }
    if failed > 0 {
        eprintln!("{failed} of {} scripts failed", files.len());
        process::exit(1);
    }
}

fn cmd_dump(file: &Path, compact: bool, options: &CompileOptions) {
    let unit = compiler::compile_file(file, options).unwrap_or_else(|e| fail(e.format_with_file(&display_name(file))));
    let json = if compact {
        serde_json::to_string(&unit)
    } else {
        serde_json::to_string_pretty(&unit)
    };
    println!("{}", json.unwrap_or_else(|e| fail(e)));
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet, cli.log_format);

    match cli.command {
        Commands::Tokens { file } => cmd_tokens(&file),
        Commands::Check { files } => cmd_check(&files, &compile_options(cli.config_dir)),
        Commands::Dump { file, compact } => cmd_dump(&file, compact, &compile_options(cli.config_dir)),
    }
}
