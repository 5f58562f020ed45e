// forgec: Forge to C compiler driver

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Command};

use anyhow::{bail, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use crossterm::style::Stylize;

use forgec::codegen::{ForgeError, GeneratorConfig};
use forgec::parser::{lexer, parse_source, ParseError};
use forgec::runtime;

/// Forge compiler: lowers Forge programs to C
#[derive(ClapParser, Debug)]
#[command(name = "forgec")]
#[command(about = "Compile Forge programs to C", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the token stream of a source file
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the syntax tree of a source file
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Translate a program and report errors without writing anything
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Extra module search directory
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include: Vec<PathBuf>,
    },

    /// Translate a program to C and compile it
    Build {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output executable (defaults to the source file stem)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Extra module search directory
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include: Vec<PathBuf>,

        /// C compiler to invoke
        #[arg(long, value_name = "CC", default_value = "cc")]
        cc: String,

        /// Only write the C file and runtime headers
        #[arg(long)]
        emit_c: bool,
    },

    /// Compile a program into a temporary directory and run it
    Run {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Extra module search directory
        #[arg(short = 'I', long = "include", value_name = "DIR")]
        include: Vec<PathBuf>,

        /// C compiler to invoke
        #[arg(long, value_name = "CC", default_value = "cc")]
        cc: String,

        /// Arguments passed to the program
        #[arg(last = true)]
        args: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match execute(cli.command) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            process::exit(1);
        }
    }
}

/// Run one subcommand; the result is the process exit status.
fn execute(command: Commands) -> Result<i32> {
    match command {
        Commands::Tokens { file } => {
            let source = read_source(&file)?;
            let tokens = lexer::tokenize(&source).map_err(|err| ForgeError::from(ParseError::from(err)))?;
            for token in tokens {
                let location = token.location();
                println!("{:>4}:{:<3} {}", location.line, location.column, token);
            }
        }
        Commands::Parse { file } => {
            let source = read_source(&file)?;
            let program = parse_source(&source).map_err(ForgeError::from)?;
            println!("{:#?}", program);
        }
        Commands::Check { file, include } => {
            translate_file(&file, &include)?;
            eprintln!("{} {}", "ok".green(), file.display());
        }
        Commands::Build {
            file,
            output,
            include,
            cc,
            emit_c,
        } => {
            let c_source = translate_file(&file, &include)?;
            let output = output.unwrap_or_else(|| file.with_extension(""));
            let c_file = write_unit(&output.with_extension("c"), &c_source)?;
            if !emit_c {
                compile(&cc, &c_file, &output)?;
            }
        }
        Commands::Run {
            file,
            include,
            cc,
            args,
        } => {
            let c_source = translate_file(&file, &include)?;
            let dir = tempfile::tempdir().context("cannot create a build directory")?;
            let stem = file
                .file_stem()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("program"));
            let output = dir.path().join(stem);

            let c_file = write_unit(&output.with_extension("c"), &c_source)?;
            compile(&cc, &c_file, &output)?;

            let status = Command::new(&output)
                .args(&args)
                .status()
                .with_context(|| format!("cannot run {}", output.display()))?;
            return Ok(status.code().unwrap_or(1));
        }
    }
    Ok(0)
}

fn read_source(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))
}

fn translate_file(file: &Path, include: &[PathBuf]) -> Result<String> {
    let source = read_source(file)?;
    let config = include.iter().fold(
        GeneratorConfig::from_env().with_source_file(file),
        |config, dir| config.with_search_path(dir.clone()),
    );
    log::info!("search path: {:?}", config.search_dirs());
    Ok(forgec::translate(&source, config)?)
}

/// Write the C unit and the runtime headers beside it.
fn write_unit(c_file: &Path, c_source: &str) -> Result<PathBuf> {
    let dir = match c_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::write(c_file, c_source).with_context(|| format!("cannot write {}", c_file.display()))?;
    runtime::write_headers(&dir)
        .with_context(|| format!("cannot write runtime headers to {}", dir.display()))?;
    log::debug!("wrote {}", c_file.display());
    Ok(c_file.to_path_buf())
}

fn compile(cc: &str, c_file: &Path, output: &Path) -> Result<()> {
    let include_dir = c_file.parent().unwrap_or(Path::new("."));
    log::debug!("{} {} -o {}", cc, c_file.display(), output.display());
    let status = Command::new(cc)
        .arg(c_file)
        .arg("-I")
        .arg(if include_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            include_dir
        })
        .arg("-o")
        .arg(output)
        .arg("-lm")
        .status()
        .with_context(|| format!("cannot start C compiler '{}'", cc))?;
    if !status.success() {
        bail!("C compiler '{}' failed with {}", cc, status);
    }
    Ok(())
}
