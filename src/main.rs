use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use treelox::ast_printer::AstPrinter;
use treelox::error::LoxError;
use treelox::parser::Parser;
use treelox::scanner::Scanner;
use treelox::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Log file used with --log
    #[arg(long, global = true, default_value = "treelox.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print tokens as JSON, one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints each statement's syntax tree
    Parse {
        filename: PathBuf,

        /// Print statements as JSON, one per line
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs a file as a program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

/// Maps a source file and validates it as UTF‑8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is read-only and copied out before `file` is dropped.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let text = std::str::from_utf8(&mmap)
        .map_err(LoxError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", text.len(), filename);

    Ok(text)
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("treelox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

/// Prints `error` and exits with its status code.
fn fail(error: LoxError) -> ! {
    debug!("Exiting after error: {}", error);
    eprintln!("{}", error);
    std::process::exit(error.exit_code());
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) if json => println!("{}", serde_json::to_string(&token)?),
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        std::process::exit(65);
    }

    Ok(())
}

fn parse(filename: &Path, json: bool) -> Result<()> {
    let source = read_file(filename)?;
    let (tokens, errors) = Scanner::new(&source).scan_all();

    if let Err(e) = LoxError::compile(errors) {
        fail(e);
    }

    match Parser::new(tokens).parse() {
        Ok(statements) => {
            for stmt in &statements {
                if json {
                    println!("{}", serde_json::to_string(stmt)?);
                } else {
                    println!("{}", AstPrinter::print_stmt(stmt));
                }
            }
        }
        Err(e) => fail(e),
    }

    Ok(())
}

fn repl() -> Result<()> {
    let mut lox = Lox::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        // Errors end the input, not the session.
        if let Err(e) = lox.run(&line) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {:#}", e);
        std::process::exit(74);
    }
}

fn try_main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger(&args.log_file)?;
    } else {
        // Minimal logger to avoid "no logger" noise.
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&filename, json)?,

        Commands::Parse { filename, json } => parse(&filename, json)?,

        Commands::Evaluate { filename } => {
            let source = read_file(&filename)?;
            match Lox::new().evaluate(&source) {
                Ok(value) => println!("{}", value),
                Err(e) => fail(e),
            }
        }

        Commands::Run { filename } => {
            let source = read_file(&filename)?;
            if let Err(e) = Lox::new().run(&source) {
                fail(e);
            }
            info!("Program executed successfully");
        }

        Commands::Repl => repl()?,
    }

    Ok(())
}
