use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use tern::ast_printer::AstPrinter;
use tern::error::TernError;
use tern::interpreter::{Interpreter, DEFAULT_MAX_DEPTH};
use tern::morpher::Morpher;
use tern::parser::parse_source;
use tern::scanner::Scanner;
use tern::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tern language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the token stream as JSON
        #[arg(long)]
        json: bool,

        /// Keep whitespace, comments and line breaks
        #[arg(long)]
        raw: bool,
    },

    /// Parses a file and prints the AST of every top-level expression
    Parse { filename: PathBuf },

    /// Runs a file as a Tern program
    Run {
        filename: PathBuf,

        /// Directory imports are resolved against (defaults to the file's directory)
        #[arg(long)]
        module_root: Option<PathBuf>,

        /// Frames allowed on the call stack before the program fails
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

/// Native stack of the thread programs run on.  Sized so the frame limit
/// trips well before the host stack runs out.
const EVALUATOR_STACK_SIZE: usize = 512 * 1024 * 1024;

/// Maps a file into memory and validates it as UTF-8.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read once and copied out before the file could change.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;
    let text = std::str::from_utf8(&map)
        .map_err(TernError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", len, filename);

    Ok(text.to_string())
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("tern::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &Path, json: bool, raw: bool) -> Result<()> {
    let source = read_file(filename)?;
    let name = filename.display().to_string();

    let scanner = Scanner::new(&source, &name);
    let tokens: std::result::Result<Vec<Token>, TernError> = if raw {
        scanner.collect()
    } else {
        Morpher::new(scanner).collect()
    };

    let tokens = match tokens {
        Ok(tokens) => tokens,
        Err(e) => {
            debug!("Tokenization debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(65);
        }
    };

    if json {
        let dump = serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?;
        println!("{}", dump);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source = read_file(filename)?;

    match parse_source(&source, &filename.display().to_string()) {
        Ok(program) => {
            info!("Parsed {} expressions", program.len());
            for expr in &program {
                let ast = AstPrinter::print(expr);
                debug!("AST: {}", ast);
                println!("{}", ast);
            }
        }
        Err(e) => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(65);
        }
    }

    Ok(())
}

fn run(filename: &Path, module_root: Option<PathBuf>, max_depth: usize) -> Result<()> {
    let source = read_file(filename)?;

    let root = module_root.or_else(|| filename.parent().map(Path::to_path_buf));
    let mut interpreter = match root {
        Some(root) => Interpreter::with_module_root(root),
        None => Interpreter::new(),
    };
    interpreter.set_max_depth(max_depth);

    match interpreter.eval_source(&source, &filename.display().to_string()) {
        Ok(_) => {
            info!("Program executed successfully");
        }
        Err(e) if e.is_parse_time() => {
            debug!("Parse debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(65);
        }
        // The diagnostic has already been printed by the interpreter.
        Err(TernError::Uncaught { .. }) => std::process::exit(70),
        Err(e) => {
            debug!("Runtime debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(70);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize {
            filename,
            json,
            raw,
        } => tokenize(&filename, json, raw),

        Commands::Parse { filename } => parse(&filename),

        Commands::Run {
            filename,
            module_root,
            max_depth,
        } => {
            debug!("Spawning evaluator thread with {} byte stack", EVALUATOR_STACK_SIZE);
            let evaluator = thread::Builder::new()
                .name("evaluator".to_string())
                .stack_size(EVALUATOR_STACK_SIZE)
                .spawn(move || run(&filename, module_root, max_depth))
                .context("Failed to spawn evaluator thread")?;

            evaluator
                .join()
                .map_err(|_| anyhow!("Evaluator thread panicked"))?
        }
    }
}
