use std::path::PathBuf;
use std::process;

use clap::{Args, Parser as ClapParser, Subcommand};
use sha2::{Digest, Sha256};

use replica_lang::asm;
use replica_lang::console::{print_state, Console};
use replica_lang::tape::{Delimiters, Program};
use replica_lang::vm::Machine;

#[derive(ClapParser)]
#[command(name = "replica", version, about = "The Replica rewriting machine and assembler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DelimiterArgs {
    /// Character separating instructions in a compiled tape
    #[arg(long, default_value_t = ';')]
    instruction_delimiter: char,
    /// Character separating the four fields of an instruction
    #[arg(long, default_value_t = '`')]
    argument_delimiter: char,
}

impl DelimiterArgs {
    fn delimiters(&self) -> Delimiters {
        Delimiters {
            instruction: self.instruction_delimiter,
            argument: self.argument_delimiter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a directive source file into a tape
    Compile {
        /// Path to .rvm directive source
        file: PathBuf,
        /// Write the tape here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Compare against a previously compiled tape and warn when
        /// nothing changed
        #[arg(long)]
        check: Option<PathBuf>,
        #[command(flatten)]
        delims: DelimiterArgs,
    },
    /// Show a numbered listing of a compiled tape
    Format {
        /// Path to a compiled tape
        file: PathBuf,
        /// Emit the decoded instructions as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        delims: DelimiterArgs,
    },
    /// Compile (or load) a program and run it for a number of cycles
    Run {
        /// Path to directive source, or a compiled tape with --compiled
        file: PathBuf,
        /// Initial data store contents
        #[arg(short, long, default_value = "")]
        data: String,
        /// Number of cycles to execute
        #[arg(short, long, default_value_t = 1)]
        steps: usize,
        /// Only print the final state
        #[arg(short, long)]
        quiet: bool,
        /// The file is already a compiled tape
        #[arg(long)]
        compiled: bool,
        #[command(flatten)]
        delims: DelimiterArgs,
    },
    /// Step a program interactively
    Step {
        /// Path to directive source, or a compiled tape with --compiled
        file: PathBuf,
        /// Initial data store contents
        #[arg(short, long, default_value = "")]
        data: String,
        /// The file is already a compiled tape
        #[arg(long)]
        compiled: bool,
        #[command(flatten)]
        delims: DelimiterArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Compile {
            file,
            out,
            check,
            delims,
        } => cmd_compile(&file, out.as_deref(), check.as_deref(), &delims.delimiters()),
        Commands::Format { file, json, delims } => cmd_format(&file, json, &delims.delimiters()),
        Commands::Run {
            file,
            data,
            steps,
            quiet,
            compiled,
            delims,
        } => cmd_run(&file, &data, steps, quiet, compiled, &delims.delimiters()),
        Commands::Step {
            file,
            data,
            compiled,
            delims,
        } => cmd_step(&file, &data, compiled, &delims.delimiters()),
    };
    process::exit(exit_code);
}

const MAX_SOURCE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

fn read_source(path: &std::path::Path) -> Result<(String, String), i32> {
    let filename = path.to_string_lossy().to_string();

    // Check file size before reading
    match std::fs::metadata(path) {
        Ok(meta) => {
            if meta.len() > MAX_SOURCE_SIZE {
                eprintln!(
                    "Error: file {} is too large ({} bytes, max {} bytes)",
                    filename,
                    meta.len(),
                    MAX_SOURCE_SIZE
                );
                return Err(1);
            }
        }
        Err(e) => {
            eprintln!("Error: cannot read file {}: {}", filename, e);
            return Err(1);
        }
    }

    match std::fs::read_to_string(path) {
        Ok(source) => Ok((source, filename)),
        Err(e) => {
            eprintln!("Error: cannot read file {}: {}", filename, e);
            Err(1)
        }
    }
}

fn tape_digest(tape: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tape.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn cmd_compile(
    path: &std::path::Path,
    out: Option<&std::path::Path>,
    check: Option<&std::path::Path>,
    delims: &Delimiters,
) -> i32 {
    let (source, filename) = match read_source(path) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let compiled = match asm::compile(&source) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", filename, e);
            return 1;
        }
    };

    for diag in &compiled.diagnostics {
        eprintln!("  {}", diag);
    }
    for (i, inst) in compiled.program.instructions.iter().enumerate() {
        for field in [&inst.search, &inst.replacement] {
            if field.contains(delims.instruction) || field.contains(delims.argument) {
                eprintln!(
                    "  [WARNING] instruction {} contains a delimiter character; the tape will not decode cleanly",
                    i
                );
            }
        }
    }

    let tape = compiled.program.serialize(delims);

    match out {
        Some(out_path) => {
            if let Err(e) = std::fs::write(out_path, &tape) {
                eprintln!("Error: cannot write {}: {}", out_path.display(), e);
                return 1;
            }
        }
        None => println!("{}", tape),
    }
    eprintln!(
        "{}: {} instruction(s), sha256 {}...",
        filename,
        compiled.program.len(),
        &tape_digest(&tape)[..16]
    );

    if let Some(check_path) = check {
        match std::fs::read_to_string(check_path) {
            Ok(old) => {
                if old.trim_end() == tape {
                    eprintln!("  [WARNING] no changes against {}", check_path.display());
                }
            }
            Err(e) => {
                eprintln!("Error: cannot read {}: {}", check_path.display(), e);
                return 1;
            }
        }
    }
    0
}

fn cmd_format(path: &std::path::Path, json: bool, delims: &Delimiters) -> i32 {
    let (text, filename) = match read_source(path) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let program = match Program::parse(text.trim_end(), delims) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}: {}", filename, e);
            return 1;
        }
    };

    if json {
        match serde_json::to_string_pretty(&program.instructions) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        println!("{}", program.listing(delims));
    }
    0
}

/// Compile a source file, or decode it directly when it is already a
/// tape, then start a machine over `data`.
fn load_machine(
    path: &std::path::Path,
    data: &str,
    compiled: bool,
    delims: &Delimiters,
) -> Result<Machine, i32> {
    let (text, filename) = read_source(path)?;

    let program = if compiled {
        Program::parse(text.trim_end(), delims).map_err(|e| {
            eprintln!("{}: {}", filename, e);
            1
        })?
    } else {
        let result = asm::compile(&text).map_err(|e| {
            eprintln!("{}: {}", filename, e);
            1
        })?;
        for diag in &result.diagnostics {
            eprintln!("  {}", diag);
        }
        result.program
    };

    Machine::new(program, data).map_err(|e| {
        eprintln!("{}: {}", filename, e);
        1
    })
}

fn cmd_run(
    path: &std::path::Path,
    data: &str,
    steps: usize,
    quiet: bool,
    compiled: bool,
    delims: &Delimiters,
) -> i32 {
    let mut machine = match load_machine(path, data, compiled, delims) {
        Ok(m) => m,
        Err(code) => return code,
    };

    for _ in 0..steps {
        if !quiet {
            print_state(&machine, delims);
        }
        if let Err(e) = machine.step() {
            eprintln!("fault: {}", e);
            return 1;
        }
    }
    print_state(&machine, delims);
    0
}

fn cmd_step(path: &std::path::Path, data: &str, compiled: bool, delims: &Delimiters) -> i32 {
    let mut machine = match load_machine(path, data, compiled, delims) {
        Ok(m) => m,
        Err(code) => return code,
    };

    let mut console = Console::new();
    if let Err(e) = console.run(&mut machine, delims) {
        eprintln!("Error: {}", e);
        return 1;
    }
    0
}
