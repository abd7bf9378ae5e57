#[macro_use]
extern crate clap;

use clap::{Arg, ArgGroup};
use expvm::{Executable, Vm};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Debug)]
enum Error {
    Io(std::io::Error, PathBuf),
    Compile(expc::Error),
    File(expfile::Error),
    Fault(expvm::Fault),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(err, path) => write!(f, "reading \"{}\" failed: {}", path.display(), err),
            Error::Compile(err) => write!(f, "{}", err),
            Error::File(err) => write!(f, "{}", err),
            Error::Fault(err) => write!(f, "runtime error: {}", err),
        }
    }
}

impl From<expc::Error> for Error {
    fn from(err: expc::Error) -> Error {
        Error::Compile(err)
    }
}

impl From<expfile::Error> for Error {
    fn from(err: expfile::Error) -> Error {
        Error::File(err)
    }
}

fn main() {
    let matches = app_from_crate!()
        .arg(
            Arg::with_name("PROGRAM")
                .help("Runs a previously compiled program file")
                .index(1),
        )
        .arg(
            Arg::with_name("arquivo")
                .short("a")
                .long("arquivo")
                .takes_value(true)
                .value_name("ARQUIVO")
                .help("Source file with the .exp extension"),
        )
        .arg(
            Arg::with_name("processar")
                .short("p")
                .long("processar")
                .help("Executes the program after compiling"),
        )
        .arg(
            Arg::with_name("otimizar")
                .short("o")
                .long("otimizar")
                .help("Optimizes the intermediate code"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Prints the intermediate artifacts"),
        )
        .arg(
            Arg::with_name("salvar")
                .short("s")
                .long("salvar")
                .takes_value(true)
                .value_name("SALVAR")
                .help("Writes the compiled program to this path"),
        )
        .group(
            ArgGroup::with_name("input")
                .args(&["PROGRAM", "arquivo"])
                .required(true),
        )
        .get_matches();

    let result = match matches.value_of("PROGRAM") {
        Some(program) => run_compiled(program, matches.is_present("verbose")),
        None => {
            let source = matches.value_of("arquivo").unwrap();
            let source_path = Path::new(source);
            if source_path.extension().and_then(|ext| ext.to_str()) != Some("exp") {
                eprintln!("error: the source file must have the '.exp' extension");
                process::exit(1);
            }
            if !source_path.is_file() {
                eprintln!("error: source file \"{}\" was not found", source);
                process::exit(1);
            }
            compile_source(
                source_path,
                matches.is_present("processar"),
                matches.is_present("otimizar"),
                matches.is_present("verbose"),
                matches.value_of("salvar"),
            )
        }
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn compile_source(
    path: &Path,
    execute: bool,
    optimize: bool,
    verbose: bool,
    save: Option<&str>,
) -> Result<(), Error> {
    let source =
        fs::read_to_string(path).map_err(|err| Error::Io(err, path.to_owned()))?;
    if verbose {
        println!("Source:\n{}", source);
    }

    let program = expc::parse(&source).map_err(expc::Error::from)?;
    if verbose {
        println!("AST:\n{:#?}\n", program);
    }

    let symbols = expc::analyze(&program).map_err(expc::Error::from)?;
    if verbose {
        println!("Symbol table:\n{}", symbols);
    }

    let mut tac = expc::lower(&program);
    if verbose {
        println!("Intermediate code:");
        for instr in &tac {
            println!("  {}", instr);
        }
        println!();
    }

    if optimize {
        tac = expc::optimize(tac);
        if verbose {
            println!("Optimized intermediate code:");
            for instr in &tac {
                println!("  {}", instr);
            }
            println!();
        }
    }

    let instructions = expc::emit(&tac, &symbols).map_err(expc::Error::from)?;
    let executable = Executable::new(instructions)
        .map_err(expc::Error::from)
        .map_err(Error::from)?;
    if verbose {
        print_listing(&executable);
    }

    if let Some(save) = save {
        expfile::write_file(save, &executable)?;
    }

    if execute {
        run_executable(&executable)?;
    }
    Ok(())
}

fn run_compiled(path: &str, verbose: bool) -> Result<(), Error> {
    let executable = expfile::read_file(path)?;
    if verbose {
        print_listing(&executable);
    }
    run_executable(&executable)
}

fn print_listing(executable: &Executable) {
    println!("Bytecode:");
    for (index, instruction) in executable.instructions().iter().enumerate() {
        println!("  {:4}  {}", index, instruction);
    }
    println!();
}

fn run_executable(executable: &Executable) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut vm = Vm::new();
    vm.run(executable, &mut stdout.lock()).map_err(Error::Fault)?;
    Ok(())
}
