//! LangVM C Backend Driver
//!
//! Command-line entry point: loads a JSON module description and emits C,
//! or prints the signature of a single type.

mod loader;

use clap::{Parser, Subcommand};
use log::info;
use lvm_cgen::generate_c;
use lvm_common::{CompilerError, PointerWidth};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lvmc")]
#[command(about = "LangVM C backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate C source from a module description
    Gen {
        /// Input module description (JSON)
        input: PathBuf,

        /// Output C file; defaults to the input path with a .c extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write declarations to a separate header file
        #[arg(long)]
        header: Option<PathBuf>,

        /// Target pointer width in bytes (4 or 8), overriding the module
        #[arg(long)]
        pointer_width: Option<u8>,

        /// Print the loaded module to stdout before generating
        #[arg(long)]
        dump: bool,
    },

    /// Print the identifier and signature of a type
    Signature {
        /// Input module description (JSON)
        input: PathBuf,

        /// Declared type name or basic mnemonic
        type_name: String,

        /// Target pointer width in bytes (4 or 8), overriding the module
        #[arg(long)]
        pointer_width: Option<u8>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let result = match cli.command {
        Commands::Gen { input, output, header, pointer_width, dump } => {
            gen_command(&input, output.as_deref(), header.as_deref(), pointer_width, dump)
        }
        Commands::Signature { input, type_name, pointer_width } => {
            signature_command(&input, &type_name, pointer_width)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_width(width: Option<u8>) -> Result<Option<PointerWidth>, CompilerError> {
    width.map(PointerWidth::try_from).transpose()
}

fn gen_command(
    input: &Path,
    output: Option<&Path>,
    header: Option<&Path>,
    pointer_width: Option<u8>,
    dump: bool,
) -> Result<(), CompilerError> {
    let module = loader::load_module(input, parse_width(pointer_width)?)?;
    if dump {
        print!("{}", module.dump()?);
    }

    let unit = generate_c(&module)?;
    let source = match output {
        Some(path) => path.to_path_buf(),
        None => input.with_extension("c"),
    };
    unit.write_to(&source, header)?;

    match header {
        Some(header) => info!("wrote {} and {}", source.display(), header.display()),
        None => info!("wrote {}", source.display()),
    }
    Ok(())
}

fn signature_command(input: &Path, type_name: &str, pointer_width: Option<u8>) -> Result<(), CompilerError> {
    let mut module = loader::load_module(input, parse_width(pointer_width)?)?;
    let id = match lvm_ir::BasicType::from_mnemonic(type_name) {
        Some(basic) => module.types.basic(basic),
        None => module
            .types
            .lookup(type_name)
            .ok_or_else(|| CompilerError::load_error(format!("unknown type '{type_name}'")))?,
    };
    let signature = module.types.signature(id)?;
    let codes: Vec<String> = signature.codes().iter().map(|c| format!("{c:#o}")).collect();
    println!("{} {} [{}]", module.types.identify(id)?, signature, codes.join(" "));
    Ok(())
}
