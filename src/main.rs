use clap::Parser;
use std::process;

use haki::repl::Repl;
use haki::script;

#[derive(Parser)]
#[command(name = "haki")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Haki - a small embeddable Lisp", long_about = None)]
struct Cli {
    /// Script file to execute; omit to start the REPL
    file: Option<String>,

    /// Arguments passed through to the script as *args*
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.file {
        Some(file) => script::run_script(&file, cli.args),
        None => Repl::new().run(),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}
