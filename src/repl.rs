//! Interactive REPL.
//!
//! The line editor feeds the incremental reader; forms are only lexed and
//! evaluated once a balanced top-level expression has accumulated, so
//! multi-line input just works. `:quit` exits with status 0.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::Error;
use crate::interp::{Interpreter, Mode};
use crate::reader::Reader;

const PROMPT_REPL: &str = "haki> ";
const PROMPT_MORE: &str = "   +> ";

pub struct Repl {
    interp: Interpreter,
}

impl Repl {
    pub fn new() -> Self {
        let mut interp = Interpreter::new(Mode::Tco);
        interp.set_version_info(
            env!("CARGO_PKG_VERSION"),
            option_env!("HAKI_GIT_COMMIT").unwrap_or("dev"),
            option_env!("HAKI_BUILD_DATE").unwrap_or("dev"),
        );
        Repl { interp }
    }

    pub fn run(&mut self) -> Result<(), Error> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| Error::IOError(e.to_string()))?;
        let _ = editor.load_history(".haki-history");

        println!("{}", "Haki Repl".bold());

        print!("* loading core");
        match self.interp.load_core() {
            Ok(()) => println!(" ... done."),
            Err(e) => {
                println!();
                eprintln!("{} {}", "ERROR:".red().bold(), e);
                return Err(e);
            }
        }
        println!("* type {} to exit", ":quit".yellow());

        let mut reader = Reader::new();
        let mut prompt = PROMPT_REPL;

        loop {
            match editor.readline(prompt) {
                Ok(line) => {
                    if line.trim() == ":quit" {
                        println!("bye");
                        break;
                    }

                    let _ = editor.add_history_entry(line.as_str());
                    reader.append(&line);

                    if reader.is_balanced() {
                        prompt = PROMPT_REPL;
                        self.read_all(&mut reader);
                    } else {
                        reader.append("\n");
                        prompt = PROMPT_MORE;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Drop whatever half-form is pending and start over.
                    reader = Reader::new();
                    prompt = PROMPT_REPL;
                    println!("{}", "input cancelled".dimmed());
                }
                Err(ReadlineError::Eof) => {
                    println!("bye");
                    break;
                }
                Err(e) => {
                    eprintln!("{} {:?}", "ERROR:".red().bold(), e);
                    break;
                }
            }
        }

        let _ = editor.save_history(".haki-history");
        Ok(())
    }

    /// Evaluates and prints every complete form sitting in the reader.
    fn read_all(&mut self, reader: &mut Reader) {
        loop {
            match reader.next_form() {
                Ok(Some(form)) => match self.interp.execute(&form) {
                    Ok(value) => println!("{}", value),
                    Err(e) => eprintln!("{} {}", "ERROR:".red().bold(), e),
                },
                Ok(None) => break,
                Err(e) => {
                    eprintln!("{} {}", "ERROR:".red().bold(), e);
                    break;
                }
            }
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
