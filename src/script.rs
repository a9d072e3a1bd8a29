//! Script runner: load a file, strip a leading shebang, run it behind the
//! core library. Errors surface to the caller, which reports on stderr and
//! exits non-zero.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;

use crate::core::CORE;
use crate::interp::{Interpreter, Mode};
use crate::reader::Reader;
use crate::error::Error;

static SHEBANG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#!.*$").expect("shebang pattern"));

pub fn run_script(path: &str, args: Vec<String>) -> Result<(), Error> {
    let source =
        fs::read_to_string(path).map_err(|e| Error::IOError(e.to_string()))?;
    let script = SHEBANG_RE.replace_all(&source, "");

    let mut interp = Interpreter::with_args(Mode::Tco, args);
    interp.set_version_info(
        env!("CARGO_PKG_VERSION"),
        option_env!("HAKI_GIT_COMMIT").unwrap_or("dev"),
        option_env!("HAKI_BUILD_DATE").unwrap_or("dev"),
    );

    let mut reader = Reader::with_forms(&[CORE, script.as_ref()]);
    interp.run(&mut reader)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_script(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("haki-script-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn runs_a_script_with_a_shebang() {
        let path = write_script(
            "hello.haki",
            "#!/usr/bin/env haki\n(def x (inc 41))\n",
        );
        run_script(path.to_str().unwrap(), Vec::new()).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = run_script("/no/such/script.haki", Vec::new());
        assert!(matches!(result, Err(Error::IOError(_))));
    }

    #[test]
    fn script_errors_propagate() {
        let path = write_script("broken.haki", "(this-does-not-exist)\n");
        let result = run_script(path.to_str().unwrap(), Vec::new());
        assert!(matches!(result, Err(Error::LookupError(_))));
    }
}
