//! Output primitives.

use itertools::Itertools;

use crate::error::Error;
use crate::expr::Expression;

use super::Table;

pub fn install(table: &mut Table) {
    table.insert("prn", prn);
}

/// `(prn v ... vs)` — prints the arguments space-separated with a trailing
/// newline. Strings print unquoted with `\n`, `\t`, `\r` escapes expanded;
/// everything else prints the way the value model does.
fn prn(args: &[Expression]) -> Result<Expression, Error> {
    let line = args.iter().map(|a| a.print_for_output()).join(" ");
    println!("{}", line);
    Ok(Expression::nil())
}
