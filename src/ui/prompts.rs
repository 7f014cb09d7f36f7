//! ui::prompts
//!
//! Line-oriented interactive prompts. Each prompt reads from stdin and
//! re-asks on invalid input; an empty line takes the default when one is
//! offered.

use std::io::{self, BufRead, Write};

/// Ask until `validate` accepts the answer.
///
/// Renders as `name [default]> `. An empty answer yields the default when
/// present, otherwise re-asks.
pub fn input<V>(name: &str, default: Option<&str>, validate: V) -> io::Result<String>
where
    V: Fn(&str) -> Result<String, String>,
{
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        match default {
            Some(default) => print!("{name} [{default}]> "),
            None => print!("{name}> "),
        }
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed during prompt",
            ));
        }
        let answer = line.trim();

        let answer = match (answer.is_empty(), default) {
            (true, Some(default)) => default,
            (true, None) => {
                eprintln!("a value is required");
                continue;
            }
            (false, _) => answer,
        };
        match validate(answer) {
            Ok(value) => return Ok(value),
            Err(reason) => eprintln!("{reason}"),
        }
    }
}

/// Yes/no confirmation, defaulting to no.
pub fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} [y/N]> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
