use conductor_cluster::{Confirm, OpsError, Result};
use std::io::{self, BufRead, Write};

/// Prompts on stdout and reads one answer line from stdin
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{} [y/n]: ", prompt);
        io::stdout().flush()?;
        read_answer(&mut io::stdin().lock())
    }
}

/// Read a single answer line; the rest of the input is left unread
fn read_answer(reader: &mut impl BufRead) -> Result<bool> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    parse_answer(&line)
}

fn parse_answer(line: &str) -> Result<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        other => Err(OpsError::Precondition(format!(
            "Unrecognised answer {:?}, expected y or n",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n").unwrap());
        assert!(parse_answer(" YES ").unwrap());
        assert!(!parse_answer("n\n").unwrap());
        assert!(parse_answer("maybe\n").is_err());
        assert!(parse_answer("\n").is_err());
    }

    #[test]
    fn test_read_answer_takes_first_line_only() {
        let mut input = io::Cursor::new("yes\nno\n");
        assert!(read_answer(&mut input).unwrap());
        assert!(!read_answer(&mut input).unwrap());
        // EOF reads as an empty answer
        assert!(read_answer(&mut input).is_err());
    }
}
