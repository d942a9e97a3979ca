//! Interactive operator prompts

use crate::error::{AppError, Result};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Source of interactive answers.
#[cfg_attr(test, mockall::automock)]
pub trait Prompter {
    /// Pick one of `options`; returns its index.
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize>;
    fn input(&mut self, prompt: &str) -> Result<String>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
}

/// Line-oriented prompter over any reader/writer pair.
pub struct LinePrompter<R, W> {
    reader: R,
    writer: W,
}

impl LinePrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.writer, "{}", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(AppError::Prompt(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            )));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn select(&mut self, prompt: &str, options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(AppError::Internal(anyhow::anyhow!(
                "nothing to choose from for '{}'",
                prompt
            )));
        }

        writeln!(self.writer, "{}", prompt)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.writer, "  {}) {}", i + 1, option)?;
        }

        loop {
            let answer = self.ask(&format!("Select [1-{}]: ", options.len()))?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(
                    self.writer,
                    "Please enter a number between 1 and {}",
                    options.len()
                )?,
            }
        }
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        self.ask(&format!("{}: ", prompt))
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.ask(&format!("{} {}: ", prompt, hint))?;
            match answer.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.writer, "Please answer y or n")?,
            }
        }
    }
}
