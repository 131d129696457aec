use std::io::Write;
use std::process::{Command, Stdio};

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};

/// Port to the external morphological reading generator. The generator
/// receives shielded text, inserts bracket-notation readings around
/// ideographic runs, and must pass every other byte through unchanged,
/// placeholder tokens included.
pub trait ReadingGenerator {
    fn annotate(&self, text: &str) -> Result<String>;
}

impl<F> ReadingGenerator for F
where
    F: Fn(&str) -> Result<String>,
{
    fn annotate(&self, text: &str) -> Result<String> {
        self(text)
    }
}

/// Adapter spawning the configured annotator command (a MeCab-style
/// tokenizer wrapper), feeding it the shielded text on stdin and reading the
/// annotated text from stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl ReadingGenerator for CommandGenerator {
    fn annotate(&self, text: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Generator {
                message: format!("failed to spawn {}: {e}", self.program),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| Error::Generator {
            message: "generator stdin unavailable".into(),
        })?;
        stdin.write_all(text.as_bytes())?;
        drop(stdin);

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::Generator {
                message: format!("{} exited with {}", self.program, output.status),
            });
        }

        let mut annotated = String::from_utf8_lossy(&output.stdout).into_owned();
        // annotator commands append a final newline; the fragment never
        // carries raw newlines at this point
        while annotated.ends_with('\n') || annotated.ends_with('\r') {
            annotated.pop();
        }
        if annotated.is_empty() && !text.is_empty() {
            return Err(Error::Generator {
                message: format!("{} produced no output", self.program),
            });
        }
        Ok(annotated)
    }
}
