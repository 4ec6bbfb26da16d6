use anyhow::{Context, Result, bail};
use std::io::BufRead;

/// Source of secrets: the terminal, or stdin for scripted use.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Prompt {
    from_stdin: bool,
}

impl Prompt {
    pub(crate) const fn new(from_stdin: bool) -> Self {
        Self { from_stdin }
    }

    pub(crate) fn secret(self, label: &str) -> Result<String> {
        let value = if self.from_stdin {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).context("cannot read stdin")?;
            line.trim_end_matches(['\r', '\n']).to_owned()
        } else {
            rpassword::prompt_password(format!("{label}: ")).context("cannot read from terminal")?
        };

        if value.is_empty() {
            bail!("{label} cannot be empty");
        }
        Ok(value)
    }
}
