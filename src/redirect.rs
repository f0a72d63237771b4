use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;

use crate::errors::ShellError;
use crate::lexer::{Token, TokenKind};

/// One redirection instruction, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirection {
    /// `< file`
    Input(String),
    /// `> file` — create or truncate.
    Output(String),
    /// `>> file` — create or append.
    Append(String),
}

/// An atomic command (one pipeline stage) with its redirections separated
/// from the argv. A `NAME` that follows a redirection operator is the target
/// file and never an argument.
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub argv: Vec<String>,
    pub redirections: Vec<Redirection>,
}

impl StagePlan {
    pub fn head(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn has_input(&self) -> bool {
        self.redirections
            .iter()
            .any(|r| matches!(r, Redirection::Input(_)))
    }

    pub fn has_output(&self) -> bool {
        self.redirections
            .iter()
            .any(|r| matches!(r, Redirection::Output(_) | Redirection::Append(_)))
    }
}

/// Walk a validated stage's tokens and separate argv from redirections.
pub fn plan_stage(tokens: &[Token]) -> StagePlan {
    let mut argv = Vec::new();
    let mut redirections = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::Name => argv.push(tokens[i].text.clone()),
            TokenKind::In | TokenKind::Out | TokenKind::Append => {
                // The parser guarantees a Name follows.
                if let Some(target) = tokens.get(i + 1) {
                    let path = target.text.clone();
                    redirections.push(match tokens[i].kind {
                        TokenKind::In => Redirection::Input(path),
                        TokenKind::Out => Redirection::Output(path),
                        _ => Redirection::Append(path),
                    });
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    StagePlan { argv, redirections }
}

/// Open every input target left-to-right and keep the last one. Earlier
/// opens still happen so a left-to-right shell's side effects are preserved;
/// their descriptors close as they are replaced.
pub fn open_input(redirections: &[Redirection]) -> Result<Option<File>, ShellError> {
    let mut input = None;
    for redirection in redirections {
        if let Redirection::Input(path) = redirection {
            let file = File::open(path).map_err(|_| ShellError::NoSuchFile)?;
            input = Some(file);
        }
    }
    Ok(input)
}

/// Open every output target left-to-right with its own mode and keep the
/// last one. A `> file` earlier in the command still truncates `file` even
/// when a later redirection wins.
pub fn open_output(redirections: &[Redirection]) -> Result<Option<File>, ShellError> {
    let mut output = None;
    for redirection in redirections {
        let file = match redirection {
            Redirection::Output(path) => OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o644)
                .open(path),
            Redirection::Append(path) => OpenOptions::new()
                .write(true)
                .create(true)
                .append(true)
                .mode(0o644)
                .open(path),
            Redirection::Input(_) => continue,
        };
        output = Some(file.map_err(|_| ShellError::UnableToCreateFile)?);
    }
    Ok(output)
}
