use thiserror::Error;

use crate::lexer::{Token, TokenKind};

/// Why a token sequence was rejected. The REPL prints the stable
/// `Invalid Syntax!` line for every variant and logs the precise reason.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("expected a command")]
    MissingCommand,
    #[error("expected a file name after a redirection operator")]
    MissingRedirectTarget,
    #[error("expected a command after `|`")]
    MissingPipeOperand,
    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),
    #[error("too many tokens")]
    TokenOverflow,
}

/// Single-pass recursive descent over the token buffer. Accept/reject only;
/// downstream components re-walk the tokens with index ranges.
///
/// ```text
/// shell_cmd := cmd_group ((';' | '&') cmd_group)* ('&')?
/// cmd_group := atomic ('|' atomic)*
/// atomic    := NAME (NAME | '<' NAME | '>' NAME | '>>' NAME)*
/// ```
///
/// A trailing `&` backgrounds the last group; a trailing `;` is tolerated.
pub fn validate(tokens: &[Token]) -> Result<(), SyntaxError> {
    if tokens.iter().any(|t| t.kind == TokenKind::Invalid) {
        return Err(SyntaxError::TokenOverflow);
    }

    let mut parser = Parser { tokens, pos: 0 };
    if parser.peek() == TokenKind::End {
        return Ok(());
    }
    parser.shell_cmd()?;
    match parser.peek() {
        TokenKind::End => Ok(()),
        _ => Err(SyntaxError::UnexpectedToken(parser.current_text())),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::End)
    }

    fn current_text(&self) -> String {
        self.tokens
            .get(self.pos)
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn shell_cmd(&mut self) -> Result<(), SyntaxError> {
        self.cmd_group()?;
        while matches!(self.peek(), TokenKind::Semi | TokenKind::Amp) {
            self.bump();
            if self.peek() == TokenKind::End {
                break;
            }
            self.cmd_group()?;
        }
        Ok(())
    }

    fn cmd_group(&mut self) -> Result<(), SyntaxError> {
        self.atomic()?;
        while self.peek() == TokenKind::Pipe {
            self.bump();
            self.atomic().map_err(|e| match e {
                SyntaxError::MissingCommand => SyntaxError::MissingPipeOperand,
                other => other,
            })?;
        }
        Ok(())
    }

    fn atomic(&mut self) -> Result<(), SyntaxError> {
        if self.peek() != TokenKind::Name {
            return Err(SyntaxError::MissingCommand);
        }
        self.bump();

        loop {
            match self.peek() {
                TokenKind::Name => self.bump(),
                TokenKind::In | TokenKind::Out | TokenKind::Append => {
                    self.bump();
                    if self.peek() != TokenKind::Name {
                        return Err(SyntaxError::MissingRedirectTarget);
                    }
                    self.bump();
                }
                _ => break,
            }
        }
        Ok(())
    }
}
