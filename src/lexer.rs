/// The kind of a single token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A word: command name, argument, or redirection target.
    Name,
    /// `|`
    Pipe,
    /// `&`
    Amp,
    /// `;`
    Semi,
    /// `<`
    In,
    /// `>`
    Out,
    /// `>>`
    Append,
    /// End-of-line sentinel, always the last token.
    End,
    /// Emitted once when the token bound is exceeded; the parser rejects it.
    Invalid,
}

/// A token with its literal lexeme (the word for `Name`, the symbol for
/// operators, empty for `End`/`Invalid`).
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token { kind, text: text.into() }
    }
}

/// Upper bound on tokens per line, matching the fixed buffer of the original
/// shell. Overflow becomes a syntax error rather than silent truncation.
pub const MAX_TOKENS: usize = 1023;

const OPERATOR_CHARS: &[char] = &['|', '<', '>', '&', ';'];

/// Split one input line into a flat token sequence terminated by `End`.
///
/// Whitespace separates tokens and is discarded. There is no quoting,
/// escaping, or expansion at this layer: `~` is an ordinary `Name` that only
/// the built-ins interpret.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if tokens.len() >= MAX_TOKENS {
            tokens.push(Token::new(TokenKind::Invalid, ""));
            break;
        }

        match ch {
            '|' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Pipe, "|"));
            }
            '<' => {
                chars.next();
                tokens.push(Token::new(TokenKind::In, "<"));
            }
            '&' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Amp, "&"));
            }
            ';' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Semi, ";"));
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'>') {
                    chars.next();
                    tokens.push(Token::new(TokenKind::Append, ">>"));
                } else {
                    tokens.push(Token::new(TokenKind::Out, ">"));
                }
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || OPERATOR_CHARS.contains(&c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::new(TokenKind::Name, word));
            }
        }
    }

    tokens.push(Token::new(TokenKind::End, ""));
    tokens
}
