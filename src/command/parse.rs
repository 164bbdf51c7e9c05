// src/command/parse.rs

//! Quote-aware command-line splitter.
//!
//! This is deliberately small: spaces separate tokens, `'...'` and `"..."`
//! protect spaces, and a backslash takes the next character literally
//! (inside quotes as well). Quote characters are stripped, and quoted and
//! bare segments that touch are glued into one token, so `H'ell'o` is
//! `Hello`. There is no globbing, no variable expansion, no redirection.
//!
//! Malformed input is accepted: a trailing backslash is dropped and an
//! unterminated quote runs to the end of the line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Bare,
    Single,
    Double,
    /// Backslash seen; remembers the state to return to.
    Escape(Quote),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

impl Quote {
    fn state(self) -> State {
        match self {
            Quote::None => State::Bare,
            Quote::Single => State::Single,
            Quote::Double => State::Double,
        }
    }
}

/// Split `line` into tokens.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Separate from `current.is_empty()` so that `''` yields an empty token.
    let mut in_token = false;
    let mut state = State::Bare;

    for c in line.chars() {
        state = match (state, c) {
            (State::Escape(quote), c) => {
                in_token = true;
                current.push(c);
                quote.state()
            }
            (State::Bare, ' ') => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
                State::Bare
            }
            (State::Bare, '\\') => State::Escape(Quote::None),
            (State::Bare, '\'') => {
                in_token = true;
                State::Single
            }
            (State::Bare, '"') => {
                in_token = true;
                State::Double
            }
            (State::Single, '\\') => State::Escape(Quote::Single),
            (State::Double, '\\') => State::Escape(Quote::Double),
            (State::Single, '\'') | (State::Double, '"') => State::Bare,
            (state, c) => {
                in_token = true;
                current.push(c);
                state
            }
        };
    }

    if in_token {
        tokens.push(current);
    }
    tokens
}
