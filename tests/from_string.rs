// tests/from_string.rs
mod common;
use crate::common::{FIXTURE, init_tracing, stdout_line};

use std::error::Error;

use proptest::prelude::*;
use spell::{Spell, SpellError, split_command_line};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn quoted_segment_becomes_one_argument() -> TestResult {
    init_tracing();

    let spell = Spell::from_string("prog 'a b' c")?;
    assert_eq!(spell.get_program(), "prog");
    assert_eq!(spell.get_args(), ["a b", "c"]);
    Ok(())
}

#[test]
fn adjacent_quoted_and_bare_parts_are_glued() -> TestResult {
    let spell = Spell::from_string("prog H'ell'o")?;
    assert_eq!(spell.get_args(), ["Hello"]);

    let spell = Spell::from_string("echo 안녕'하세'요")?;
    assert_eq!(spell.get_args(), ["안녕하세요"]);
    Ok(())
}

#[test]
fn trailing_backslash_is_dropped() -> TestResult {
    let spell = Spell::from_string("prog a\\")?;
    assert_eq!(spell.get_args(), ["a"]);

    let spell = Spell::from_string("prog a \\")?;
    assert_eq!(spell.get_args(), ["a"]);
    Ok(())
}

#[test]
fn escapes_and_nested_quotes() {
    assert_eq!(
        split_command_line(r"echo '\'Hello World\''"),
        ["echo", "'Hello World'"]
    );
    assert_eq!(
        split_command_line(r#"echo '"Hello World"'"#),
        ["echo", "\"Hello World\""]
    );
    assert_eq!(split_command_line(r"a\ b c"), ["a b", "c"]);
    assert_eq!(split_command_line(r#"x "y \" z""#), ["x", "y \" z"]);
}

#[test]
fn spacing_and_empty_tokens() {
    assert_eq!(split_command_line("  a   b  "), ["a", "b"]);
    assert_eq!(split_command_line("a '' b"), ["a", "", "b"]);
    assert!(split_command_line("").is_empty());
    assert!(split_command_line("    ").is_empty());
}

#[test]
fn unterminated_quote_runs_to_end_of_line() {
    assert_eq!(split_command_line("a 'b c"), ["a", "b c"]);
    assert_eq!(split_command_line("a \"b c"), ["a", "b c"]);
}

#[test]
fn blank_line_is_rejected() {
    assert!(matches!(Spell::from_string(""), Err(SpellError::EmptyCommand)));
    assert!(matches!(Spell::from_string("   "), Err(SpellError::EmptyCommand)));
}

#[test]
fn parsed_command_launches() -> TestResult {
    init_tracing();

    let line = format!("{} args 'Hello World' H'ell'o", quote(FIXTURE));
    let spell = Spell::from_string(&line)?;

    assert_eq!(stdout_line(&spell)?, "Hello World Hello");
    Ok(())
}

/// Quote `token` so that the splitter gives it back unchanged.
fn quote(token: &str) -> String {
    let mut out = String::from("\"");
    for c in token.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

proptest! {
    #[test]
    fn plain_tokens_split_back(tokens in prop::collection::vec("[a-zA-Z0-9_./=-]{1,10}", 0..8)) {
        prop_assert_eq!(split_command_line(&tokens.join(" ")), tokens);
    }

    #[test]
    fn quoted_tokens_split_back(tokens in prop::collection::vec(".{0,10}", 0..8)) {
        let line: Vec<String> = tokens.iter().map(|t| quote(t)).collect();
        prop_assert_eq!(split_command_line(&line.join(" ")), tokens);
    }
}
