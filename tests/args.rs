// tests/args.rs
mod common;
use crate::common::{FIXTURE, init_tracing, fixture, stdout_line};

use std::error::Error;

use proptest::prelude::*;
use spell::Spell;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn arguments_are_passed_in_order() -> TestResult {
    init_tracing();

    let mut spell = fixture("args");
    spell.args(["Hello", "World"]);

    assert_eq!(stdout_line(&spell)?, "Hello World");
    Ok(())
}

#[test]
fn no_arguments_print_an_empty_line() -> TestResult {
    init_tracing();

    let output = fixture("args").cast_output()?;
    assert!(output.status.success());
    assert_eq!(common::chomp(&output.stdout), b"");
    Ok(())
}

#[test]
fn args_accepts_any_collection_of_strings() -> TestResult {
    init_tracing();

    let owned: Vec<String> = vec!["foo".into(), "bar".into()];
    let mut spell = fixture("args");
    spell.args(&owned);

    assert_eq!(spell.get_args(), ["args", "foo", "bar"]);
    assert_eq!(stdout_line(&spell)?, "foo bar");
    Ok(())
}

#[test]
fn arguments_can_be_edited_in_place_before_launch() -> TestResult {
    init_tracing();

    let mut spell = Spell::new(FIXTURE);
    spell.arg("args").arg("one").arg("two");
    for arg in spell.args_mut().iter_mut().skip(1) {
        let upper = arg[..1].to_uppercase();
        arg.replace_range(..1, &upper);
    }

    assert_eq!(stdout_line(&spell)?, "One Two");
    Ok(())
}

#[test]
fn arguments_with_spaces_and_quotes_arrive_intact() -> TestResult {
    init_tracing();

    let mut spell = fixture("args");
    spell.arg("a b").arg("say \"hi\"").arg("back\\slash").arg("");

    assert_eq!(stdout_line(&spell)?, "a b say \"hi\" back\\slash ");
    Ok(())
}

#[test]
fn exit_code_reflects_argument_count() -> TestResult {
    init_tracing();

    let status = fixture("count-args").cast_status()?;
    assert!(status.success());
    assert_eq!(status.code(), 0);

    let status = fixture("count-args").arg("1").cast_status()?;
    assert!(!status.success());
    assert_eq!(status.code(), 1);

    let status = fixture("count-args")
        .args(["1", "2", "3", "4", "5", "6", "7"])
        .cast_status()?;
    assert!(!status.success());
    assert_eq!(status.code(), 7);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn launched_arguments_round_trip(
        args in prop::collection::vec("[a-zA-Z0-9 _.,:'\"\\\\-]{0,12}", 0..6)
    ) {
        init_tracing();

        let mut spell = fixture("args");
        spell.args(&args);

        let line = stdout_line(&spell).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(line, args.join(" "));
    }
}
