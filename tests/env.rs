// tests/env.rs
mod common;
use crate::common::{init_tracing, fixture, stdout_line};

use std::error::Error;

use proptest::prelude::*;
use spell::env::is_valid_key;
use spell::{Env, EnvVar, Spell};

type TestResult = Result<(), Box<dyn Error>>;

#[cfg(windows)]
const PATH_VAR: &str = "Path";
#[cfg(not(windows))]
const PATH_VAR: &str = "PATH";

#[test]
fn variable_set_on_the_descriptor_reaches_the_child() -> TestResult {
    init_tracing();

    let mut spell = fixture("env");
    spell.env("foo", "bar").arg("foo");

    assert_eq!(stdout_line(&spell)?, "foo=bar");
    Ok(())
}

#[test]
fn env_clear_hides_inherited_variables() -> TestResult {
    init_tracing();

    let mut spell = fixture("env");
    spell.env_clear().arg(PATH_VAR);

    assert_eq!(stdout_line(&spell)?, format!("{PATH_VAR} not found"));
    Ok(())
}

#[test]
fn env_remove_drops_a_single_variable() -> TestResult {
    init_tracing();

    let mut spell = fixture("env");
    spell
        .env("KEEP_ME", "1")
        .env("DROP_ME", "2")
        .env_remove("DROP_ME")
        .args(["KEEP_ME", "DROP_ME"]);

    let output = spell.cast_output()?;
    let text = output.stdout_lossy();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["KEEP_ME=1", "DROP_ME not found"]);
    Ok(())
}

#[test]
fn untouched_descriptor_inherits_the_environment() -> TestResult {
    init_tracing();

    let mut spell = Spell::new("");
    assert!(spell.get_envs().is_none());

    let env = spell.envs_mut();
    assert!(env.contains(PATH_VAR));
    assert!(spell.get_envs().is_some());
    Ok(())
}

#[test]
fn cleared_map_iterates_only_new_entries() {
    let mut spell = Spell::new("");
    spell.env_clear();
    let env = spell.envs_mut();
    env.set("one", "1");
    env.set("two", "2");
    env.set("three", "3");

    assert_eq!(env.to_sorted(), ["one=1", "three=3", "two=2"]);
}

#[test]
fn set_overwrites_existing_key() {
    let mut env = Env::empty();
    env.set("a", "2");
    env.set("a", "1");

    assert_eq!(env.get("a"), Some("1"));
    assert_eq!(env.len(), 1);
}

#[test]
fn missing_and_empty_are_different() {
    let mut env = Env::empty();
    env.set("EMPTY", "");

    assert_eq!(env.get("EMPTY"), Some(""));
    assert_eq!(env.get("MISSING"), None);
}

#[test]
fn rename_keeps_the_value() {
    let mut env: Env = [("OLD", "value"), ("OTHER", "x")].into_iter().collect();
    env.rename("OLD", "NEW");

    assert_eq!(env.get("OLD"), None);
    assert_eq!(env.get("NEW"), Some("value"));
    assert_eq!(env.len(), 2);

    // Renaming something that isn't there changes nothing.
    env.rename("NOPE", "STILL_NOPE");
    assert_eq!(env.len(), 2);
    assert!(!env.contains("STILL_NOPE"));
}

#[test]
fn entries_split_on_first_equals_sign() {
    let var = EnvVar::parse("KEY=a=b");
    assert_eq!(var.key(), "KEY");
    assert_eq!(var.value(), "a=b");

    let mut var = EnvVar::new("K", "v");
    var.set_value("w");
    var.set_key("LONGER");
    assert_eq!(var.as_str(), "LONGER=w");
    assert_eq!(var.to_string(), "LONGER=w");
}

#[test]
fn key_validity_rules() {
    assert!(is_valid_key("PATH"));
    assert!(is_valid_key("lower_case-and.dots"));
    assert!(!is_valid_key(""));
    assert!(!is_valid_key("A=B"));
    assert!(!is_valid_key("NUL\0KEY"));
}

#[test]
fn process_snapshot_holds_only_valid_keys() {
    assert!(Env::from_process().iter().all(|var| is_valid_key(var.key())));
}

#[test]
fn clear_empties_the_map() {
    let mut env: Env = [("A", "1"), ("B", "2")].into_iter().collect();
    assert!(!env.is_empty());

    env.clear();
    assert!(env.is_empty());
    assert_eq!(env.iter().count(), 0);
}

proptest! {
    #[test]
    fn set_then_get_returns_the_value(
        pairs in prop::collection::vec(("[A-Za-z_][A-Za-z0-9_]{0,8}", "[ -~]{0,12}"), 1..16)
    ) {
        let mut env = Env::empty();
        for (key, value) in &pairs {
            env.set(key, value);
            prop_assert_eq!(env.get(key), Some(value.as_str()));
        }

        let distinct: std::collections::HashSet<&String> = pairs.iter().map(|(k, _)| k).collect();
        prop_assert_eq!(env.len(), distinct.len());

        for key in distinct {
            env.remove(key);
            prop_assert_eq!(env.get(key), None);
        }
        prop_assert!(env.is_empty());
    }
}
