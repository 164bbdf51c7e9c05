// tests/config_profiles.rs
mod common;
use crate::common::builders::ProfileBuilder;
use crate::common::{FIXTURE, chomp, init_tracing};

use std::error::Error;
use std::path::PathBuf;

use spell::config::{RawProfile, load_and_validate, load_from_path, profile_dir};
use spell::{SpellError, Stdio};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn bundled_profiles_load() -> TestResult {
    init_tracing();

    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let release = load_and_validate(manifest.join("profiles/cargo-release.toml"))?;
    assert_eq!(release.program, "cargo");
    assert_eq!(release.args, ["build", "--release"]);
    assert_eq!(release.stdin, Stdio::Null);
    assert_eq!(release.stdout, Stdio::Default);
    assert_eq!(release.env_remove, ["CARGO_TARGET_DIR"]);
    assert_eq!(release.env.get("RUST_LOG").map(String::as_str), Some("info"));

    let sandboxed = load_and_validate(manifest.join("profiles/sandboxed-env.toml"))?;
    assert_eq!(sandboxed.program, "env");
    assert!(sandboxed.args.is_empty());
    assert!(sandboxed.env_clear);
    assert!(sandboxed.capture);

    let base = profile_dir(&manifest.join("profiles/sandboxed-env.toml"));
    let spell = sandboxed.to_spell(&base);
    assert_eq!(spell.get_current_dir(), manifest.canonicalize()?);
    assert_eq!(spell.get_envs().map(|e| e.len()), Some(2));
    Ok(())
}

#[test]
fn profile_written_to_disk_runs_the_fixture() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = ProfileBuilder::program(FIXTURE)
        .arg("env")
        .arg("GREETING")
        .env("GREETING", "hi there")
        .capture(true)
        .write_to(dir.path(), "fixture.toml")?;

    let profile = load_and_validate(&path)?;
    assert!(profile.capture);

    let output = profile.to_spell(&profile_dir(&path)).cast_output()?;
    assert!(output.status.success());
    assert_eq!(chomp(&output.stdout), b"GREETING=hi there");
    Ok(())
}

#[test]
fn relative_current_dir_is_anchored_at_the_profile() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    std::fs::create_dir(dir.path().join("work"))?;
    let path = ProfileBuilder::command("make all")
        .current_dir("work")
        .write_to(dir.path(), "build.toml")?;

    let profile = load_and_validate(&path)?;
    let spell = profile.to_spell(&profile_dir(&path));
    assert_eq!(spell.get_current_dir(), dir.path().join("work").canonicalize()?);
    assert_eq!(spell.get_program(), "make");
    assert_eq!(spell.get_args(), ["all"]);
    Ok(())
}

#[test]
fn env_settings_apply_clear_then_remove_then_set() {
    let profile = ProfileBuilder::program("x")
        .env_clear(true)
        .env_remove("A")
        .env("A", "kept")
        .env("B", "2")
        .build();

    let spell = profile.to_spell(&std::env::temp_dir());
    let env = spell.get_envs().expect("env should be explicit");
    assert_eq!(env.to_sorted(), ["A=kept", "B=2"]);
}

#[test]
fn stream_modes_are_carried_over() {
    let profile = ProfileBuilder::command("x")
        .stdin(Stdio::Piped)
        .stdout(Stdio::Null)
        .stderr(Stdio::Inherit)
        .build();

    let spell = profile.to_spell(&std::env::temp_dir());
    assert_eq!(spell.get_stdin(), Stdio::Piped);
    assert_eq!(spell.get_stdout(), Stdio::Null);
    assert_eq!(spell.get_stderr(), Stdio::Inherit);
    assert!(spell.get_envs().is_none());
}

#[test]
fn command_and_program_are_mutually_exclusive() {
    let mut raw = ProfileBuilder::command("a b").raw();
    raw.program = Some("c".into());
    assert!(matches!(
        spell::config::Profile::try_from(raw),
        Err(SpellError::ConfigError(_))
    ));

    let err = spell::config::Profile::try_from(RawProfile::default()).unwrap_err();
    assert!(err.to_string().contains("either `command` or `program`"));
}

#[test]
fn args_require_program() {
    let raw = ProfileBuilder::command("a").arg("b").raw();
    assert!(matches!(
        spell::config::Profile::try_from(raw),
        Err(SpellError::ConfigError(_))
    ));
}

#[test]
fn blank_command_or_program_is_rejected() {
    for raw in [
        ProfileBuilder::command("   ").raw(),
        ProfileBuilder::program("").raw(),
    ] {
        assert!(matches!(
            spell::config::Profile::try_from(raw),
            Err(SpellError::ConfigError(_))
        ));
    }
}

#[test]
fn bad_environment_names_are_rejected() {
    for raw in [
        ProfileBuilder::program("x").env("", "v").raw(),
        ProfileBuilder::program("x").env("A=B", "v").raw(),
        ProfileBuilder::program("x").env_remove("").raw(),
        ProfileBuilder::program("x").env("A", "nul\0byte").raw(),
    ] {
        assert!(matches!(
            spell::config::Profile::try_from(raw),
            Err(SpellError::ConfigError(_))
        ));
    }
}

#[test]
fn unknown_keys_and_bad_modes_fail_to_parse() -> TestResult {
    let dir = tempfile::tempdir()?;

    let typo = dir.path().join("typo.toml");
    std::fs::write(&typo, "comand = \"ls\"\n")?;
    assert!(matches!(load_from_path(&typo), Err(SpellError::TomlError(_))));

    let mode = dir.path().join("mode.toml");
    std::fs::write(&mode, "command = \"ls\"\nstdout = \"sideways\"\n")?;
    assert!(matches!(load_from_path(&mode), Err(SpellError::TomlError(_))));

    // Only the canonical mode names parse.
    std::fs::write(&mode, "command = \"ls\"\nstdout = \"pipe\"\n")?;
    assert!(matches!(load_from_path(&mode), Err(SpellError::TomlError(_))));

    let missing = dir.path().join("missing.toml");
    assert!(matches!(load_from_path(&missing), Err(SpellError::IoError(_))));
    Ok(())
}

#[test]
fn bare_file_name_uses_the_current_directory() -> TestResult {
    assert_eq!(profile_dir(std::path::Path::new("build.toml")), std::env::current_dir()?);
    assert_eq!(
        profile_dir(std::path::Path::new("conf/build.toml")),
        PathBuf::from("conf")
    );
    Ok(())
}
