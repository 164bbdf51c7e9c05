// src/config/validate.rs

use crate::command::split_command_line;
use crate::config::model::{Profile, RawProfile};
use crate::env::is_valid_key;
use crate::errors::{Result, SpellError};

impl TryFrom<RawProfile> for Profile {
    type Error = SpellError;

    fn try_from(raw: RawProfile) -> std::result::Result<Self, Self::Error> {
        let (program, args) = resolve_program(&raw)?;
        validate_env_keys(&raw)?;
        Ok(Profile {
            program,
            args,
            current_dir: raw.current_dir,
            env: raw.env,
            env_clear: raw.env_clear,
            env_remove: raw.env_remove,
            stdin: raw.stdin,
            stdout: raw.stdout,
            stderr: raw.stderr,
            capture: raw.capture,
        })
    }
}

fn resolve_program(raw: &RawProfile) -> Result<(String, Vec<String>)> {
    match (&raw.command, &raw.program) {
        (Some(_), Some(_)) => Err(SpellError::ConfigError(
            "`command` and `program` are mutually exclusive".to_string(),
        )),
        (None, None) => Err(SpellError::ConfigError(
            "profile must set either `command` or `program`".to_string(),
        )),
        (Some(command), None) => {
            if !raw.args.is_empty() {
                return Err(SpellError::ConfigError(
                    "`args` can only be used together with `program`".to_string(),
                ));
            }
            let mut tokens = split_command_line(command).into_iter();
            match tokens.next() {
                Some(program) if !program.is_empty() => Ok((program, tokens.collect())),
                _ => Err(SpellError::ConfigError(format!(
                    "`command` does not name a program: {command:?}"
                ))),
            }
        }
        (None, Some(program)) => {
            if program.trim().is_empty() {
                return Err(SpellError::ConfigError("`program` must not be empty".to_string()));
            }
            Ok((program.clone(), raw.args.clone()))
        }
    }
}

fn validate_env_keys(raw: &RawProfile) -> Result<()> {
    for key in raw.env.keys().chain(raw.env_remove.iter()) {
        if key.is_empty() {
            return Err(SpellError::ConfigError(
                "environment variable names must not be empty".to_string(),
            ));
        }
        if !is_valid_key(key) {
            return Err(SpellError::ConfigError(format!(
                "invalid environment variable name {key:?}"
            )));
        }
    }
    for (key, value) in raw.env.iter() {
        if value.contains('\0') {
            return Err(SpellError::ConfigError(format!(
                "value of environment variable '{key}' contains a nul byte"
            )));
        }
    }
    Ok(())
}
