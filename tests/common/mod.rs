#![allow(dead_code)]

pub use spell_test_utils::builders;
pub use spell_test_utils::init_tracing;

use spell::Spell;

/// Path to the fixture binary built alongside the tests.
pub const FIXTURE: &str = env!("CARGO_BIN_EXE_spell-probe");

/// Descriptor for `spell-probe <mode>`.
pub fn fixture(mode: &str) -> Spell {
    let mut spell = Spell::new(FIXTURE);
    spell.arg(mode);
    spell
}

/// Strip one trailing line ending (`\n` or `\r\n`).
pub fn chomp(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Captured stdout as a string without its trailing line ending.
pub fn stdout_line(spell: &Spell) -> Result<String, spell::SpellError> {
    let output = spell.cast_output()?;
    Ok(String::from_utf8_lossy(chomp(&output.stdout)).into_owned())
}
