// src/config/mod.rs

//! Launch profiles.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a profile from disk.
//! - `validate.rs`: turning a raw profile into a checked [`Profile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, profile_dir};
pub use model::{Profile, RawProfile};
