pub mod coach;
pub mod config;
pub mod evolve;
pub mod learning;
pub mod persona;
pub mod report;
pub mod simulate;

use std::path::PathBuf;

use focuscoach_core::{data_dir, Config};

/// Loaded configuration and the directory its relative paths resolve against.
pub struct Workspace {
    pub config: Config,
    pub base: PathBuf,
}

impl Workspace {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            config: Config::load()?,
            base: data_dir()?,
        })
    }
}

pub fn pass_fail(ok: bool) -> &'static str {
    if ok {
        "PASS"
    } else {
        "FAIL"
    }
}
