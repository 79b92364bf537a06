//! Error type for the `erin-io` boundary: file I/O, TOML parsing, CSV
//! writing, and model-assembly failures surfaced while loading a scenario
//! file (§7: "input errors").

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("reading '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("writing '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing TOML in '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("writing CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("model has {0} unresolved issue(s); see diagnostics")]
    Invalid(usize),

    #[error(transparent)]
    Core(#[from] erin_core::ErinError),
}

pub type IoResult<T> = Result<T, IoError>;
