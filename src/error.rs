//! Error handling for collection runs.
//!
//! Every fatal condition of a run maps to one variant here: transport and
//! service failures while fetching, malformed responses, database sink
//! failures and configuration problems. Value coercion in the normalizer
//! never fails and has no variant.

use crate::models::RowKind;
use reqwest::StatusCode;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("api error: {message} ({status})")]
    Service { status: StatusCode, message: String },

    #[error("Malformed service response: {reason}")]
    Decode { reason: String },

    #[error("Batch insert into '{table}' failed")]
    Sink {
        table: &'static str,
        #[source]
        source: clickhouse::error::Error,
    },

    #[error("No ClickHouse address answered for database {database}: tried {addresses}")]
    DatabaseUnavailable { database: String, addresses: String },

    #[error("Invalid configuration file: {path} - {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("failed to {stage} for location '{location}'")]
    Stage {
        stage: Stage,
        location: String,
        #[source]
        source: Box<CollectorError>,
    },
}

/// Pipeline step that was running when a fatal error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Fetch(RowKind),
    Load { kind: RowKind, database: String },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch(kind) => write!(f, "collect {}", kind.table()),
            Stage::Load { kind, database } => {
                write!(f, "write {} to database {}", kind.table(), database)
            }
        }
    }
}

impl CollectorError {
    pub fn transport(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source,
        }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub fn sink(table: &'static str, source: clickhouse::error::Error) -> Self {
        Self::Sink { table, source }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wrap this error with the stage and location it happened in
    pub fn at(self, stage: Stage, location: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            location: location.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with any stage context peeled off
    pub fn root_cause(&self) -> &CollectorError {
        let mut current = self;
        while let CollectorError::Stage { source, .. } = current {
            current = &**source;
        }
        current
    }
}

pub type Result<T> = std::result::Result<T, CollectorError>;
