//! Error taxonomy
//!
//! The per-tick path never returns these: lattice lookups, unknown probes
//! and degenerate geometry all resolve to fallback values. `WarpError`
//! surfaces only from configuration loading, initialization and zoom
//! navigation requests.
//!
//! Author: Moroya Sakamoto

use crate::types::ProbeId;
use thiserror::Error;

/// Errors reported by configuration and navigation entry points
#[derive(Error, Debug)]
pub enum WarpError {
    /// A required collaborator was not supplied at startup
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    /// Grid or engine parameters are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config JSON could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation requires an initialized engine
    #[error("Engine is not ready")]
    NotReady,

    /// Slot does not name a selectable probe of the current session
    #[error("No selectable probe at slot {slot} (session has {len})")]
    UnknownParent {
        /// Requested slot
        slot: usize,
        /// Number of probes in the current session
        len: usize,
    },

    /// The selected probe already anchors the current session
    #[error("{0} already anchors the open session")]
    ParentAlreadyOpen(ProbeId),

    /// Zooming further would exceed the configured depth
    #[error("Zoom depth limit {0} reached")]
    DepthLimit(usize),

    /// First-visit transition requested for a parent that has children
    #[error("{0} was already visited; return into it instead")]
    AlreadyVisited(ProbeId),

    /// Revisit requested for a parent that was never entered
    #[error("{0} has no nested probes yet")]
    NotVisited(ProbeId),

    /// Unwind requested at the root level
    #[error("Already at the root level")]
    AtRoot,
}

impl From<serde_json::Error> for WarpError {
    fn from(err: serde_json::Error) -> Self {
        WarpError::Serialization(err.to_string())
    }
}

/// Crate result alias
pub type Result<T> = std::result::Result<T, WarpError>;
