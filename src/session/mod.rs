//! Conversion sessions.
//!
//! A [`Session`] owns the label registry and the description ledger and runs
//! both conversion directions against them:
//!
//! - [`Session::decode`]: viewer document -> label volume.
//! - [`Session::encode`] / [`Session::encode_into`]: label volume -> viewer
//!   document.
//!
//! Registry and ledger persist across calls, so a volume decoded from one
//! document, edited by a segmentation engine and encoded again keeps its
//! names, values and colors.

mod decode;
mod encode;
pub mod report;
mod state;

use std::collections::BTreeSet;

use ndarray::Array3;

use crate::error::LabelBridgeError;
use crate::label::{CollisionPolicy, DescriptionLedger, LabelRegistry};
use crate::volume::{self, LabelVolume};

pub use report::{SessionCounts, SessionIssue, SessionIssueCode, SessionReport, SessionSeverity};
pub use state::{read_session, write_session, SessionState};

/// Options fixed for the lifetime of a session.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Seed for automatic label values; entropy when `None`.
    pub seed: Option<u64>,
    pub collision_policy: CollisionPolicy,
}

/// Options for one decode call.
#[derive(Clone, Debug, Default)]
pub struct DecodeOptions {
    /// Only drawings whose name is in this set are decoded.
    pub labels: Option<BTreeSet<String>>,
}

impl DecodeOptions {
    /// Restricts decoding to the given names.
    pub fn only<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: Some(labels.into_iter().map(Into::into).collect()),
        }
    }
}

/// Shared label state for a run of conversions.
#[derive(Debug, Default)]
pub struct Session {
    registry: LabelRegistry,
    ledger: DescriptionLedger,
}

impl Session {
    /// An empty session.
    pub fn new(opts: &SessionOptions) -> Self {
        let registry = match opts.seed {
            Some(seed) => LabelRegistry::with_seed(seed),
            None => LabelRegistry::new(),
        }
        .with_policy(opts.collision_policy);

        Self::from_parts(registry, DescriptionLedger::new())
    }

    /// A session over an existing registry and ledger.
    pub fn from_parts(registry: LabelRegistry, ledger: DescriptionLedger) -> Self {
        Self { registry, ledger }
    }

    /// Restores a session saved with [`Session::state`].
    pub fn from_state(state: SessionState, opts: &SessionOptions) -> Result<Self, LabelBridgeError> {
        let mut session = Self::new(opts);
        session.registry.extend_from_slab(state.slab)?;
        session.ledger = state.description;
        Ok(session)
    }

    /// Snapshot of the registry and ledger.
    pub fn state(&self) -> SessionState {
        SessionState {
            slab: self.registry.to_slab(),
            description: self.ledger.clone(),
        }
    }

    pub fn registry(&self) -> &LabelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LabelRegistry {
        &mut self.registry
    }

    pub fn ledger(&self) -> &DescriptionLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut DescriptionLedger {
        &mut self.ledger
    }

    /// Seed volume for `label`: 1 on its voxels, 2 on other labels.
    pub fn seeds(&self, volume: &LabelVolume, label: &str) -> Result<Array3<u8>, LabelBridgeError> {
        let target = self
            .registry
            .get(label)
            .ok_or_else(|| LabelBridgeError::UnknownLabel(label.to_string()))?;
        Ok(volume::seeds(volume, target))
    }
}
