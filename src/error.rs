//! Error types for allocation and stage operations.

use glam::UVec3;
use thiserror::Error;

use crate::backend::BackendError;

/// Failure to allocate a GPU resource.
///
/// Rendering cannot proceed without its resources, so callers are expected
/// to abort the build that triggered the allocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("invalid resolution {resolution} for '{name}': components must be non-zero")]
    InvalidResolution { name: String, resolution: UVec3 },
    #[error("backend rejected '{name}': {source}")]
    Backend {
        name: String,
        #[source]
        source: BackendError,
    },
}

pub type AllocationResult<T> = Result<T, AllocationError>;

/// Misuse of a renderer stage, or a failed build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("stage '{stage}' has not been built")]
    NotBuilt { stage: String },
    #[error("stage '{stage}' has no texture named '{name}'")]
    UnknownTexture { stage: String, name: String },
    #[error("no stage registered as '{0}'")]
    UnknownStage(String),
    #[error("stage '{0}' is already registered")]
    DuplicateStage(String),
    #[error("stage '{stage}' allocated texture '{name}' twice")]
    DuplicateTexture { stage: String, name: String },
    #[error("invalid configuration for stage '{stage}': {reason}")]
    InvalidConfig { stage: String, reason: String },
    #[error("default resources are not live")]
    DefaultsUnavailable,
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

pub type StageResult<T> = Result<T, StageError>;
