// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

/// A specific configuration or registration problem.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigIssue {
    /// A section weight was zero, negative, or not finite.
    #[error("section {index} has weight {weight}; weights must be finite and positive")]
    NonPositiveWeight {
        /// Section index.
        index: usize,
        /// The rejected weight.
        weight: f64,
    },
    /// A section with the same index was already registered.
    #[error("section {index} is already registered")]
    DuplicateIndex {
        /// Section index.
        index: usize,
    },
    /// The idle timeout was zero.
    #[error("idle timeout must be at least one millisecond")]
    ZeroIdleTimeout,
    /// The direction threshold was negative or not finite.
    #[error("direction threshold {0} must be finite and non-negative")]
    InvalidDirectionThreshold(f64),
    /// The visibility threshold was outside `[0, 1]`.
    #[error("visibility threshold {0} must lie in [0, 1]")]
    InvalidVisibilityThreshold(f64),
    /// A boundary override value was outside `[0, 1]`, or its tolerance was invalid.
    #[error("boundary override for section {index} at {value} is invalid")]
    InvalidBoundaryOverride {
        /// Section index.
        index: usize,
        /// The rejected boundary value.
        value: f64,
    },
}

/// Errors produced by the choreography engine.
///
/// Only [`ChoreoError::InvalidConfiguration`], [`ChoreoError::ContainerUnavailable`]
/// and [`ChoreoError::UnknownSection`] reach callers of the engine. Measurement
/// failures ([`ChoreoError::GeometryUnavailable`]) are absorbed by the engine:
/// the section reports unknown progress and stays in its current state.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ChoreoError {
    /// The section has no usable geometry (not laid out yet, or zero height).
    #[error("geometry for section {index} is unavailable")]
    GeometryUnavailable {
        /// Section index.
        index: usize,
    },
    /// The scroll container was missing or detached at construction.
    #[error("scroll container is unavailable")]
    ContainerUnavailable,
    /// Configuration or section registration was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigIssue),
    /// The operation named a section index that was never registered.
    #[error("section {index} is not registered")]
    UnknownSection {
        /// Section index.
        index: usize,
    },
}
