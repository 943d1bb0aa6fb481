//! Cantus Core - singing-voice-synthesis task assembly.
//!
//! This crate is the composition root of an SVS training setup: it maps a
//! declarative task configuration onto an assembled model object. Three
//! layers compose, strictly one-directional:
//!
//! 1. **Registries** ([`registry`], [`task`]) - named collections of
//!    interchangeable component implementations per slot.
//! 2. **Configuration** ([`config`]) - a flat, validated option surface that
//!    selects one implementation per slot plus its keyword configuration.
//! 3. **Assembly** ([`task`], [`model`]) - constructs the selected
//!    components in dependency order and injects them into the model
//!    wrapper.
//!
//! The neural forward math, the DSP kernels, and the training loop live in
//! collaborator crates; what is assembled here are their configuration-
//! bearing frontends and the contracts between them.

// ============================================================================
// Configuration & Errors
// ============================================================================

/// Unified error taxonomy (configuration, consistency, format errors)
pub mod error;

/// Task configuration surface and keyword-conf helpers
pub mod config;

// ============================================================================
// Registries & Components
// ============================================================================

/// Label-keyed component factory maps
pub mod registry;

/// Feature extractors (acoustic, score, pitch/energy/ying)
pub mod feats;

/// Feature normalizers
pub mod normalize;

/// Synthesis networks (the `svs` slot)
pub mod svs;

// ============================================================================
// Assembly
// ============================================================================

/// The assembled model container
pub mod model;

/// The task composition root (`build_model` and friends)
pub mod task;

// ============================================================================
// Data Pipeline Contracts
// ============================================================================

/// Text/label preprocessing
pub mod preprocess;

/// Batch collation
pub mod collate;

/// Vocoder resolution
pub mod vocoder;

pub use config::{TaskConfig, TokenListSource};
pub use error::{TaskError, TaskResult};
pub use model::{ModelKind, SvsModel};
pub use task::SvsTask;
