//! Resume analysis and interview-readiness scoring for hiring workflows.
//!
//! The crate exposes a library-level boundary: callers hand it an extraction
//! result plus job context and receive a structured, scored assessment back.
//! All collaborator integrations (prompt storage, model providers, document
//! storage, telemetry) are traits so the pipeline can be exercised with
//! in-memory fakes.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
