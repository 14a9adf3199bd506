//! Stitchflow Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Stitchflow routing
//! engine and its front ends:
//!
//! - **Identifiers**: String-interned identifiers ([`identifier::Id`])
//! - **Geometry**: Canvas points, sizes and bounds ([`geometry`] module)
//! - **Model**: Parts, edges and connectors ([`model`] module)
//! - **Settings**: Process-step payloads and snapshots ([`settings`] module)
//! - **Snapshot**: The persisted diagram shape ([`snapshot::Snapshot`])

pub mod geometry;
pub mod identifier;
pub mod model;
pub mod settings;
pub mod snapshot;
