//! Error types for trabec.
//!
//! This module defines all error types used throughout the library.
//!
//! Errors are reserved for construction and validation: operations that
//! edit an existing mesh (edge swap, edge collapse, face deletion) report
//! failure through boolean returns instead, so batch callers can skip a
//! rejected candidate and try the next one without unwinding.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while building or validating mesh data.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has repeated corner indices where distinct ones are required.
    #[error("face {face} is degenerate (has repeated corner indices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A per-vertex attribute channel does not run parallel to the
    /// vertex array.
    #[error("{channel} channel has {actual} entries, expected {expected}")]
    ChannelLengthMismatch {
        /// Name of the attribute channel.
        channel: &'static str,
        /// Expected entry count (the vertex count).
        expected: usize,
        /// Actual entry count supplied.
        actual: usize,
    },

    /// An n-gon references a face index outside the face array.
    #[error("ngon references invalid face index {face}")]
    InvalidNgonFace {
        /// The invalid face index.
        face: usize,
    },

    /// An n-gon references a vertex index outside the vertex array.
    #[error("ngon references invalid vertex index {vertex}")]
    InvalidNgonVertex {
        /// The invalid vertex index.
        vertex: usize,
    },

    /// An n-gon has an empty face or vertex list.
    #[error("ngon has an empty {list} list")]
    EmptyNgon {
        /// Which list was empty ("face" or "vertex").
        list: &'static str,
    },
}
