// Copyright 2025 Memsynth (https://github.com/memsynth)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Memory synthesis error types
//!
//! The pipeline itself never fails on malformed input. These errors only
//! surface at the edges: decoding a payload, loading configuration, and
//! probing the filesystem for related documents.

use thiserror::Error;

/// Result type for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Errors that can occur around the memory pipeline
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Payload could not be decoded
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Related-document probe failed
    #[error("Probe error for {path}: {reason}")]
    ProbeError { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for MemoryError {
    fn from(e: serde_json::Error) -> Self {
        MemoryError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for MemoryError {
    fn from(e: toml::de::Error) -> Self {
        MemoryError::ConfigError(e.to_string())
    }
}
