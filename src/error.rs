//! Error types for the path tracer host.

use thiserror::Error;

/// Errors raised while packing the scene or driving the GPU passes.
#[derive(Error, Debug)]
pub enum TracerError {
    /// A collaborator the tracer cannot run without was not configured
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    /// Texture atlas layers must share one size, mip count and format
    #[error("Texture atlas mismatch at slot {slot}: expected {expected}, found {found}")]
    TextureAtlasMismatch {
        slot: usize,
        expected: String,
        found: String,
    },

    /// The device refused a buffer allocation
    #[error("Failed to allocate {label} ({bytes} bytes): {reason}")]
    BufferAllocationFailure {
        label: &'static str,
        bytes: u64,
        reason: String,
    },

    /// The device rejected a compute submission
    #[error("Compute dispatch rejected: {0}")]
    DeviceDispatchFailure(String),

    /// Mesh data cannot be packed
    #[error("Invalid mesh {mesh}: {reason}")]
    InvalidMesh { mesh: usize, reason: String },

    /// Surface acquisition failed in the host loop
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// No usable adapter, device or surface at startup
    #[error("Device initialisation failed: {0}")]
    DeviceInit(String),
}

/// Result type for tracer operations.
pub type Result<T> = std::result::Result<T, TracerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_mismatch_message_names_slot() {
        let err = TracerError::TextureAtlasMismatch {
            slot: 2,
            expected: "64x64".into(),
            found: "32x32".into(),
        };
        assert_eq!(
            err.to_string(),
            "Texture atlas mismatch at slot 2: expected 64x64, found 32x32"
        );
    }
}
