//! Error types for snowfall.
//!
//! This module provides error types for field allocation, GPU initialization
//! and running the viewer.

use std::fmt;

/// Errors that can occur when (re)allocating a particle field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// A field must hold at least one particle.
    InvalidCapacity {
        /// The capacity that was asked for.
        requested: usize,
    },
    /// A position buffer whose length is not a whole number of `[x, y, z]` triples.
    MisalignedBuffer {
        /// Length of the rejected buffer, in floats.
        len: usize,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidCapacity { requested } => write!(
                f,
                "Invalid particle capacity {}: a field needs at least one particle",
                requested
            ),
            FieldError::MisalignedBuffer { len } => write!(
                f,
                "Position buffer of {} floats is not a whole number of xyz triples",
                len
            ),
        }
    }
}

impl std::error::Error for FieldError {}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when running the viewer.
#[derive(Debug)]
pub enum ViewerError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The initial particle field could not be allocated.
    Field(FieldError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EventLoop(e) => write!(f, "Failed to run event loop: {}", e),
            ViewerError::Window(e) => write!(f, "Failed to create window: {}", e),
            ViewerError::Gpu(e) => write!(f, "GPU error: {}", e),
            ViewerError::Field(e) => write!(f, "Particle field error: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::EventLoop(e) => Some(e),
            ViewerError::Window(e) => Some(e),
            ViewerError::Gpu(e) => Some(e),
            ViewerError::Field(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ViewerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(e: winit::error::OsError) -> Self {
        ViewerError::Window(e)
    }
}

impl From<GpuError> for ViewerError {
    fn from(e: GpuError) -> Self {
        ViewerError::Gpu(e)
    }
}

impl From<FieldError> for ViewerError {
    fn from(e: FieldError) -> Self {
        ViewerError::Field(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_invalid_capacity_message() {
        let err = FieldError::InvalidCapacity { requested: 0 };
        assert!(err.to_string().contains("at least one particle"));
    }

    #[test]
    fn test_viewer_error_wraps_field_error() {
        let err: ViewerError = FieldError::InvalidCapacity { requested: 0 }.into();
        assert!(matches!(err, ViewerError::Field(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_no_adapter_has_no_source() {
        assert!(GpuError::NoAdapter.source().is_none());
    }
}
