//! Error types for Flamometer.
//!
//! The engine itself cannot fail; these cover the native window, the GPU
//! presenter and PNG export.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    NoSurfaceFormat,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::NoSurfaceFormat => write!(f, "GPU surface has no supported texture format"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
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

/// Errors that can occur when saving a rendered frame.
#[derive(Debug)]
pub enum ExportError {
    /// The surface has no pixels to save.
    EmptySurface,
    /// Failed to encode the image.
    Image(image::ImageError),
    /// Failed to write the file.
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptySurface => write!(f, "Cannot export an empty surface"),
            ExportError::Image(e) => write!(f, "Failed to encode image: {}", e),
            ExportError::Io(e) => write!(f, "Failed to write image file: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::EmptySurface => None,
            ExportError::Image(e) => Some(e),
            ExportError::Io(e) => Some(e),
        }
    }
}

impl From<image::ImageError> for ExportError {
    fn from(e: image::ImageError) -> Self {
        ExportError::Image(e)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// Errors that can occur when running the native window.
#[derive(Debug)]
pub enum HostError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            HostError::Window(e) => write!(f, "Failed to create window: {}", e),
            HostError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::EventLoop(e) => Some(e),
            HostError::Window(e) => Some(e),
            HostError::Gpu(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for HostError {
    fn from(e: winit::error::EventLoopError) -> Self {
        HostError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for HostError {
    fn from(e: winit::error::OsError) -> Self {
        HostError::Window(e)
    }
}

impl From<GpuError> for HostError {
    fn from(e: GpuError) -> Self {
        HostError::Gpu(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_export_error_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExportError::from(io);
        assert!(err.to_string().contains("denied"));
        assert!(err.source().is_some());
        assert!(ExportError::EmptySurface.source().is_none());
    }

    #[test]
    fn test_host_error_wraps_gpu() {
        let err = HostError::from(GpuError::NoAdapter);
        assert!(err.to_string().starts_with("GPU error"));
        assert!(err.source().is_some());
    }
}
