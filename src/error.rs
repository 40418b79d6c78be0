use thiserror::Error;

/// Failures raised while creating, resizing or drawing a render surface
#[derive(Debug, Error)]
pub enum RenderError {
    /// The pixel buffer is not 32 bits per pixel
    #[error("pixel format mismatch: expected 32 bits per pixel, found {0}")]
    PixelFormat(u16),

    /// The requested surface has no area
    #[error("surface size {width}x{height} is empty")]
    EmptySurface { width: u32, height: u32 },

    /// The backend refused to allocate a surface of this size
    #[error("failed to allocate a {width}x{height} drawing surface")]
    SurfaceAllocation { width: u32, height: u32 },

    /// Pixel data does not match the size of the texture it is uploaded to
    #[error("invalid pixel buffer size: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// The renderer was used before `init` succeeded
    #[error("renderer is not initialized")]
    NotInitialized,

    #[error("window surface reports no supported texture format")]
    UnsupportedSurface,

    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to acquire surface frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;
