use winit::dpi::PhysicalSize;

/// Depth attachment kept at the surface size.
pub struct DepthBuffer {
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: PhysicalSize<u32>) -> Self {
        Self {
            format,
            size,
            view: create_view(device, format, size),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Reallocates the texture when `size` changed; zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        if size == self.size || size.width == 0 || size.height == 0 {
            return;
        }
        self.size = size;
        self.view = create_view(device, self.format, size);
    }
}

fn create_view(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
) -> wgpu::TextureView {
    log::debug!("depth texture {}x{} ({format:?})", size.width, size.height);
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("facet depth texture"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}
