//! Window surface presenter
//!
//! The reference GL backend does not rasterize, so the player shows each
//! finished frame by clearing the window surface to the trace's current clear
//! color and presenting it.

use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

/// wgpu surface for the replay window.
pub struct SurfacePresenter {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    presents: u64,
}

impl SurfacePresenter {
    /// Create a presenter for the given window.
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        }))
        .context("Failed to find suitable GPU adapter")?;
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Retrace Device"),
            ..Default::default()
        }))
        .context("Failed to create GPU device")?;

        // The clear color is written as-is, so any supported format will do.
        let size = window.inner_size();
        let surface_config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .context("Surface is not supported by the adapter")?;
        surface.configure(&device, &surface_config);
        tracing::debug!("Replay surface format: {:?}", surface_config.format);

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            presents: 0,
        })
    }

    /// Frames presented so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// Resize the surface. Zero-sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
            tracing::debug!("Replay surface resized to {}x{}", width, height);
        }
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.surface_config);
                self.surface
                    .get_current_texture()
                    .context("Failed to acquire frame after reconfigure")
            }
            Err(e) => Err(e).context("Failed to acquire frame"),
        }
    }

    /// Clear the surface to `color` (RGBA, 0..1) and present it.
    pub fn present(&mut self, color: [f32; 4]) -> Result<()> {
        let frame = self.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });
        {
            let [r, g, b, a] = color.map(|c| f64::from(c.clamp(0.0, 1.0)));
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.presents += 1;
        Ok(())
    }
}
