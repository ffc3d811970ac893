// SPDX-License-Identifier: MIT OR Apache-2.0
//! wgpu presentation of egui frames.
//!
//! The stage never draws to the GPU itself: every frame is an egui
//! `FullOutput` that gets uploaded, painted over the stage background and
//! presented.

use crate::app::{AppError, Result};
use egui_wgpu::wgpu;
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Swapchain frames queued ahead of the display
const FRAME_LATENCY: u32 = 2;

/// Owns the window surface, the device and the egui paint pipeline
pub struct StageRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    painter: egui_wgpu::Renderer,
}

impl StageRenderer {
    /// Bind a renderer to the window
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| AppError::RendererInit(e.to_string()))?;

        let (adapter, device, queue) = pollster::block_on(request_gpu(&instance, &surface))?;

        let caps = surface.get_capabilities(&adapter);
        let format = pick_surface_format(&caps.formats)
            .ok_or_else(|| AppError::RendererInit("surface reports no formats".to_string()))?;
        let config = surface_config(format, &caps.alpha_modes, window.inner_size());
        surface.configure(&device, &config);

        tracing::debug!("Surface format {format:?}, {}x{}", config.width, config.height);

        let painter = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            painter,
        })
    }

    /// Follow a window resize; zero-sized windows keep the old swapchain
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.reconfigure();
    }

    /// Rebuild the swapchain after it was lost or outdated
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Paint one egui frame over `background` and present it
    pub fn present(
        &mut self,
        ctx: &egui::Context,
        output: egui::FullOutput,
        background: egui::Color32,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let target = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: output.pixels_per_point,
        };
        let jobs = ctx.tessellate(output.shapes, output.pixels_per_point);

        for (id, delta) in &output.textures_delta.set {
            self.painter.update_texture(&self.device, &self.queue, *id, delta);
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("stage frame"),
        });
        let mut command_buffers =
            self.painter
                .update_buffers(&self.device, &self.queue, &mut encoder, &jobs, &screen);
        self.paint(&mut encoder, &target, &jobs, &screen, clear_color(background));
        command_buffers.push(encoder.finish());

        self.queue.submit(command_buffers);
        frame.present();

        for id in &output.textures_delta.free {
            self.painter.free_texture(id);
        }
        Ok(())
    }

    fn paint(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        jobs: &[egui::ClippedPrimitive],
        screen: &egui_wgpu::ScreenDescriptor,
        clear: wgpu::Color,
    ) {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("stage pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();
        self.painter.render(&mut pass, jobs, screen);
    }
}

async fn request_gpu(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'static>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| AppError::RendererInit("no suitable GPU adapter".to_string()))?;

    let info = adapter.get_info();
    tracing::info!("Using GPU: {} ({:?})", info.name, info.backend);

    let descriptor = wgpu::DeviceDescriptor {
        label: Some("mediastage device"),
        ..Default::default()
    };
    let (device, queue) = adapter
        .request_device(&descriptor, None)
        .await
        .map_err(|e| AppError::RendererInit(e.to_string()))?;

    Ok((adapter, device, queue))
}

/// sRGB formats first so egui's colors come out unshifted
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| formats.first().copied())
}

fn surface_config(
    format: wgpu::TextureFormat,
    alpha_modes: &[wgpu::CompositeAlphaMode],
    size: PhysicalSize<u32>,
) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
        desired_maximum_frame_latency: FRAME_LATENCY,
    }
}

/// Linear clear color for an sRGB egui color
fn clear_color(color: egui::Color32) -> wgpu::Color {
    let linear = egui::Rgba::from(color);
    wgpu::Color {
        r: f64::from(linear.r()),
        g: f64::from(linear.g()),
        b: f64::from(linear.b()),
        a: f64::from(linear.a()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn test_pick_surface_format() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Bgra8UnormSrgb];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Bgra8UnormSrgb));

        let formats = [TextureFormat::Rgba16Float, TextureFormat::Bgra8Unorm];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Rgba16Float));

        assert_eq!(pick_surface_format(&[]), None);
    }

    #[test]
    fn test_surface_config_never_zero_sized() {
        let config = surface_config(TextureFormat::Bgra8UnormSrgb, &[], PhysicalSize::new(0, 0));
        assert_eq!((config.width, config.height), (1, 1));
        assert_eq!(config.alpha_mode, wgpu::CompositeAlphaMode::Auto);

        let config = surface_config(
            TextureFormat::Bgra8UnormSrgb,
            &[wgpu::CompositeAlphaMode::Opaque],
            PhysicalSize::new(1400, 860),
        );
        assert_eq!((config.width, config.height), (1400, 860));
        assert_eq!(config.alpha_mode, wgpu::CompositeAlphaMode::Opaque);
    }

    #[test]
    fn test_clear_color_is_linear() {
        let black = clear_color(egui::Color32::BLACK);
        assert_eq!((black.r, black.g, black.b, black.a), (0.0, 0.0, 0.0, 1.0));

        let white = clear_color(egui::Color32::WHITE);
        assert!((white.r - 1.0).abs() < 1e-6);

        // sRGB mid gray is darker in linear space
        let gray = clear_color(egui::Color32::from_gray(128));
        assert!(gray.r > 0.2 && gray.r < 0.25);
    }
}
