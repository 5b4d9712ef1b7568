//! Offscreen device and render target for backend tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::coords::Viewport;
use crate::handle::Handle;

use super::{RenderCtx, RendererBackend};

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub(crate) const TARGET_SIZE: u32 = 64;

/// One device at a time; software adapters do not like concurrent contexts.
static DEVICE_LOCK: Mutex<()> = Mutex::new(());

pub(crate) struct Headless {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) view: wgpu::TextureView,
    _target: wgpu::Texture,
    _guard: MutexGuard<'static, ()>,
}

impl Headless {
    /// Returns `None` when no adapter is available; callers skip the test.
    pub(crate) fn new() -> Option<Self> {
        let guard = DEVICE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }));
        let Ok(adapter) = adapter else {
            eprintln!("no GPU adapter; skipping backend test");
            return None;
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("tribatch test device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .ok()?;

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tribatch test target"),
            size: wgpu::Extent3d {
                width: TARGET_SIZE,
                height: TARGET_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        Some(Self {
            device,
            queue,
            view,
            _target: target,
            _guard: guard,
        })
    }

    pub(crate) fn ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(
            &self.device,
            &self.queue,
            TARGET_FORMAT,
            Viewport::new(TARGET_SIZE, TARGET_SIZE),
        )
    }

    /// Creates a solid 4x4 texture through `backend`.
    pub(crate) fn solid_texture(&self, backend: &mut dyn RendererBackend, rgba: [u8; 4]) -> Handle {
        let pixels: Vec<u8> = rgba.iter().copied().cycle().take(4 * 4 * 4).collect();
        backend.create_texture(&self.ctx(), 4, 4, &pixels)
    }
}
