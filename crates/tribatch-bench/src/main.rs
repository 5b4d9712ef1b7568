use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use tribatch_engine::coords::Viewport;
use tribatch_engine::core::{App, AppControl, FrameCtx};
use tribatch_engine::handle::Handle;
use tribatch_engine::logging::init_logging;
use tribatch_engine::render::{
    create_backend, FrameStats, ProfileSample, RenderCtx, RendererBackend,
};
use tribatch_engine::scene::{Vertex, QUAD_INDICES};
use tribatch_engine::texture::ImageData;
use tribatch_engine::time::IntervalTimer;
use tribatch_engine::window::Runtime;

mod args;
mod workload;

use args::Args;
use workload::Placement;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.logging_config());

    log::info!(
        "backend={} quads={} textures={} churn={} capacity={}",
        args.backend,
        args.quads,
        args.textures,
        args.churn,
        args.capacity
    );

    let app = Bench::new(&args);
    Runtime::run(args.runtime_config(), args.gpu_init(), app)
}

/// Running averages between two profile reports.
#[derive(Debug, Default)]
struct Totals {
    frames: u32,
    cpu: Duration,
    draws: u64,
    binds: u64,
    uploads: u64,
    released: u64,
}

impl Totals {
    fn add(&mut self, cpu: Duration, stats: &FrameStats) {
        self.frames += 1;
        self.cpu += cpu;
        self.draws += u64::from(stats.draw_calls);
        self.binds += u64::from(stats.bind_calls);
        self.uploads += u64::from(stats.uploads);
        self.released += u64::from(stats.textures_released);
    }
}

struct Bench {
    backend: Box<dyn RendererBackend>,
    ready: bool,

    image: Option<ImageData>,
    texture_count: usize,
    textures: Vec<Handle>,

    quads: u32,
    quad: [Vertex; 4],
    layout: Vec<Placement>,
    layout_viewport: Viewport,

    churn: bool,
    churn_cursor: usize,

    frames_left: Option<u64>,
    report: IntervalTimer,
    totals: Totals,
    last_sample: ProfileSample,
}

impl Bench {
    fn new(args: &Args) -> Self {
        let image = args.image.as_ref().and_then(|path| match ImageData::load(path) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("{e}; using generated textures");
                None
            }
        });

        Self {
            backend: create_backend(args.backend, args.backend_config()),
            ready: false,
            image,
            texture_count: usize::from(args.textures),
            textures: Vec::new(),
            quads: args.quads,
            quad: Vertex::quad([-0.5, -0.5], [0.5, 0.5]),
            layout: Vec::new(),
            layout_viewport: Viewport::default(),
            churn: args.churn,
            churn_cursor: 0,
            frames_left: args.frames,
            report: IntervalTimer::new(Duration::from_secs(1)),
            totals: Totals::default(),
            last_sample: ProfileSample::default(),
        }
    }

    fn setup(&mut self, rctx: &RenderCtx<'_>) -> Result<()> {
        self.backend.setup(rctx)?;

        let textures: Vec<Handle> = (0..self.texture_count)
            .map(|slot| self.create_texture(rctx, slot))
            .collect();
        self.textures = textures;
        let live = self.textures.iter().filter(|h| h.is_valid()).count();
        log::info!("{live} of {} textures created", self.texture_count);
        Ok(())
    }

    fn create_texture(&mut self, rctx: &RenderCtx<'_>, slot: usize) -> Handle {
        let image = workload::texture_pixels(self.image.as_ref(), slot);
        self.backend
            .create_texture(rctx, image.width, image.height, &image.pixels)
    }

    fn relayout(&mut self, viewport: Viewport) {
        if viewport == self.layout_viewport && !self.layout.is_empty() {
            return;
        }
        self.layout = workload::grid(self.quads, viewport, self.texture_count);
        self.layout_viewport = viewport;
    }

    /// Records and submits one frame; returns the slot destroyed for churn, if any.
    fn record(&mut self, rctx: &RenderCtx<'_>, target: &wgpu::TextureView) -> (FrameStats, Option<usize>) {
        self.backend.begin_frame(rctx, target);

        for placement in &self.layout {
            self.backend.uniform(&placement.uniform);
            self.backend.texture(self.textures[placement.slot]);
            self.backend.draw(rctx, &self.quad, &QUAD_INDICES);
        }

        // Destroy after the draws that use it were recorded: the destroy policy
        // decides whether the frame still renders it.
        let churned = (self.churn && !self.textures.is_empty()).then(|| {
            let slot = self.churn_cursor % self.textures.len();
            self.backend.destroy_texture(self.textures[slot]);
            self.churn_cursor += 1;
            slot
        });

        (self.backend.end_frame(rctx), churned)
    }

    fn report(&mut self, now: Instant) {
        if !self.report.ready(now) || self.totals.frames == 0 {
            return;
        }
        let w = std::mem::take(&mut self.totals);
        let frames = f64::from(w.frames);

        log::info!(
            "{}: {:.3} ms cpu/frame, {:.0} draws/s, {:.0} draws {:.0} binds {:.0} uploads per frame, {} textures released",
            self.backend.kind(),
            w.cpu.as_secs_f64() * 1000.0 / frames,
            self.last_sample.draws_per_second,
            w.draws as f64 / frames,
            w.binds as f64 / frames,
            w.uploads as f64 / frames,
            w.released,
        );
    }
}

impl App for Bench {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.ready {
            let rctx = ctx.render_ctx();
            if let Err(e) = self.setup(&rctx) {
                log::error!("backend setup failed: {e:#}");
                return AppControl::Exit;
            }
            self.ready = true;
        }

        let size = ctx.gpu.size();
        self.relayout(Viewport::new(size.width, size.height));

        let started = Instant::now();
        let mut outcome = None;
        let control = ctx.render(|rctx, view| {
            let (stats, churned) = self.record(rctx, view);
            if let Some(slot) = churned {
                self.textures[slot] = self.create_texture(rctx, slot);
            }
            outcome = Some(stats);
        });
        let cpu = started.elapsed();

        if let Some(stats) = outcome {
            self.last_sample = ProfileSample::from_frame(cpu, &stats);
            self.totals.add(cpu, &stats);
        }
        self.report(ctx.time.now);

        if let Some(left) = self.frames_left.as_mut() {
            *left = left.saturating_sub(1);
            if *left == 0 {
                log::info!("frame limit reached");
                ctx.runtime.exit();
            }
        }
        control
    }

    fn on_exit(&mut self) {
        if self.ready {
            let stats = self.backend.stats();
            log::info!("last frame: {stats:?}");
            self.backend.cleanup();
            self.ready = false;
        }
    }
}
