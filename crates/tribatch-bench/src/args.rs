use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use winit::dpi::LogicalSize;

use tribatch_engine::device::GpuInit;
use tribatch_engine::logging::LoggingConfig;
use tribatch_engine::render::{BackendConfig, BackendKind};
use tribatch_engine::texture::TextureFilter;
use tribatch_engine::window::RuntimeConfig;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum FilterArg {
    Nearest,
    Linear,
}

impl From<FilterArg> for TextureFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => TextureFilter::Nearest,
            FilterArg::Linear => TextureFilter::Linear,
        }
    }
}

/// Draws a grid of textured quads with one backend and logs frame timings.
#[derive(Debug, Parser)]
#[command(name = "tribatch-bench", version)]
pub struct Args {
    /// Backend strategy: immediate, batched or per-draw.
    #[arg(long, default_value_t = BackendKind::Batched)]
    pub backend: BackendKind,

    /// Quads drawn per frame.
    #[arg(long, default_value_t = 1000)]
    pub quads: u32,

    /// Distinct textures cycled across the quads.
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u16).range(1..))]
    pub textures: u16,

    /// Image file used for every texture instead of generated checkerboards.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Destroy and re-create one texture every frame.
    #[arg(long)]
    pub churn: bool,

    /// Texture handle pool size.
    #[arg(long, default_value_t = 128)]
    pub capacity: u16,

    #[arg(long, value_enum, default_value_t = FilterArg::Linear)]
    pub filter: FilterArg,

    /// Log filter (env_logger syntax); overrides RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,

    /// Exit after this many frames.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Wait for vertical sync instead of presenting as fast as possible.
    #[arg(long)]
    pub vsync: bool,
}

impl Args {
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            texture_capacity: self.capacity,
            filter: self.filter.into(),
            ..BackendConfig::default()
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            title: format!("tribatch bench ({}, {} quads)", self.backend, self.quads),
            initial_size: LogicalSize::new(1024.0, 768.0),
            ..RuntimeConfig::default()
        }
    }

    pub fn gpu_init(&self) -> GpuInit {
        GpuInit::default().with_vsync(self.vsync)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            env_filter: self.log.clone(),
            ..LoggingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("tribatch-bench").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.backend, BackendKind::Batched);
        assert_eq!(args.quads, 1000);
        assert_eq!(args.textures, 8);
        assert!(!args.churn);
        assert_eq!(args.backend_config().texture_capacity, 128);
        assert_eq!(args.backend_config().filter, TextureFilter::Linear);
    }

    #[test]
    fn full_command_line() {
        let args = parse(&[
            "--backend", "per-draw", "--quads", "50", "--textures", "3", "--churn",
            "--capacity", "16", "--filter", "nearest", "--log", "debug", "--frames", "10",
        ])
        .unwrap();

        assert_eq!(args.backend, BackendKind::PerDrawUniform);
        assert_eq!(args.quads, 50);
        assert_eq!(args.textures, 3);
        assert!(args.churn);
        assert_eq!(args.frames, Some(10));
        assert_eq!(args.logging_config().env_filter.as_deref(), Some("debug"));

        let config = args.backend_config();
        assert_eq!(config.texture_capacity, 16);
        assert_eq!(config.filter, TextureFilter::Nearest);
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!(parse(&["--backend", "instanced"]).is_err());
    }

    #[test]
    fn zero_textures_rejected() {
        assert!(parse(&["--textures", "0"]).is_err());
    }

    #[test]
    fn vsync_selects_present_mode() {
        assert_eq!(parse(&[]).unwrap().gpu_init().present_mode, wgpu::PresentMode::AutoNoVsync);
        assert_eq!(
            parse(&["--vsync"]).unwrap().gpu_init().present_mode,
            wgpu::PresentMode::AutoVsync
        );
    }
}
