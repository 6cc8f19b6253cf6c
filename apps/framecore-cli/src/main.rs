use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use framecore_assets::{AssetLoader, AssetManifest, FsAssetLoader, MemoryAssetLoader};
use framecore_driver::{DriverConfig, FrameDriver};
use framecore_input::{InputSource, KeyCode, ScriptedInput};
use framecore_render::{DrawStats, GpuCommand, RecordingBackend, ResourceTracker, ShadingMode};
use framecore_tools::{FrameInspector, FrameSummary, SceneSummary};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod demo;
mod overlay;

use overlay::{PanelEvent, ScriptedPanel};

#[derive(Parser)]
#[command(
    name = "framecore-cli",
    about = "Headless runner for the framecore demo scene"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build the demo scene and run it against the recording backend
    Run {
        /// Number of frames before the scripted close
        #[arg(short, long, default_value = "300")]
        frames: u64,
        /// Simulated seconds per frame
        #[arg(long, default_value = "0.016")]
        frame_time: f64,
        /// Driver config JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the initial post effect
        #[arg(short, long)]
        effect: Option<usize>,
        /// Asset manifest JSON for the in-memory loader
        #[arg(short, long, conflicts_with = "asset_root")]
        manifest: Option<PathBuf>,
        /// Load assets from disk instead of a manifest
        #[arg(long)]
        asset_root: Option<PathBuf>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the built-in asset manifest
    Manifest,
    /// Print the default driver config
    Config,
}

/// Totals over one run.
#[derive(Debug, Serialize)]
struct RunReport {
    scene: SceneSummary,
    summary: FrameSummary,
    draw: DrawStats,
    frames_presented: u64,
    final_effect: Option<String>,
    resources_released: usize,
}

/// Keys and stalls replayed over the run. The camera dollies in and flips
/// to orthographic and back, and one long stall hits the delta clamp.
fn scripted_input(frames: u64, frame_time: f64) -> ScriptedInput {
    ScriptedInput::new(frame_time)
        .hold(KeyCode::I, 10..40)
        .tap(KeyCode::Y, 45)
        .tap(KeyCode::T, 60)
        .tap(KeyCode::T, 90)
        .tap(KeyCode::KeypadAdd, 100)
        .stall(120, 2.5)
        .close_after(frames)
}

fn scripted_panel() -> ScriptedPanel {
    ScriptedPanel::new()
        .at(30, PanelEvent::Mode(ShadingMode::AmbientSpecularBloom))
        .at(40, PanelEvent::Threshold(0.6))
        .at(40, PanelEvent::Passes(6))
        .at(150, PanelEvent::ToggleTextures)
        .at(180, PanelEvent::ToggleRim)
        .at(200, PanelEvent::Mode(ShadingMode::AmbientSpecular))
        .at(220, PanelEvent::ToggleTextures)
}

struct RunArgs {
    frames: u64,
    frame_time: f64,
    config: Option<PathBuf>,
    effect: Option<usize>,
    manifest: Option<PathBuf>,
    asset_root: Option<PathBuf>,
}

fn loader(args: &RunArgs, tracker: ResourceTracker) -> anyhow::Result<Box<dyn AssetLoader>> {
    if let Some(root) = &args.asset_root {
        tracing::info!(root = %root.display(), "loading assets from disk");
        return Ok(Box::new(FsAssetLoader::new(root, tracker)));
    }
    let manifest = match &args.manifest {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading manifest {}", path.display()))?;
            AssetManifest::from_json(&json)?
        }
        None => demo::builtin_manifest(),
    };
    Ok(Box::new(MemoryAssetLoader::new(manifest, tracker)))
}

fn run(args: RunArgs) -> anyhow::Result<RunReport> {
    let mut config = match &args.config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };
    if let Some(effect) = args.effect {
        config.initial_effect = effect;
    }

    let mut gpu = RecordingBackend::new();
    let mut assets = loader(&args, ResourceTracker::new())?;
    let demo = demo::build(assets.as_mut(), &mut gpu, config.viewport)?;
    drop(assets);

    let mut driver = FrameDriver::new(
        config,
        demo.setup,
        gpu,
        scripted_input(args.frames, args.frame_time),
    )?
    .with_controllables(demo.controllables)
    .with_script(demo.spin)
    .with_overlay(scripted_panel())
    .with_texture_toggle(demo.textures);

    let scene = FrameInspector::scene_summary(driver.scene());
    let mut draw = DrawStats::default();
    while !driver.input().close_requested() {
        let report = driver.run_frame()?;
        draw.shader_binds += report.draw.shader_binds;
        draw.material_applies += report.draw.material_applies;
        draw.draw_calls += report.draw.draw_calls;
    }
    let summary = driver.summary();
    let final_effect = driver.chain().active_name().map(str::to_string);

    let backend = driver.shutdown();
    Ok(RunReport {
        scene,
        summary,
        draw,
        frames_presented: backend.frames_presented(),
        final_effect,
        resources_released: backend.count(|c| matches!(c, GpuCommand::Release(_))),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("framecore-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("default viewport: {:?}", DriverConfig::default().viewport);
            println!("built-in assets: {}", {
                let manifest = demo::builtin_manifest();
                manifest.meshes.len() + manifest.textures.len() + manifest.shaders.len()
            });
        }
        Commands::Run {
            frames,
            frame_time,
            config,
            effect,
            manifest,
            asset_root,
            json,
        } => {
            let report = run(RunArgs {
                frames,
                frame_time,
                config,
                effect,
                manifest,
                asset_root,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.scene);
                println!("{}", report.summary);
                println!(
                    "draw: shader_binds={} material_applies={} draw_calls={}",
                    report.draw.shader_binds, report.draw.material_applies, report.draw.draw_calls
                );
                println!(
                    "presented={} effect={} released={}",
                    report.frames_presented,
                    report.final_effect.as_deref().unwrap_or("none"),
                    report.resources_released
                );
            }
        }
        Commands::Manifest => {
            println!("{}", demo::builtin_manifest().to_json()?);
        }
        Commands::Config => {
            println!("{}", DriverConfig::default().to_json()?);
        }
    }

    Ok(())
}
