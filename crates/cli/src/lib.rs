mod script;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use doc_model::{ContainerSize, ViewerConfig};
use pdf_engine::{default_engine, LopdfEngine, OpenSource};
use script::{ScriptCommand, ZoomStep};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use storage::Storage;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use viewer_core::{
    FlipCommand, FlipbookViewer, PageRenderRequest, ToolbarModel, ViewerHost, ViewerSnapshot,
};

#[derive(Debug, Parser)]
#[command(name = "flipbook-cli")]
#[command(about = "Flipbook viewer CLI", version)]
pub struct Cli {
    /// Viewer config file (defaults to the per-user config).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// More log output on stderr; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF details.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the layout the viewer computes for a container size.
    Layout {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
        /// 1-based page to open at.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 1.0)]
        zoom: f32,
        #[arg(long, default_value_t = 1.0)]
        dpr: f32,
    },
    /// Replay an input script and print the viewer state after each line.
    Replay {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
        #[arg(long, default_value_t = 1.0)]
        dpr: f32,
        #[arg(long, value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Render a placeholder PNG for a page at viewer resolution.
    RenderPage {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        height: f32,
        #[arg(long, default_value_t = 1.0)]
        dpr: f32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Inspect or create the viewer config.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective config as JSON.
    Show,
    /// Write the default config.
    Init {
        /// Target file (defaults to --config, then the per-user config).
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    total_pages: u32,
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    path: String,
    #[serde(flatten)]
    snapshot: ViewerSnapshot,
    toolbar: Option<ToolbarModel>,
    render_requests: Vec<PageRenderRequest>,
}

#[derive(Debug, Serialize)]
struct ReplayStep<'a> {
    line: usize,
    command: &'a str,
    at_ms: u64,
    flips: Vec<FlipCommand>,
    #[serde(flatten)]
    snapshot: ViewerSnapshot,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing(cli.verbose)?;

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Info { file } => run_info(&file, config_path),
        Commands::Layout { file, width, height, page, zoom, dpr } => {
            run_layout(&file, config_path, ContainerSize::new(width, height), page, zoom, dpr)
        }
        Commands::Replay { file, width, height, dpr, script } => {
            run_replay(&file, config_path, ContainerSize::new(width, height), dpr, &script)
        }
        Commands::RenderPage { file, page, height, dpr, output } => {
            run_render_page(&file, config_path, page, height, dpr, output.as_deref())
        }
        Commands::Config { action: ConfigAction::Show } => run_config_show(config_path),
        Commands::Config { action: ConfigAction::Init { path, force } } => {
            run_config_init(path.as_deref().or(config_path), force)
        }
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    if let Some(path) = path {
        return storage::load_config_file(path)
            .with_context(|| format!("failed to read config {}", path.display()));
    }

    match Storage::from_default_project() {
        Ok(store) => store.load_config().context("failed to read user config"),
        Err(error) => {
            tracing::warn!(%error, "using default viewer config");
            Ok(ViewerConfig::default())
        }
    }
}

fn open_viewer(
    file: &Path,
    config_path: Option<&Path>,
    device_pixel_ratio: f32,
) -> Result<FlipbookViewer<LopdfEngine>> {
    ensure_pdf_exists(file)?;
    let config = load_config(config_path)?;

    let mut viewer =
        FlipbookViewer::new(default_engine(), config, ViewerHost::new(true, device_pixel_ratio));
    viewer.load(OpenSource::from(file)).context("failed to open PDF")?;

    Ok(viewer)
}

fn run_info(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let mut viewer = open_viewer(file, config_path, 1.0)?;
    let details = viewer.details().context("document details unavailable")?;

    let payload = InfoOutput {
        path: file.display().to_string(),
        total_pages: details.total_pages,
        width: details.width,
        height: details.height,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    viewer.unmount()?;

    Ok(())
}

fn run_layout(
    file: &Path,
    config_path: Option<&Path>,
    container: ContainerSize,
    page: u32,
    zoom: f32,
    dpr: f32,
) -> Result<()> {
    let page_index = page_index(page)?;
    let mut viewer = open_viewer(file, config_path, dpr)?;

    viewer.size_observer().observe(container);
    if page_index > 0 {
        viewer.on_flip(page_index);
    }
    viewer.set_zoom(zoom);

    let payload = LayoutOutput {
        path: file.display().to_string(),
        snapshot: viewer.snapshot(),
        toolbar: viewer.toolbar(),
        render_requests: viewer.render_requests(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    viewer.unmount()?;

    Ok(())
}

fn run_replay(
    file: &Path,
    config_path: Option<&Path>,
    container: ContainerSize,
    dpr: f32,
    script_path: &Path,
) -> Result<()> {
    let source = fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let script = script::parse_script(&source)?;

    let mut viewer = open_viewer(file, config_path, dpr)?;
    viewer.size_observer().observe(container);

    let start = Instant::now();
    let mut elapsed_ms = 0u64;
    let mut out = io::stdout().lock();

    for line in &script {
        match line.command {
            ScriptCommand::Wheel { at_ms: Some(at_ms), .. } => elapsed_ms = elapsed_ms.max(at_ms),
            ScriptCommand::Wait(ms) => elapsed_ms = elapsed_ms.saturating_add(ms),
            _ => {}
        }

        let now = start + Duration::from_millis(elapsed_ms);
        let mut flips = viewer.poll_timers(now);
        flips.extend(apply_command(&mut viewer, line.command, now));

        let step = ReplayStep {
            line: line.number,
            command: &line.text,
            at_ms: elapsed_ms,
            flips,
            snapshot: viewer.snapshot(),
        };

        serde_json::to_writer(&mut out, &step)?;
        writeln!(out)?;
    }

    viewer.unmount()?;

    Ok(())
}

fn apply_command(
    viewer: &mut FlipbookViewer<LopdfEngine>,
    command: ScriptCommand,
    now: Instant,
) -> Option<FlipCommand> {
    match command {
        ScriptCommand::Wheel { delta_y, .. } => {
            viewer.handle_wheel(delta_y, now);
            None
        }
        ScriptCommand::Key(key) => viewer.handle_key(key, now),
        ScriptCommand::Thumb(index) => viewer.handle_thumbnail_click(index),
        ScriptCommand::Slider(index) => viewer.handle_slider(index),
        ScriptCommand::Zoom(step) => {
            match step {
                ZoomStep::In => viewer.zoom_in(),
                ZoomStep::Out => viewer.zoom_out(),
                ZoomStep::Reset => viewer.reset_zoom(),
            }
            None
        }
        ScriptCommand::Resize { width, height } => {
            viewer.size_observer().observe(ContainerSize::new(width, height));
            None
        }
        ScriptCommand::Flip(index) => {
            viewer.on_flip(index);
            None
        }
        ScriptCommand::Wait(_) => None,
    }
}

fn run_render_page(
    file: &Path,
    config_path: Option<&Path>,
    page: u32,
    height: f32,
    dpr: f32,
    output: Option<&Path>,
) -> Result<()> {
    let page_index = page_index(page)?;
    if !(height.is_finite() && height > 0.0) {
        anyhow::bail!("--height must be a positive number");
    }
    if !(dpr.is_finite() && dpr > 0.0) {
        anyhow::bail!("--dpr must be a positive number");
    }

    let mut viewer = open_viewer(file, config_path, dpr)?;
    let request =
        PageRenderRequest { page_index, height_px: height, device_pixel_ratio: dpr, in_view: true };

    let image = viewer.render_page(&request).context("failed to render page")?;

    let output = output.map(ToOwned::to_owned).unwrap_or_else(|| default_page_output(file, page));

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    image
        .save(&output)
        .with_context(|| format!("failed to write image to {}", output.display()))?;

    println!("{}", output.display());

    viewer.unmount()?;

    Ok(())
}

fn run_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    let json = serde_json::to_string_pretty(&config)?;
    println!("{json}");

    Ok(())
}

fn run_config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Storage::from_default_project()?.config_path(),
    };

    if path.exists() && !force {
        anyhow::bail!("config already exists: {} (use --force to overwrite)", path.display());
    }

    storage::save_config_file(&path, &ViewerConfig::default())
        .with_context(|| format!("failed to write config {}", path.display()))?;

    println!("{}", path.display());

    Ok(())
}

fn page_index(page: u32) -> Result<u32> {
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    Ok(page - 1)
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_page_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("page");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}
