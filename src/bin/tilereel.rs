use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tilereel::source::codec::write_png;
use tilereel::{
    Controller, DisplayBuilder, Effect, FrameIndex, FrameSource, Level, ReelConfig, TileDirViewer,
    TileReelResult, VideoLibrary, Viewer,
};

#[derive(Parser, Debug)]
#[command(name = "tilereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the operator console: read commands from stdin, one per line.
    Serve(ServeArgs),
    /// Render one frame of a built-in effect as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Config JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Effect name (see `list` output of the console for the catalog).
    #[arg(long)]
    effect: String,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    index: u64,

    /// Display size in tiles, as `WxH`.
    #[arg(long, value_parser = parse_tiles, default_value = "2x2")]
    tiles: (u32, u32),

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn parse_tiles(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let cfg = match &args.config {
        Some(path) => ReelConfig::load(path)?,
        None => ReelConfig::default(),
    };

    let registry = Arc::new(cfg.build_registry().context("build display registry")?);
    let library = VideoLibrary::new(&cfg.videos_dir);
    library.ensure_root()?;

    let output_dir = cfg.output_dir.clone();
    let controller = Controller::new(
        registry.clone(),
        library,
        Box::new(move |name: &str| -> TileReelResult<Arc<dyn Viewer>> {
            let viewer = TileDirViewer::under(&output_dir, name)?;
            Ok(Arc::new(viewer))
        }),
    )
    .with_rates(cfg.effect_fps, cfg.sequence_fps);

    tracing::info!(
        displays = registry.count(),
        workers = cfg.tick_workers,
        effects = %Effect::catalog(),
        "console ready"
    );

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("read command line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        let reply = controller.handle_line(line);
        for (level, text) in &reply.lines {
            let prefix = match level {
                Level::Success => "ok",
                Level::Info => "--",
                Level::Muted => "  ",
                Level::Warning => "!!",
                Level::Error => "xx",
            };
            writeln!(stdout, "{prefix} {text}").context("write reply")?;
        }
        stdout.flush().context("flush reply")?;
    }

    registry.remove_all();
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let effect: Effect = args.effect.parse()?;
    let (tiles_wide, tiles_high) = args.tiles;
    let display = DisplayBuilder::default()
        .id("frame")
        .size(tiles_wide, tiles_high)
        .build()?;
    let (w, h) = (display.pixel_width(), display.pixel_height());

    let source = effect.build();
    // Stateful effects advance once per call; step them up to the requested index.
    if effect == Effect::Ball {
        for i in 0..args.index {
            source.get_frame(FrameIndex(i), w, h)?;
        }
    }
    let pixels = source
        .get_frame(FrameIndex(args.index), w, h)?
        .with_context(|| format!("effect '{effect}' produced no frame {}", args.index))?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    write_png(&args.out, &pixels, w, h)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
