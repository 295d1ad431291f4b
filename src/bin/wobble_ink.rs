use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use wobble_ink::{
    BrushConfig, Canvas, EffectFlags, Exporter, FileDelivery, GifSink, LayerStore, Point, Rgba8,
    TonePattern, ToolKind,
};

#[derive(Parser, Debug)]
#[command(name = "wobble-ink", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the built-in demo drawing as a looping GIF.
    Demo(DemoArgs),
    /// Render one frame of the demo drawing as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Output GIF path.
    #[arg(long, default_value = "drawing.gif")]
    out: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Optional background image (any format the image crate can decode).
    #[arg(long)]
    background: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Animation time in seconds; snapped to the 1/8 s clock.
    #[arg(long, short = 't', default_value_t = 0.0)]
    time: f64,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Optional background image.
    #[arg(long)]
    background: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo(args) => cmd_demo(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_background(
    path: Option<&PathBuf>,
) -> anyhow::Result<Option<wobble_ink::BackgroundRaster>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let image = image::open(path)
        .with_context(|| format!("open background '{}'", path.display()))?;
    Ok(Some(wobble_ink::BackgroundRaster::from_image(&image)?))
}

/// A small three-layer drawing exercising every tool and effect.
fn demo_store(canvas: Canvas) -> anyhow::Result<LayerStore> {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let mut store = LayerStore::with_default_layers();

    // Bottom layer: dotted tone hill.
    let tone = BrushConfig {
        tool: ToolKind::ToneFill,
        color: Rgba8::opaque(120, 170, 255),
        width: 8.0,
        pattern: TonePattern::Dot,
        effects: EffectFlags {
            outlined: true,
            ..EffectFlags::default()
        },
        ..BrushConfig::default()
    };
    capture(
        &mut store,
        &tone,
        &[
            (0.1 * w, 0.9 * h),
            (0.35 * w, 0.55 * h),
            (0.6 * w, 0.75 * h),
            (0.9 * w, 0.9 * h),
        ],
    );

    // Middle layer: a wobbly neon squiggle.
    store.set_active(1)?;
    let neon = BrushConfig {
        color: Rgba8::opaque(255, 80, 160),
        width: 6.0,
        effects: EffectFlags {
            wobbly: true,
            neon: true,
            ..EffectFlags::default()
        },
        ..BrushConfig::default()
    };
    let squiggle: Vec<(f64, f64)> = (0..=24)
        .map(|i| {
            let s = f64::from(i) / 24.0;
            let x = (0.15 + 0.7 * s) * w;
            let y = (0.4 + 0.12 * (s * std::f64::consts::TAU * 2.0).sin()) * h;
            (x, y)
        })
        .collect();
    capture(&mut store, &neon, &squiggle);

    // Top layer: dashed outlined caption line with a shadow.
    store.set_active(2)?;
    let dashed = BrushConfig {
        tool: ToolKind::Dashed,
        color: Rgba8::opaque(60, 60, 60),
        width: 4.0,
        effects: EffectFlags {
            outlined: true,
            shadowed: true,
            ..EffectFlags::default()
        },
        ..BrushConfig::default()
    };
    capture(
        &mut store,
        &dashed,
        &[(0.2 * w, 0.2 * h), (0.8 * w, 0.18 * h)],
    );

    store.set_active(0)?;
    Ok(store)
}

fn capture(store: &mut LayerStore, config: &BrushConfig, points: &[(f64, f64)]) {
    let mut iter = points.iter();
    if let Some(&(x, y)) = iter.next() {
        store.begin_stroke(config, Point::new(x, y));
        for &(x, y) in iter {
            store.extend_stroke(Point::new(x, y));
        }
        store.end_stroke();
    }
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    let canvas = Canvas::new(args.width, args.height)?;
    let background = load_background(args.background.as_ref())?;
    let store = demo_store(canvas)?;

    let mut exporter = Exporter::new();
    let job = exporter.export(
        &store,
        background.as_ref(),
        canvas,
        Box::new(GifSink::new()),
        Box::new(FileDelivery::new(&args.out)),
    )?;
    job.wait()?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let canvas = Canvas::new(args.width, args.height)?;
    let background = load_background(args.background.as_ref())?;
    let store = demo_store(canvas)?;

    let t = wobble_ink::quantize_time(args.time);
    let mut compositor = wobble_ink::Compositor::new();
    let frame = compositor.render_frame(&store, background.as_ref(), canvas, t)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let pixels = frame.to_straight_rgba();
    image::save_buffer_with_format(
        &args.out,
        &pixels,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
