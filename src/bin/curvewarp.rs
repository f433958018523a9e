use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "curvewarp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a procedural checkerboard through the warp as a PNG.
    Render(RenderArgs),
    /// Print where a single point maps to, as JSON.
    Map(MapArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Warp parameters JSON. Defaults are used when omitted.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 512)]
    width: u32,

    #[arg(long, default_value_t = 256)]
    height: u32,

    /// 0 is best, 10 is draft.
    #[arg(long, default_value_t = 3)]
    quality: u8,

    /// Visible world rectangle as `x0,y0,x1,y1` (top-left, bottom-right).
    #[arg(long, allow_hyphen_values = true, default_value = "-3,1.5,3,-1.5")]
    view: String,

    /// Checkerboard cell size in world units.
    #[arg(long, default_value_t = 0.25)]
    cell: f64,

    /// Resample scanline bands on a rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for `--parallel`.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct MapArgs {
    /// Warp parameters JSON. Defaults are used when omitted.
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(long, allow_hyphen_values = true)]
    x: f64,

    #[arg(long, allow_hyphen_values = true)]
    y: f64,

    #[arg(long, default_value_t = 0)]
    quality: u8,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Map(args) => cmd_map(args),
    }
}

fn read_params(path: Option<&Path>) -> anyhow::Result<curvewarp::CurveWarpParams> {
    let Some(path) = path else {
        return Ok(curvewarp::CurveWarpParams::default());
    };
    let f = File::open(path).with_context(|| format!("open params '{}'", path.display()))?;
    let params = curvewarp::CurveWarpParams::from_json_reader(BufReader::new(f))
        .with_context(|| format!("parse params JSON '{}'", path.display()))?;
    Ok(params)
}

fn parse_view(s: &str) -> anyhow::Result<(curvewarp::Point, curvewarp::Point)> {
    let v = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("parse view component '{part}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let &[x0, y0, x1, y1] = v.as_slice() else {
        anyhow::bail!("view expects 4 comma-separated numbers, got {}", v.len());
    };
    Ok((curvewarp::Point::new(x0, y0), curvewarp::Point::new(x1, y1)))
}

fn checkerboard(cell: f64) -> impl Fn(curvewarp::Point) -> curvewarp::Rgba8Premul + Sync {
    move |p| {
        let cx = (p.x / cell).floor() as i64;
        let cy = (p.y / cell).floor() as i64;
        if (cx + cy).rem_euclid(2) == 0 {
            curvewarp::Rgba8Premul::opaque(236, 236, 240)
        } else {
            curvewarp::Rgba8Premul::opaque(40, 44, 60)
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let params = read_params(args.params.as_deref())?;
    let warp = curvewarp::CurveWarp::from_params(params)?;

    if !(args.cell.is_finite() && args.cell > 0.0) {
        anyhow::bail!("cell must be a positive number");
    }
    let (tl, br) = parse_view(&args.view)?;
    let desc = curvewarp::RendDesc::new(tl, br, args.width, args.height)?;

    let mut settings = curvewarp::RenderSettings::new(curvewarp::Quality(args.quality));
    settings.threading.parallel = args.parallel;
    settings.threading.threads = args.threads;

    let ctx = curvewarp::ShaderContext::new(checkerboard(args.cell));
    let mut last_pct = 0;
    let mut progress = |done: u64, total: u64| {
        let pct = done * 100 / total.max(1);
        if pct >= last_pct + 10 {
            last_pct = pct;
            tracing::info!(pct, "rendering");
        }
        true
    };
    let frame = warp.render_with(&ctx, &desc, &settings, &mut progress)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_map(args: MapArgs) -> anyhow::Result<()> {
    let params = read_params(args.params.as_deref())?;
    let warp = curvewarp::CurveWarp::from_params(params)?;

    let s = warp.transform_sample(
        curvewarp::Point::new(args.x, args.y),
        curvewarp::Quality(args.quality),
    );
    let out = serde_json::json!({
        "x": s.point.x,
        "y": s.point.y,
        "distance": s.distance,
        "along": s.along,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
