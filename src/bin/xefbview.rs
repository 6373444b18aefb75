use std::fs::File;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use xefbview::{FbDims, SourceBuffer, ViewerConfig, convert_frame, run_viewer, tile_align};

#[derive(Parser, Debug)]
#[command(name = "xefbview", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a window and present the framebuffer dump (the default).
    View(ViewArgs),
    /// De-swizzle on the CPU and write a linear RGBA PNG. Headless.
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct ViewArgs {
    /// Framebuffer dump to display.
    #[arg(long, default_value = "fbmem.bin")]
    input: PathBuf,

    /// Source width in pixels, before tile alignment.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Source height in pixels, before tile alignment.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Display width (defaults to the tile-aligned source width).
    #[arg(long)]
    display_width: Option<u32>,

    /// Display height (defaults to the tile-aligned source height).
    #[arg(long)]
    display_height: Option<u32>,

    /// Re-read the input every frame.
    #[arg(long)]
    watch: bool,

    /// Present as fast as possible instead of waiting for vblank.
    #[arg(long)]
    no_vsync: bool,
}

impl Default for ViewArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("fbmem.bin"),
            width: 1280,
            height: 720,
            display_width: None,
            display_height: None,
            watch: false,
            no_vsync: false,
        }
    }
}

#[derive(Parser, Debug)]
struct DumpArgs {
    /// Framebuffer dump to convert.
    #[arg(long, default_value = "fbmem.bin")]
    input: PathBuf,

    /// Source width in pixels, before tile alignment.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Source height in pixels, before tile alignment.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd.unwrap_or(Command::View(ViewArgs::default())) {
        Command::View(args) => cmd_view(args),
        Command::Dump(args) => cmd_dump(args),
    }
}

fn cmd_view(args: ViewArgs) -> anyhow::Result<()> {
    let dims = FbDims::new(
        args.width,
        args.height,
        args.display_width.unwrap_or(tile_align(args.width)),
        args.display_height.unwrap_or(tile_align(args.height)),
    )?;
    info!(
        source_w = dims.tiled_w,
        source_h = dims.tiled_h,
        display_w = dims.res_w,
        display_h = dims.res_h,
        "starting viewer"
    );

    run_viewer(ViewerConfig {
        input: args.input,
        dims,
        watch: args.watch,
        vsync: !args.no_vsync,
    })?;
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let dims = FbDims::native(args.width, args.height)?;
    let mut source = SourceBuffer::new(&dims);

    let mut file = File::open(&args.input)
        .with_context(|| format!("open framebuffer dump '{}'", args.input.display()))?;
    let read = source
        .load_from(&mut file)
        .with_context(|| format!("read framebuffer dump '{}'", args.input.display()))?;
    if read < source.len() {
        warn!(read, expected = source.len(), "short framebuffer read");
    }

    let mut rgba = convert_frame(source.bytes(), &dims)?;
    // Hardware dumps carry garbage alpha; force it opaque for the PNG.
    for px in rgba.chunks_exact_mut(4) {
        px[3] = 0xFF;
    }

    let image = image::RgbaImage::from_raw(dims.res_w, dims.res_h, rgba)
        .context("assemble output image")?;
    image
        .save(&args.out)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    info!(out = %args.out.display(), "wrote converted frame");
    Ok(())
}
