use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use iqwaterfall::processing::TestSignal;
use iqwaterfall::rendering::{ColorLUT, ColormapId};
use iqwaterfall::settings::DEFAULT_FILE_NAME;
use iqwaterfall::{
    ByteOrder, DragGesture, SampleFormat, SelectionEvent, Settings, SpectrogramEngine,
};

#[derive(Parser)]
#[command(name = "waterfall")]
#[command(about = "Spectrogram viewer for raw IQ sample captures", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open a capture, print its layout and optionally render lines to a PPM image
    View(ViewArgs),
    /// Write a synthetic capture (tone + chirp + noise)
    Generate(GenerateArgs),
}

#[derive(clap::Args)]
struct ViewArgs {
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Sample format: cf32, cf64, ci16, ci8, cu8
    #[arg(short, long)]
    format: Option<String>,

    /// Byte order of multi-byte samples: little or big
    #[arg(long)]
    byte_order: Option<String>,

    #[arg(short = 'r', long)]
    sample_rate: Option<i64>,

    #[arg(long)]
    fft_size: Option<usize>,

    #[arg(short, long, allow_hyphen_values = true)]
    zoom: Option<i32>,

    #[arg(long, allow_hyphen_values = true)]
    power_min: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    power_max: Option<f32>,

    /// First display line to render
    #[arg(long, default_value_t = 0)]
    start_line: u64,

    /// Number of lines to render
    #[arg(long, default_value_t = 512)]
    lines: u64,

    /// Write the rendered lines as a binary PPM
    #[arg(short, long, value_name = "IMAGE")]
    out: Option<PathBuf>,

    /// Drag rectangle in image pixels: x0,y0,x1,y1
    #[arg(long, allow_hyphen_values = true)]
    select: Option<String>,

    /// Settings file (defaults to ./waterfall.ini when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct GenerateArgs {
    #[arg(value_name = "FILE")]
    output: PathBuf,

    #[arg(short, long, default_value = "cf32")]
    format: String,

    #[arg(long, default_value = "little")]
    byte_order: String,

    #[arg(short = 'r', long, default_value_t = 1_000_000)]
    sample_rate: u64,

    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    samples: u64,

    #[arg(long, default_value_t = 125_000.0, allow_hyphen_values = true)]
    tone_hz: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::View(args) => run_view(args),
        Command::Generate(args) => run_generate(args),
    }
}

fn run_view(args: ViewArgs) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default(DEFAULT_FILE_NAME),
    };
    if let Some(name) = &args.format {
        settings.sample_format = parse_format(name)?;
    }
    if let Some(name) = &args.byte_order {
        settings.byte_order = parse_byte_order(name)?;
    }

    let mut engine = SpectrogramEngine::new(settings)?;
    engine
        .open_file(&args.input)
        .with_context(|| format!("Cannot open {}", args.input.display()))?;

    if let Some(rate) = args.sample_rate {
        engine.set_sample_rate(rate)?;
    }
    if let Some(size) = args.fft_size {
        engine.set_fft_size(size)?;
    }
    if let Some(level) = args.zoom {
        engine.set_zoom_level(level)?;
    }
    if let Some(db) = args.power_max {
        engine.set_power_max(db)?;
    }
    if let Some(db) = args.power_min {
        engine.set_power_min(db)?;
    }

    print_summary(&engine);

    let first = args.start_line.min(engine.line_count());
    let count = args.lines.min(engine.line_count() - first);

    if let Some(out) = &args.out {
        let colormap = ColormapId::from_name(&engine.settings().colormap).unwrap_or_else(|| {
            log::warn!("Unknown colormap {:?}, using Classic", engine.settings().colormap);
            ColormapId::Classic
        });
        render_ppm(&mut engine, first, count, ColorLUT::new(colormap), out)?;
    }

    if let Some(rect) = &args.select {
        let gesture = parse_rect(rect)?;
        let width = engine.view().fft_size() as u32;
        match engine.finish_drag(&gesture, (0, first), width)? {
            SelectionEvent::Changed(_) => {
                if let Some(summary) = engine.selection_summary() {
                    println!("{summary}");
                }
            }
            SelectionEvent::Cleared => println!("Selection cleared"),
        }
    }

    Ok(())
}

fn print_summary(engine: &SpectrogramEngine) {
    let view = engine.view();
    if let Some(capture) = engine.capture() {
        println!("File:        {}", capture.path().display());
        println!(
            "Format:      {} ({} endian)",
            capture.format().short_name(),
            capture.byte_order().name()
        );
    }
    let mapper = engine.mapper();
    println!(
        "Samples:     {} ({:.4}s at {} Hz)",
        engine.total_samples(),
        mapper.sample_to_seconds(engine.total_samples()),
        view.sample_rate()
    );
    println!(
        "FFT:         {} bins, {} window, {:.4}Hz per bin",
        view.fft_size(),
        view.window().name(),
        view.bin_width_hz()
    );
    println!(
        "Zoom:        {} (stride {} samples, {} lines)",
        view.zoom_level(),
        engine.stride(),
        engine.line_count()
    );
    let power = engine.power_range();
    println!("Power range: {} dB to {} dB", power.min_db(), power.max_db());
}

fn render_ppm(
    engine: &mut SpectrogramEngine,
    first: u64,
    count: u64,
    lut: ColorLUT,
    path: &Path,
) -> Result<()> {
    if count == 0 {
        bail!("No lines to render starting at line {first}");
    }
    let width = engine.view().fft_size();
    engine.prefetch(first, count)?;

    let file =
        File::create(path).with_context(|| format!("Failed to create image: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    write!(writer, "P6\n{} {}\n255\n", width, count)?;

    let mut row = Vec::with_capacity(width * 3);
    for line in first..first + count {
        row.clear();
        lut.colorize_row(&engine.get_line(line)?, &mut row);
        writer.write_all(&row)?;
        engine.poll_completed();
    }
    writer.flush().context("Failed to flush image")?;

    info!(
        "Rendered lines {}..{} ({}x{}) to {}",
        first,
        first + count,
        width,
        count,
        path.display()
    );
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let format = parse_format(&args.format)?;
    let order = parse_byte_order(&args.byte_order)?;
    let signal = TestSignal {
        sample_rate: args.sample_rate,
        samples: args.samples,
        tone_hz: args.tone_hz,
        ..TestSignal::default()
    };
    signal.write_file(&args.output, format, order)?;
    println!(
        "Wrote {} {} samples to {}",
        args.samples,
        format.short_name(),
        args.output.display()
    );
    Ok(())
}

fn parse_format(name: &str) -> Result<SampleFormat> {
    SampleFormat::from_str(name).ok_or_else(|| anyhow!("Unknown sample format: {name:?}"))
}

fn parse_byte_order(name: &str) -> Result<ByteOrder> {
    ByteOrder::from_str(name).ok_or_else(|| anyhow!("Unknown byte order: {name:?}"))
}

fn parse_rect(text: &str) -> Result<DragGesture> {
    let values: Vec<i32> = text
        .split(',')
        .map(|v| v.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("Invalid selection rectangle: {text:?}"))?;
    match values[..] {
        [x0, y0, x1, y1] => Ok(DragGesture::new((x0, y0), (x1, y1))),
        _ => bail!("Selection rectangle needs four values, got {}", values.len()),
    }
}
