use anyhow::{Context, Result};
use clap::Parser;
use lanelines::capture::{frame_names, FrameSource, ImageFileSource};
use lanelines::output::{FrameSink, ImageFileSink};
use lanelines::{load_config, FramePipeline, FrameReport, OverlayMode, PipelineConfig};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input images (dashcam frames)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory the annotated frames are written to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Pipeline config (JSON); missing fields use built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the minimum absolute slope for lane segments
    #[arg(long)]
    min_abs_slope: Option<f64>,

    /// What to draw over each frame
    #[arg(long, value_enum)]
    overlay: Option<OverlayMode>,

    /// Worker threads; 1 processes frames sequentially
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("lanelines starting");

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            load_config(path).context("Failed to load pipeline config")?
        }
        None => PipelineConfig::default(),
    };
    if let Some(slope) = args.min_abs_slope {
        config.lanes.min_abs_slope = slope;
    }
    if let Some(overlay) = args.overlay {
        config.overlay = overlay;
    }
    tracing::info!("Min |slope|: {}", config.lanes.min_abs_slope);
    tracing::info!("Overlay: {:?}", config.overlay);

    let pipeline = FramePipeline::new(config).context("Invalid pipeline config")?;
    let sink = ImageFileSink::new(&args.output_dir)?;

    let summary = if args.jobs > 1 {
        run_parallel(&pipeline, &args.inputs, &sink, args.jobs)?
    } else {
        let mut source = ImageFileSource::new(&args.inputs)?;
        let mut sink = sink;
        run_pipeline(&pipeline, &mut source, &mut sink)?
    };

    tracing::info!(
        "Done: {} frames, left drawn {}, right drawn {}, passed through {}",
        summary.frames,
        summary.left_drawn,
        summary.right_drawn,
        summary.passthrough
    );
    Ok(())
}

#[derive(Debug, Default)]
struct Summary {
    frames: u64,
    left_drawn: u64,
    right_drawn: u64,
    passthrough: u64,
}

impl Summary {
    fn record(&mut self, name: &str, report: &FrameReport) {
        self.frames += 1;
        self.left_drawn += report.left.is_drawn() as u64;
        self.right_drawn += report.right.is_drawn() as u64;
        self.passthrough += (!report.blended) as u64;
        log_report(name, report);
    }

    fn merge(mut self, other: Summary) -> Summary {
        self.frames += other.frames;
        self.left_drawn += other.left_drawn;
        self.right_drawn += other.right_drawn;
        self.passthrough += other.passthrough;
        self
    }
}

fn log_report(name: &str, report: &FrameReport) {
    if report.blended {
        tracing::debug!(
            "{}: {} segments, {} discarded, left={}, right={}",
            name,
            report.segments,
            report.discarded,
            report.left.is_drawn(),
            report.right.is_drawn()
        );
    } else {
        tracing::warn!(
            "{}: no lane drawn ({} segments), frame passed through",
            name,
            report.segments
        );
    }
}

fn run_pipeline<S, O>(pipeline: &FramePipeline, source: &mut S, sink: &mut O) -> Result<Summary>
where
    S: FrameSource,
    O: FrameSink,
{
    let mut summary = Summary::default();
    let mut total_read_time = Duration::ZERO;
    let mut total_process_time = Duration::ZERO;
    let mut total_write_time = Duration::ZERO;

    tracing::info!("Starting sequential pipeline");

    loop {
        // Read frame
        let read_start = Instant::now();
        let Some(frame) = source.next_frame().context("Failed to read frame")? else {
            break;
        };
        total_read_time += read_start.elapsed();

        // Lane detection
        let process_start = Instant::now();
        let processed = pipeline.process(&frame.image);
        total_process_time += process_start.elapsed();

        // Output frame
        let write_start = Instant::now();
        sink.write_frame(&frame.name, &processed.frame)
            .context("Failed to write frame")?;
        total_write_time += write_start.elapsed();

        summary.record(&frame.name, &processed.report);

        // Log stats every 30 frames
        if summary.frames % 30 == 0 {
            let n = summary.frames as f64;
            let avg_read_ms = total_read_time.as_secs_f64() * 1000.0 / n;
            let avg_process_ms = total_process_time.as_secs_f64() * 1000.0 / n;
            let avg_write_ms = total_write_time.as_secs_f64() * 1000.0 / n;
            tracing::info!(
                "Frame {}: read={:.1}ms, process={:.1}ms, write={:.1}ms, remaining={:?}",
                summary.frames,
                avg_read_ms,
                avg_process_ms,
                avg_write_ms,
                source.remaining()
            );
        }
    }

    Ok(summary)
}

/// Frames are independent, so each worker reads, processes and writes its own.
fn run_parallel(
    pipeline: &FramePipeline,
    inputs: &[PathBuf],
    sink: &ImageFileSink,
    jobs: usize,
) -> Result<Summary> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build worker pool")?;
    tracing::info!("Starting parallel pipeline with {} workers", jobs);

    let names = frame_names(inputs)?;

    pool.install(|| {
        inputs
            .par_iter()
            .zip(names)
            .map(|(path, name)| -> Result<Summary> {
                let frame = ImageFileSource::load(path, name)?;
                let processed = pipeline.process(&frame.image);
                sink.write(&frame.name, &processed.frame)?;
                let mut summary = Summary::default();
                summary.record(&frame.name, &processed.report);
                Ok(summary)
            })
            .try_reduce(Summary::default, |a, b| Ok(a.merge(b)))
    })
}
