use clap::{Parser, Subcommand};
use osdconv::pipeline::{inspect, ConversionRequest, ConvertOptions, TargetVariant};
use osdconv::{convert_batch, SourceVariant, TimestampMode};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "osdconv", about = "Convert OSD overlay recordings between firmware formats")]
struct Cli {
    /// Log pipeline stages (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one or more recordings
    Convert {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Target layout: canonical (MSPOSD v2, default) or goggle (Walksnail)
        #[arg(short, long)]
        target: Option<String>,
        /// Video frame rate used to derive frame indices
        #[arg(short, long)]
        fps: Option<f64>,
        /// Source layout; omit to auto-detect O3-style input, `v3` for V3Native
        #[arg(short, long)]
        source: Option<String>,
        /// Treat O3 per-frame times as absolute instead of deltas
        #[arg(long)]
        absolute_timestamps: bool,
        /// Let a DJO3 signature override V3Native geometry
        #[arg(long)]
        v3_signature_override: bool,
        /// JSON file with default options; flags override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for outputs named after their inputs
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Show what a recording contains
    Inspect {
        input: PathBuf,
        #[arg(short, long)]
        fps: Option<f64>,
        #[arg(short, long)]
        source: Option<String>,
        #[arg(long)]
        absolute_timestamps: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Convert ──────────────────────────────────────────────────────────
        Commands::Convert {
            inputs, target, fps, source, absolute_timestamps,
            v3_signature_override, config, output, out_dir,
        } => {
            if output.is_some() && inputs.len() > 1 {
                return Err("--output only works with a single input; use --out-dir".into());
            }

            let mut opts = match config {
                Some(path) => ConvertOptions::from_file(&path)?,
                None       => ConvertOptions::default(),
            };
            if let Some(t) = target { opts.target = parse_target(&t)?; }
            if let Some(s) = source { opts.source = Some(parse_source(&s)?); }
            if fps.is_some()           { opts.fps = fps; }
            if absolute_timestamps     { opts.timestamps = TimestampMode::Absolute; }
            if v3_signature_override   { opts.v3_signature_override = true; }

            let files: Vec<(String, Vec<u8>)> = inputs.iter()
                .map(|p| std::fs::read(p).map(|data| (file_name(p), data)))
                .collect::<std::io::Result<_>>()?;
            let requests: Vec<ConversionRequest<'_>> = files.iter()
                .map(|(name, data)| ConversionRequest::new(data, name, opts.clone()))
                .collect();

            let mut failed = 0usize;
            for (path, result) in inputs.iter().zip(convert_batch(&requests)) {
                match result {
                    Ok(res) => {
                        let dest = match (&output, &out_dir) {
                            (Some(o), _)    => o.clone(),
                            (None, Some(d)) => d.join(&res.suggested_file_name),
                            (None, None)    => parent_dir(path).join(&res.suggested_file_name),
                        };
                        std::fs::write(&dest, &res.output_bytes)?;
                        println!("  {:<10} {} frame(s)  {} → {}",
                            res.source_variant.name(), res.frame_count,
                            path.display(), dest.display());
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("  failed     {}: {}", path.display(), e);
                    }
                }
            }
            if failed > 0 {
                return Err(format!("{failed} of {} conversion(s) failed", inputs.len()).into());
            }
        }

        // ── Inspect ──────────────────────────────────────────────────────────
        Commands::Inspect { input, fps, source, absolute_timestamps, json } => {
            let data = std::fs::read(&input)?;
            let opts = ConvertOptions {
                fps,
                source: source.as_deref().map(parse_source).transpose()?,
                timestamps: if absolute_timestamps { TimestampMode::Absolute } else { TimestampMode::Cumulative },
                ..ConvertOptions::default()
            };
            let report = inspect(&data, &opts)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let tag_hex = hex::encode(&data[..data.len().min(7)]);
            println!("── OSD recording ────────────────────────────────────────");
            println!("  Path           {}", input.display());
            println!("  Variant        {}", report.variant.name());
            println!("  Tag            {:?} ({})", report.tag, tag_hex);
            if let Some(v) = report.version {
                println!("  Version        {}", v);
            }
            println!("  Grid           {}x{}", report.geometry.width, report.geometry.height);
            println!("  Font           {}x{}", report.font.width, report.font.height);
            println!("  Data offset    {} B", report.data_offset);
            println!("  Frames         {}", report.frame_count);
            if let (Some(first), Some(last)) = (report.first_timestamp_ms, report.last_timestamp_ms) {
                println!("  Time span      {} ms → {} ms", first, last);
            }
            println!("  Trailing bytes {}", report.trailing_bytes);
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_target(s: &str) -> Result<TargetVariant, String> {
    TargetVariant::from_name(s).ok_or_else(|| format!("Unknown target '{}': use canonical or goggle", s))
}

fn parse_source(s: &str) -> Result<SourceVariant, String> {
    SourceVariant::from_name(s).ok_or_else(|| format!("Unknown source '{}': use v2, v2-dji or v3", s))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}
