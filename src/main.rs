use clap::{Parser, Subcommand};
use cropkit::host::NullView;
use cropkit::imaging::codec;
use cropkit::session::EditorSession;
use cropkit::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (`tracing_subscriber` syntax).
const LOG_ENV: &str = "CROPKIT_LOG";

#[derive(Parser)]
#[command(name = "cropkit")]
#[command(about = "Crop and resize raster images")]
#[command(long_about = "\
Crop and resize raster images

Every resize samples from the loaded (or last cropped) image, never from a
previous resize. Shrinking uses Lanczos resampling unless --fast is given;
growing uses nearest-neighbor.

Examples:

  cropkit info photo.jpg
  cropkit scale photo.jpg small.png --width 400
  cropkit scale photo.jpg banner.png --width 1200 --height 300 --no-lock
  cropkit crop photo.jpg face.png --x 120 --y 40 --width 300 --height 300

Set CROPKIT_LOG=debug to see path selection and restore points on stderr.
Run 'cropkit gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Arguments for the `scale` command.
#[derive(clap::Args)]
struct ScaleArgs {
    input: PathBuf,
    output: PathBuf,
    /// Target width in pixels
    #[arg(long)]
    width: i64,
    /// Target height in pixels (requires --no-lock)
    #[arg(long, requires = "no_lock")]
    height: Option<i64>,
    /// Don't derive height from the aspect ratio
    #[arg(long)]
    no_lock: bool,
    /// Use nearest-neighbor when shrinking
    #[arg(long)]
    fast: bool,
}

/// Arguments for the `crop` command.
#[derive(clap::Args)]
struct CropArgs {
    input: PathBuf,
    output: PathBuf,
    #[arg(long, allow_hyphen_values = true)]
    x: i64,
    #[arg(long, allow_hyphen_values = true)]
    y: i64,
    #[arg(long)]
    width: i64,
    #[arg(long)]
    height: i64,
}

#[derive(Subcommand)]
enum Command {
    /// Show dimensions and restore points of an image
    Info {
        input: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resize an image
    Scale(ScaleArgs),
    /// Cut a rectangle out of an image
    Crop(CropArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { input, json } => {
            let editor_config = config::load_config(&cli.config)?;
            let session = EditorSession::new(codec::open(&input)?, &editor_config, NullView)?;
            let report = output::SessionReport::from_session(&session);
            if json {
                output::print_report_json(&report)?;
            } else {
                output::print_report(&report);
            }
        }
        Command::Scale(args) => {
            let editor_config = config::load_config(&cli.config)?;
            init_thread_pool(&editor_config.processing);
            let raster = codec::open(&args.input)?;
            let mut session = EditorSession::new(raster, &editor_config, NullView)?;
            session.set_aspect_lock(!args.no_lock);
            if args.fast {
                session.set_high_quality(false);
            }
            match args.height {
                Some(height) => session.resize_to(args.width, height)?,
                None => session.edit_width(args.width)?,
            };
            session.commit_scale()?;
            write_output(&session, &args.output)?;
        }
        Command::Crop(args) => {
            let editor_config = config::load_config(&cli.config)?;
            let raster = codec::open(&args.input)?;
            let mut session = EditorSession::new(raster, &editor_config, NullView)?;
            session.begin_crop()?;
            session.place_crop(args.x, args.y, args.width, args.height)?;
            session.commit_crop()?;
            write_output(&session, &args.output)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Write the session's live raster. PNG targets get the session's encoded
/// bytes as-is; other extensions are re-encoded.
fn write_output(
    session: &EditorSession<NullView>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        std::fs::write(path, session.encoded_bytes()?)?;
    } else {
        codec::save(session.live(), path)?;
    }
    let (w, h) = session.raster_dimensions();
    println!("{}", output::format_saved(path, w, h));
    Ok(())
}

/// Install the stderr log subscriber, filtered by `CROPKIT_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
