use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use exposure_equiv::convert::{ExposureTriple, ExposureValue};
use exposure_equiv::session::ExposureSession;
use exposure_equiv::{config, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "exposure-equiv",
    version,
    about = "Exposure-equivalence calculator — compare a photo's EXIF exposure against a target aperture, shutter speed, and ISO"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Target f-number (e.g. 8 or f/8)
    #[arg(short = 'f', long, value_name = "F")]
    f_number: Option<ExposureValue>,

    /// Target exposure time in seconds (e.g. 1/125 or 0.5)
    #[arg(short = 't', long, value_name = "T")]
    exposure_time: Option<ExposureValue>,

    /// Target ISO
    #[arg(short, long, value_name = "N")]
    iso: Option<ExposureValue>,

    /// Camera preset index from the catalog
    #[arg(long, value_name = "IDX")]
    camera: Option<usize>,

    /// Lens preset index of the selected camera (supplies the target f-number)
    #[arg(long, value_name = "IDX")]
    lens: Option<usize>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// List the camera presets and exit
    #[arg(long = "list-cameras")]
    list_cameras: bool,

    /// Display the normalized metadata and exit
    #[arg(long = "show-metadata")]
    show_metadata: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.json {
        config.output.json = true;
    }

    let mut session = ExposureSession::new();
    if let Some(ref catalog_path) = config.catalog_path {
        match session.load_catalog(Path::new(catalog_path)) {
            Ok(cameras) => log::debug!("{} camera preset(s) available", cameras.len()),
            Err(e) => log::warn!("{e}"),
        }
    }

    // Handle --list-cameras
    if cli.list_cameras {
        print_cameras(&session);
        return Ok(());
    }

    if let Some(index) = cli.camera {
        match session.select_camera(index) {
            Some(camera) => log::info!("Camera: {}", camera.name),
            None => anyhow::bail!("No camera preset at index {index}. Use --list-cameras."),
        }
    }
    if let Some(index) = cli.lens {
        match session.select_lens(index) {
            Some(lens) => log::info!("Lens: {}", lens.name),
            None => anyhow::bail!("No lens preset at index {index} for the selected camera."),
        }
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let images = pipeline::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    // Handle --show-metadata
    if cli.show_metadata {
        for image_path in &images {
            let metadata = session
                .extract_from_path(image_path, config.fallback_dimensions)
                .await?;
            println!("{}", image_path.display());
            println!("{}", serde_json::to_string_pretty(metadata)?);
        }
        return Ok(());
    }

    let target = resolve_target(&cli, &config, &session);
    log::info!("Found {} image(s) to process", images.len());
    log::info!("Target: {target}");

    let mut results = Vec::new();
    let total = images.len();

    for (i, image_path) in images.iter().enumerate() {
        log::info!(
            "[{}/{}] Processing: {}",
            i + 1,
            total,
            image_path.display()
        );

        let result = pipeline::process_image(image_path, &mut session, &target, &config).await;

        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
            if let Some(ref hint) = result.hint {
                log::info!("  {hint}");
            }
        } else if let Some(ref conversion) = result.conversion {
            log::info!("  Original: {}", conversion.original);
            log::info!(
                "  Factor: {:.4} ({:+.2} stops)",
                conversion.factor,
                conversion.stops
            );
        }

        results.push(result);
    }

    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    // Summary
    let success = results.iter().filter(|r| r.error.is_none()).count();
    let failed = total - success;
    log::info!("Done: {success} succeeded, {failed} failed out of {total} images");

    Ok(())
}

/// Target triple: explicit flags, then the selected lens aperture, then config defaults.
fn resolve_target(cli: &Cli, config: &config::Config, session: &ExposureSession) -> ExposureTriple {
    let defaults = &config.default_target;
    let lens_f_number = session.selected_lens().and_then(|lens| lens.f_number.clone());

    ExposureTriple {
        f_number: cli
            .f_number
            .clone()
            .or(lens_f_number)
            .unwrap_or_else(|| defaults.f_number.clone()),
        exposure_time: cli
            .exposure_time
            .clone()
            .unwrap_or_else(|| defaults.exposure_time.clone()),
        iso: cli.iso.clone().unwrap_or_else(|| defaults.iso.clone()),
    }
}

fn print_cameras(session: &ExposureSession) {
    if session.cameras().is_empty() {
        println!("No camera presets loaded. Set \"catalog_path\" in config.json.");
        return;
    }
    for (i, camera) in session.cameras().iter().enumerate() {
        println!("[{i}] {} ({})", camera.name, camera.id);
        for (j, lens) in camera.lenses.iter().enumerate() {
            match lens.f_number {
                Some(ref f) => println!(
                    "    [{j}] {} — f/{}",
                    lens.name,
                    f.to_string().trim_start_matches("f/")
                ),
                None => println!("    [{j}] {}", lens.name),
            }
        }
    }
}
