use clap::{Parser, Subcommand};
use pose_manifest::compress::{self, CompressSettings};
use pose_manifest::{config, manifest, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pose-manifest")]
#[command(about = "Build and maintain the pose sample photo manifest")]
#[command(long_about = "\
Build and maintain the pose sample photo manifest

Sample photos are named <sequence>-<code>.jpg, where <code> is twelve letters,
one per attribute:

  0001-eaabbgcbbegd.jpg

Code positions, in order: shot_size, composition, angle, pose, action,
emotion, clothing, hair, color, season, scene, style.

Unknown letters decode to 未知. Names that don't fit the pattern are skipped
and listed.

Run 'pose-manifest gen-config' to generate a documented pose-manifest.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults apply when missing)
    #[arg(long, default_value = "pose-manifest.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the images directory and write asset_manifest.json
    Manifest {
        /// Directory of encoded sample photos
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// Manifest output path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Prefix joined with each filename to form asset_path
        #[arg(long)]
        asset_prefix: Option<String>,
    },
    /// Validate an existing manifest against its filenames and the code table
    Check {
        /// Manifest to check (defaults to the configured output path)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Downscale and re-encode every .jpg in place
    Compress {
        /// Directory of sample photos
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// JPEG quality (1-95)
        #[arg(long)]
        quality: Option<u32>,
        /// Longest edge in pixels (0 = never resize)
        #[arg(long)]
        max_size: Option<u32>,
        /// Parallel workers, capped at the CPU core count
        #[arg(long)]
        workers: Option<usize>,
        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Ignore the compression cache and re-encode every image
        #[arg(long)]
        no_cache: bool,
    },
    /// Print a stock pose-manifest.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Validation runs after CLI overrides, so flags can fix a bad file value.
    let load = || config::load_merged_config(&cli.config);

    match cli.command {
        Command::Manifest {
            images_dir,
            output: output_path,
            asset_prefix,
        } => {
            let mut cfg = load()?;
            if let Some(dir) = images_dir {
                cfg.images_dir = dir;
            }
            if let Some(path) = output_path {
                cfg.manifest.output = path;
            }
            if let Some(prefix) = asset_prefix {
                cfg.manifest.asset_prefix = prefix;
            }
            cfg.validate()?;

            let outcome = manifest::build_manifest(&cfg.images_dir, &cfg.manifest)?;
            manifest::write_manifest(&outcome.manifest, &cfg.manifest.output)?;
            output::print_manifest_output(&outcome, &cfg.manifest.output);
        }
        Command::Check {
            manifest: manifest_path,
        } => {
            let path = match manifest_path {
                Some(path) => path,
                None => config::load_config(&cli.config)?.manifest.output,
            };
            let loaded = manifest::load_manifest(&path)?;
            let issues = manifest::check_manifest(&loaded);
            output::print_check_output(&path, &loaded, &issues);
            if !issues.is_empty() {
                return Err(format!("{} failed the check", path.display()).into());
            }
        }
        Command::Compress {
            images_dir,
            quality,
            max_size,
            workers,
            dry_run,
            no_cache,
        } => {
            let mut cfg = load()?;
            if let Some(dir) = images_dir {
                cfg.images_dir = dir;
            }
            if let Some(q) = quality {
                cfg.compress.quality = q;
            }
            if let Some(m) = max_size {
                cfg.compress.max_size = m;
            }
            if let Some(w) = workers {
                cfg.compress.workers = w;
            }
            cfg.validate()?;

            let settings = CompressSettings::from_config(&cfg.compress, !no_cache);
            if dry_run {
                let planned = compress::plan(&cfg.images_dir, &settings)?;
                output::print_dry_run(&planned);
                return Ok(());
            }

            init_thread_pool(&cfg.compress);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_compress_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = compress::compress(&cfg.images_dir, &settings, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;
            output::print_compress_summary(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on compression config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(compress: &config::CompressionConfig) {
    let threads = config::effective_threads(compress);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
