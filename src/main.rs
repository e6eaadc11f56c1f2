use clap::{Parser, Subcommand};
use gallery_pick::config::{self, GalleryConfig};
use gallery_pick::export::{DirectorySink, ExportEvent};
use gallery_pick::gallery::Gallery;
use gallery_pick::notify::Notice;
use gallery_pick::scan::{ScanEvent, SortKey, SortOrder, TypeFilter};
use gallery_pick::{output, picker};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gallery-pick")]
#[command(about = "Browse a folder of images, pick some, export them as a zip")]
#[command(long_about = "\
Browse a folder of images, pick some, export them as a zip

The folder is scanned recursively. JPEG, PNG, GIF and WebP files become
records with a thumbnail and pixel dimensions; everything else is counted
and skipped. Hidden files and directories are ignored.

Exported archives name each entry NNN_<original name>, numbered in scan
order, so two files with the same name never collide.

Settings are read from gallery.toml in the scanned folder (or --config).
Run 'gallery-pick gen-config' to generate a documented gallery.toml.

Set RUST_LOG (e.g. RUST_LOG=gallery_pick=debug) for diagnostics.")]
#[command(version)]
struct Cli {
    /// Config file (default: <FOLDER>/gallery.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a folder and list its images
    Scan {
        folder: PathBuf,
        /// Print records as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scan a folder, select images and write them to a zip archive
    Export {
        folder: PathBuf,
        /// Only images whose name contains this text (case-insensitive)
        #[arg(long, default_value = "")]
        search: String,
        /// Only images whose type contains this text, e.g. png or jpeg
        #[arg(long = "type", default_value = "all")]
        type_filter: String,
        /// Sort key: name, size, date or type
        #[arg(long, default_value = "name")]
        sort: SortKey,
        /// Sort order: asc or desc
        #[arg(long, default_value = "asc")]
        order: SortOrder,
        /// Export only these file names (default: every visible image)
        #[arg(long, num_args = 1..)]
        pick: Vec<String>,
        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan { folder, json } => {
            let config = resolve_config(cli.config.as_deref(), &folder)?;
            init_thread_pool(&config.processing);
            let files = picker::pick_folder(&folder)?;

            let mut gallery = Gallery::new(&config, Box::new(DirectorySink::new(".")));
            let (notice_tx, notice_rx) = mpsc::channel();
            gallery.subscribe_notices(notice_tx);

            if json {
                let report = gallery.load(&files);
                let doc = serde_json::json!({
                    "report": report,
                    "memory": gallery.memory_usage(),
                    "records": gallery.records(),
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }

            let (tx, rx) = mpsc::channel();
            gallery.subscribe_scan(tx);
            let printer = spawn_printer(rx, output::format_scan_event, |e| {
                matches!(e, ScanEvent::Complete(_))
            });
            let report = gallery.load(&files);
            join_printer(printer);

            for line in output::format_scan_summary(&report, &gallery.memory_usage()) {
                println!("{}", line);
            }
            print_notices(&notice_rx);
        }
        Command::Export {
            folder,
            search,
            type_filter,
            sort,
            order,
            pick,
            out,
        } => {
            let config = resolve_config(cli.config.as_deref(), &folder)?;
            init_thread_pool(&config.processing);
            let files = picker::pick_folder(&folder)?;

            let mut gallery = Gallery::new(&config, Box::new(DirectorySink::new(out)));
            let (notice_tx, notice_rx) = mpsc::channel();
            gallery.subscribe_notices(notice_tx);

            println!("==> Scanning {}", folder.display());
            let report = gallery.load(&files);
            for line in output::format_scan_summary(&report, &gallery.memory_usage()) {
                println!("{}", line);
            }

            gallery.filter(&search, TypeFilter::parse(&type_filter));
            gallery.sort(sort, order);
            let (selection_tx, selection_rx) = mpsc::channel();
            gallery.subscribe_selection(selection_tx);
            if pick.is_empty() {
                gallery.select_all();
            } else {
                let ids: Vec<_> = gallery
                    .visible()
                    .iter()
                    .filter(|r| pick.iter().any(|p| p == &r.name))
                    .map(|r| r.id)
                    .collect();
                for id in ids {
                    gallery.toggle_selection(id);
                }
            }
            for event in selection_rx.try_iter() {
                for line in output::format_selection_event(&event) {
                    println!("{}", line);
                }
            }

            println!(
                "==> Selected {} of {} images",
                gallery.selected_count(),
                gallery.records().len()
            );
            for line in output::format_view(&gallery.visible()) {
                println!("{}", line);
            }

            // Progress events only flow once an export actually starts
            let printer = if gallery.selected_count() > 0 {
                let (tx, rx) = mpsc::channel();
                gallery.subscribe_export(tx);
                Some(spawn_printer(rx, output::format_export_event, |e| {
                    matches!(e, ExportEvent::Hidden)
                }))
            } else {
                None
            };
            let result = gallery.export_selected();
            if let Some(printer) = printer {
                join_printer(printer);
            }

            if let Some(report) = result {
                for line in output::format_export_report(&report) {
                    println!("{}", line);
                }
            }
            print_notices(&notice_rx);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config` wins; otherwise the folder's own gallery.toml, if any.
fn resolve_config(
    explicit: Option<&Path>,
    folder: &Path,
) -> Result<GalleryConfig, config::ConfigError> {
    match explicit {
        Some(file) => config::load_config_file(file),
        None => config::load_config(folder),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Print events from `rx` on a separate thread until `is_last` matches.
fn spawn_printer<T: Send + 'static>(
    rx: Receiver<T>,
    format: fn(&T) -> Vec<String>,
    is_last: fn(&T) -> bool,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for event in rx {
            for line in format(&event) {
                println!("{}", line);
            }
            if is_last(&event) {
                break;
            }
        }
    })
}

fn join_printer(printer: JoinHandle<()>) {
    if printer.join().is_err() {
        tracing::error!("output thread panicked");
    }
}

fn print_notices(rx: &Receiver<Notice>) {
    for notice in rx.try_iter() {
        println!("{}", output::format_notice(&notice));
    }
}
