use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use scan_app::config::{read_config, save_config, AppConfig, DEFAULT_CONFIG_FILE};
use scan_app::history::HistoryStore;
use scan_app::report::{content_type_for, render_history, render_result, render_summary};
use scan_core::{
    AcquisitionView, CaptureMode, CapturedImage, ControllerState, ManualProduct, Msg,
};
use scan_engine::{
    ensure_dir, AcquisitionController, NullDecoder, ReqwestBackend, ServiceSet, UnavailableCamera,
};
use scan_logging::{scan_info, scan_warn};

#[derive(Parser)]
#[command(version, about = "Look up packaged food and analyze its ingredients")]
struct Opts {
    /// Increase verbosity (-v, -vv). Default WARN.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (RON).
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Look up a product by its EAN-13 barcode
    Lookup {
        code: String,
        /// Also analyze the ingredients
        #[arg(long)]
        analyze: bool,
    },
    /// Extract ingredients from a label photo
    Ocr {
        image: PathBuf,
        /// Also analyze the ingredients
        #[arg(long)]
        analyze: bool,
    },
    /// Add a product the lookup did not find
    AddProduct {
        code: String,
        #[arg(long)]
        name: String,
        /// Ingredient list as printed on the label
        #[arg(long)]
        ingredients: String,
        #[arg(long, default_value = "")]
        brand: String,
        #[arg(long, default_value = "")]
        countries: String,
        /// Also analyze the ingredients
        #[arg(long)]
        analyze: bool,
    },
    /// Show or edit the scan history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Write the current settings to the config file
    InitConfig,
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Delete { id: u64 },
    Clear,
    /// Keep at most this many entries (0 keeps everything)
    Limit { entries: usize },
}

#[tokio::main]
async fn main() {
    let opts = Opts::parse();
    let loaded = read_config(&opts.config);
    let config = loaded.as_ref().map_or_else(|_| AppConfig::default(), Clone::clone);
    init_logging(&config, opts.verbose);
    match loaded {
        Ok(_) => scan_info!("Using config from {:?}", opts.config),
        Err(err) => scan_warn!("{}; using defaults", err),
    }

    if let Err(err) = run(opts, config).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging(config: &AppConfig, verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    scan_logging::initialize(config.log_destination.into(), level, &config.log_file);
}

async fn run(opts: Opts, config: AppConfig) -> anyhow::Result<()> {
    match opts.command {
        Command::Lookup { code, analyze } => {
            let mut controller = build_controller(&config)?;
            controller.dispatch(Msg::ManualCodeSubmitted(code)).await;
            finish(controller, &config, analyze).await
        }
        Command::Ocr { image, analyze } => {
            let upload = read_image(&image)?;
            let mut controller = build_controller(&config)?;
            controller
                .dispatch(Msg::ModeSelected(CaptureMode::FileUpload))
                .await;
            controller.dispatch(Msg::FileChosen(upload)).await;
            check_view(&controller.view())?;
            controller.dispatch(Msg::SubmitClicked).await;
            finish(controller, &config, analyze).await
        }
        Command::AddProduct {
            code,
            name,
            ingredients,
            brand,
            countries,
            analyze,
        } => {
            let entry = ManualProduct {
                barcode: code,
                name,
                brand,
                countries,
                ingredients_text: ingredients,
            };
            let mut controller = build_controller(&config)?;
            controller.dispatch(Msg::ManualProductSubmitted(entry)).await;
            check_view(&controller.view())?;
            finish(controller, &config, analyze).await
        }
        Command::History { action } => {
            let history = HistoryStore::new(config.data_dir.clone());
            match action {
                HistoryAction::List => print!("{}", render_history(&history.list()?)),
                HistoryAction::Delete { id } => {
                    if !history.delete(id)? {
                        bail!("no history entry with id {id}");
                    }
                    println!("Deleted entry {id}.");
                }
                HistoryAction::Clear => {
                    history.clear()?;
                    println!("History cleared.");
                }
                HistoryAction::Limit { entries } => {
                    let mut preferences = history.preferences()?;
                    preferences.history_limit = entries;
                    history.save_preferences(&preferences)?;
                    if entries == 0 {
                        println!("History limit removed.");
                    } else {
                        println!("History limit set to {entries}.");
                    }
                }
            }
            Ok(())
        }
        Command::InitConfig => {
            let path = save_config(&opts.config, &config)
                .with_context(|| format!("writing {:?}", opts.config))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn build_controller(config: &AppConfig) -> anyhow::Result<AcquisitionController> {
    ensure_dir(&config.data_dir)
        .with_context(|| format!("preparing data dir {:?}", config.data_dir))?;
    let backend = ReqwestBackend::new(config.service.settings()).context("building HTTP client")?;
    let history = Arc::new(HistoryStore::new(config.data_dir.clone()));

    Ok(AcquisitionController::new(
        Arc::new(UnavailableCamera),
        config.facing_mode.into(),
        Arc::new(NullDecoder),
        ServiceSet::from_backend(Arc::new(backend)),
        history,
    ))
}

fn read_image(path: &Path) -> anyhow::Result<CapturedImage> {
    let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(CapturedImage::new(file_name, content_type_for(path), bytes))
}

fn check_view(view: &AcquisitionView) -> anyhow::Result<()> {
    match (&view.phase, &view.error) {
        (ControllerState::Error, Some(err)) => bail!("{err}"),
        _ => Ok(()),
    }
}

/// Waits for the submission, optionally analyzes, prints, and tears down.
async fn finish(
    mut controller: AcquisitionController,
    config: &AppConfig,
    analyze: bool,
) -> anyhow::Result<()> {
    controller.settle().await;
    let view = controller.view();
    check_view(&view)?;
    let Some(result) = view.last_result.as_ref() else {
        bail!("no result");
    };
    print!("{}", render_result(result));

    let preferred = HistoryStore::new(config.data_dir.clone())
        .preferences()
        .ok()
        .and_then(|prefs| prefs.auto_analyze);
    let wants_analysis = analyze || preferred.unwrap_or(config.auto_analyze);
    if wants_analysis && !result.ingredients().is_empty() {
        scan_info!("analyzing {} ingredients", result.ingredients().len());
        controller.dispatch(Msg::AnalyzeClicked).await;
        controller.settle().await;
        let view = controller.view();
        check_view(&view)?;
        if let Some(summary) = &view.analysis {
            println!();
            print!("{}", render_summary(summary));
        }
    }

    controller.shutdown().await;
    Ok(())
}
