//! TikTok Downloader - CLI entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use tiktok_downloader::{
    api::{DeviceIdentityProvider, SignaturePipeline, TikTokApi},
    cli::Args,
    config::{validate_config, validate_username, Config, DownloadMode},
    download::{
        collect_user_feed, parse_queue_input, DownloadOrchestrator, DownloadStats, HttpFileSink,
        OrchestratorOptions, QueueSummary,
    },
    error::{exit_codes, Error, Result},
    fs::{get_user_folder, resolve_destination},
    output::{
        create_item_bar, create_spinner, print_banner, print_config_summary, print_error,
        print_info, print_run_stats, print_success, print_user_profile, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_)
                | Error::ConfigValidation { .. }
                | Error::MissingConfig(_)
                | Error::TomlParse(_) => ExitCode::from(exit_codes::CONFIG_ERROR as u8),
                Error::Signature { .. }
                | Error::Request(_)
                | Error::Parse(_)
                | Error::NotFound(_)
                | Error::Http(_) => ExitCode::from(exit_codes::API_ERROR as u8),
                Error::Download(_) | Error::InvalidFilename(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<i32> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    if !args.quiet {
        print_banner();
    }

    // Load configuration, persisting device identifiers on first use
    let config_path = args.config.clone();
    let mut config = Config::load_or_default(&config_path)?;
    if config_path.exists() && config.ensure_device(Some(&config_path))? {
        print_info(&format!(
            "Saved device identifiers to {}",
            config_path.display()
        ));
    }

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);
    let mode = config.options.download_mode;

    validate_config(&config, mode)?;

    let filename_format = config
        .options
        .filename_format
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    print_config_summary(
        &mode.to_string(),
        &resolve_destination(config.options.download_directory.as_deref())
            .display()
            .to_string(),
        &filename_format,
    );

    let signer = match &config.signer.command {
        Some(command) => SignaturePipeline::from_command(command, config.request_timeout()),
        None => SignaturePipeline::unconfigured(),
    };
    let api = TikTokApi::new(
        DeviceIdentityProvider::new(config.device_id(), config.install_id()),
        signer,
        config.endpoints(),
        Some(&config.account.user_agent),
        config.request_timeout(),
    )?;

    match mode {
        DownloadMode::Links => run_links(api, &config, &args).await,
        DownloadMode::User => run_user(api, &config, &args).await,
    }
}

/// Download the posts behind share links.
async fn run_links(api: TikTokApi, config: &Config, args: &Args) -> Result<i32> {
    let mut input = args.urls.join("\n");
    if let Some(path) = &args.input {
        let contents = tokio::fs::read_to_string(path).await?;
        input.push('\n');
        input.push_str(&contents);
    }

    let urls: Vec<String> = parse_queue_input(&input)
        .into_iter()
        .map(|entry| entry.original_url)
        .collect();
    if urls.is_empty() {
        return Err(Error::MissingConfig(
            "at least one share URL (--url or --input)".to_string(),
        ));
    }

    let orchestrator = build_orchestrator(
        Arc::new(api),
        config,
        config.options.download_directory.clone(),
    )?;
    watch_ctrl_c(&orchestrator);

    print_info(&format!("Queued {} item(s)", urls.len()));
    let summary = orchestrator.run(&urls).await?;
    finish(&orchestrator, summary)
}

/// Download every post of a user.
async fn run_user(api: TikTokApi, config: &Config, args: &Args) -> Result<i32> {
    let username = validate_username(
        args.user
            .as_deref()
            .ok_or_else(|| Error::MissingConfig("user (--user <name>)".to_string()))?,
    )?;

    let spinner = create_spinner(&format!("Collecting posts of @{}...", username));
    let feed = collect_user_feed(
        &api,
        &username,
        config.cookie(),
        config.feed_limit(),
        config.request_delay(),
    )
    .await;
    spinner.finish_and_clear();
    let feed = feed?;

    print_user_profile(&feed.user);
    print_info(&format!("Found {} post(s)", feed.items.len()));

    if let Some(path) = &args.list_json {
        write_item_list(path, &feed.items).await?;
        print_success(&format!("Wrote item list to {}", path.display()));
    }

    if args.list_only {
        for item in &feed.items {
            let created = item
                .created_at_utc()
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} {} {} {}",
                item.id,
                created,
                item.item_type().extension(),
                item.url
            );
        }
        return Ok(exit_codes::SUCCESS);
    }

    let base = resolve_destination(config.options.download_directory.as_deref());
    let destination = get_user_folder(&base, &feed.user.unique_id)?;

    let orchestrator = build_orchestrator(Arc::new(api), config, Some(destination))?;
    watch_ctrl_c(&orchestrator);

    let summary = orchestrator.run_items(feed.items).await?;
    finish(&orchestrator, summary)
}

fn build_orchestrator(
    api: Arc<TikTokApi>,
    config: &Config,
    destination: Option<PathBuf>,
) -> Result<DownloadOrchestrator> {
    let sink = HttpFileSink::new(config.request_timeout(), config.options.show_downloads)?;
    let options = OrchestratorOptions {
        destination,
        filename_format: config.options.filename_format.clone(),
        min_delay: config.request_delay(),
    };

    let orchestrator = DownloadOrchestrator::new(api, Arc::new(sink), options);
    Ok(if config.options.show_downloads {
        orchestrator.with_progress(create_item_bar("Downloading"))
    } else {
        orchestrator
    })
}

/// Cancel the run on Ctrl-C. Started downloads still finish.
fn watch_ctrl_c(orchestrator: &DownloadOrchestrator) {
    let token = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            print_warning("Cancelling, waiting for started downloads to finish...");
            token.cancel();
        }
    });
}

fn finish(orchestrator: &DownloadOrchestrator, summary: QueueSummary) -> Result<i32> {
    print_run_stats(&DownloadStats::from_queue(&orchestrator.queue().snapshot()));

    if orchestrator.cancel_token().is_cancelled() {
        return Ok(exit_codes::ABORT);
    }
    if summary.error > 0 {
        print_warning(&format!("{} item(s) failed", summary.error));
        return Ok(exit_codes::SOME_ITEMS_FAILED);
    }
    Ok(exit_codes::SUCCESS)
}

async fn write_item_list(path: &Path, items: &[tiktok_downloader::CanonicalItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
