mod config;

use config::{Config, LogFormat};
use mediatree::TopLevelMount;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "vidserve=info,fileserver=info,mediatree=info,progress=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    let mounts = match config::load_mounts(&config.mounts_file) {
        Ok(mounts) => mounts,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::error!("Please list your video directories in {}", config.mounts_file.display());
            return ExitCode::FAILURE;
        }
    };

    report_mounts(&mounts);

    // Scanning blocks on disk I/O, keep it off the async workers
    let max_depth = config.max_depth;
    let scan_mounts = mounts.clone();
    let tree = match tokio::task::spawn_blocking(move || mediatree::build_tree(&scan_mounts, max_depth)).await {
        Ok(tree) => tree,
        Err(e) => {
            tracing::error!("Directory scan failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        "Indexed {} videos across {} of {} mounts",
        tree.video_count,
        tree.children.len(),
        mounts.len()
    );

    let progress = progress::ProgressStore::open(&config.progress_file);

    let server = fileserver::FileServerApi::new(tree, progress, mounts);
    if let Err(e) = server.serve(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Log whether each configured mount can be read
fn report_mounts(mounts: &[TopLevelMount]) {
    tracing::info!("Configured video directories:");

    for mount in mounts {
        let status = mediatree::check_mount_status(&mount.system_path);
        if status.is_accessible() {
            tracing::info!(
                "  ✅ {}: {} ({})",
                mount.display_name,
                mount.system_path.display(),
                mount.description
            );
        } else {
            tracing::warn!(
                "  ❌ {}: {} ({}) Error: {}",
                mount.display_name,
                mount.system_path.display(),
                mount.description,
                status
            );
        }
    }
}
