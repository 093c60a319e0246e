//! HTTP server for address scanning.
//!
//! Accepts image uploads, reads the address on them and keeps a running
//! record sheet that can be downloaded.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use addrscan::api::{self, AppState};
use addrscan::config::Config;
use addrscan::correction::{Dictionary, SpellCorrector};
use addrscan::geocoder::NominatimGeocoder;
use addrscan::ocr::TesseractEngine;
use addrscan::spreadsheet::RecordSheet;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Address scanning server")]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "ADDRSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overrides --port
    #[arg(short, long)]
    listen: Option<String>,

    /// Port to listen on (all interfaces)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Frequency dictionary used for spelling correction
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Record sheet path
    #[arg(long)]
    sheet: Option<PathBuf>,

    /// Directory uploaded images are kept in
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Nominatim base URL
    #[arg(long)]
    geocoder_url: Option<String>,
}

impl Args {
    /// Apply command line overrides on top of the loaded config.
    fn apply(self, mut config: Config) -> Config {
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        } else if let Some(port) = self.port {
            config.server.listen = format!("0.0.0.0:{}", port);
        }
        if let Some(dictionary) = self.dictionary {
            config.correction.dictionary = dictionary;
        }
        if let Some(sheet) = self.sheet {
            config.storage.sheet_path = sheet;
        }
        if let Some(upload_dir) = self.upload_dir {
            config.storage.upload_dir = upload_dir;
        }
        if let Some(url) = self.geocoder_url {
            config.geocoder.url = url;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            Config::load_from_file(path)?
        }
        None => Config::default(),
    };
    let config = args.apply(config);

    info!("Addrscan Server");

    let dictionary = Dictionary::load(
        &config.correction.dictionary,
        config.correction.term_index,
        config.correction.count_index,
        config.correction.delimiter_byte()?,
    )?;
    let corrector = SpellCorrector::new(
        dictionary,
        config.correction.max_edit_distance,
        config.correction.prefix_length,
    );

    let geocoder = NominatimGeocoder::new(
        &config.geocoder.url,
        &config.geocoder.user_agent,
        config.geocoder.timeout(),
        config.geocoder.min_interval(),
    )
    .context("Failed to create geocoder client")?;
    info!("Geocoding with {}", config.geocoder.url);

    std::fs::create_dir_all(&config.storage.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.storage.upload_dir.display()
        )
    })?;

    let state = Arc::new(AppState {
        ocr: Arc::new(TesseractEngine::new(
            config.ocr.binary.clone(),
            config.ocr.language.clone(),
        )),
        corrector: Arc::new(corrector),
        geocoder: Arc::new(geocoder),
        sheet: RecordSheet::new(config.storage.sheet_path.clone()),
        upload_dir: config.storage.upload_dir.clone(),
    });

    let app = api::router(state, config.server.body_limit_mb * 1024 * 1024);

    info!("Starting server on {}", config.server.listen);
    info!("Recording to {}", config.storage.sheet_path.display());

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_sets_listen_address() {
        let args = Args::parse_from(["serve", "--port", "8081"]);
        let config = args.apply(Config::default());
        assert_eq!(config.server.listen, "0.0.0.0:8081");
    }

    #[test]
    fn test_listen_wins_over_port() {
        let args = Args::parse_from(["serve", "--port", "8081", "--listen", "127.0.0.1:9000"]);
        let config = args.apply(Config::default());
        assert_eq!(config.server.listen, "127.0.0.1:9000");
    }

    #[test]
    fn test_path_overrides() {
        let args = Args::parse_from([
            "serve",
            "--dictionary",
            "/srv/words.txt",
            "--sheet",
            "/srv/records.csv",
            "--geocoder-url",
            "http://nominatim.local",
        ]);
        let config = args.apply(Config::default());
        assert_eq!(config.correction.dictionary, PathBuf::from("/srv/words.txt"));
        assert_eq!(config.storage.sheet_path, PathBuf::from("/srv/records.csv"));
        assert_eq!(config.geocoder.url, "http://nominatim.local");
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
    }
}
