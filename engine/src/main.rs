// Engine main entry point: loads daily bars and logs the default indicator set
use engine::config::settings::EngineSettings;
use engine::data::market_data::MarketDataStore;
use engine::services::{IndicatorRequest, IndicatorService, LoadCsvRequest};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_INDICATORS: [&str; 7] = ["ma", "macd", "rsi", "kdj", "mtm", "cci", "dmi"];

fn csv_files(data_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    files.sort();
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    info!("Starting indicator engine...");

    // Usage: engine [settings.json] [query-date]
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => EngineSettings::from_json_file(&path)?,
        None => EngineSettings::default(),
    };
    let query_date = args.next();

    let store = match &settings.snapshot_path {
        Some(path) if path.exists() => MarketDataStore::load_snapshot(path)?,
        _ => MarketDataStore::new(),
    };
    let service = IndicatorService::with_store(store, settings.clone());

    match csv_files(&settings.data_dir) {
        Ok(files) => {
            for path in files {
                let Some(symbol) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                    continue;
                };
                let request = LoadCsvRequest {
                    file_path: path.to_string_lossy().into_owned(),
                    symbol,
                };
                match service.load_csv_data(request).await {
                    Ok(response) => info!("{}", response.message),
                    Err(e) => warn!(path = %path.display(), error = %e, "Skipping CSV file"),
                }
            }
        }
        Err(e) => warn!(dir = %settings.data_dir.display(), error = %e, "Cannot read data directory"),
    }

    for symbol in service.symbols().await {
        let date = match (&query_date, service.latest_date(&symbol).await) {
            (Some(date), _) => date.clone(),
            (None, Some(latest)) => latest,
            (None, None) => continue,
        };
        for indicator_type in DEFAULT_INDICATORS {
            let request = IndicatorRequest {
                symbol: symbol.clone(),
                indicator_type: indicator_type.to_string(),
                date: date.clone(),
                parameters: String::new(),
            };
            match service.calculate_indicator(request).await {
                Ok(response) => {
                    let values: Vec<String> = response
                        .reading
                        .values
                        .iter()
                        .map(|v| match v.value {
                            Some(value) => format!("{}={:.4}", v.name, value),
                            None => format!("{}=n/a", v.name),
                        })
                        .collect();
                    info!(
                        symbol = %symbol,
                        date = %date,
                        resolved_date = response.reading.resolved_date.as_deref().unwrap_or("-"),
                        "{} {}",
                        response.indicator_name,
                        values.join(" ")
                    );
                }
                Err(e) => warn!(symbol = %symbol, indicator = indicator_type, error = %e, "Indicator query failed"),
            }
        }
    }

    if let Some(path) = &settings.snapshot_path {
        service.save_snapshot(path).await?;
    }

    Ok(())
}
