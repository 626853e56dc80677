//! ShieldSight CLI - classify URLs from the command line
//!
//! Usage: shieldsight [--fast] [--json] [--batch] [--explain] <url>...

use std::sync::Arc;

use shieldsight_core::constants::{self, APP_NAME, APP_VERSION};
use shieldsight_core::{BatchController, PredictOptions, PredictionOutcome, Predictor, PredictorConfig};

#[derive(Debug, Default)]
struct Args {
    fast: bool,
    json: bool,
    batch: bool,
    explain: bool,
    urls: Vec<String>,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut args = Self::default();
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--fast" => args.fast = true,
                "--json" => args.json = true,
                "--batch" => args.batch = true,
                "--explain" => args.explain = true,
                "-h" | "--help" => return Err(usage()),
                flag if flag.starts_with("--") => return Err(format!("unknown flag: {}\n{}", flag, usage())),
                _ => args.urls.push(arg),
            }
        }
        if args.urls.is_empty() {
            return Err(usage());
        }
        Ok(args)
    }

    fn options(&self) -> PredictOptions {
        if self.batch {
            PredictOptions::batch()
        } else if self.fast {
            PredictOptions::fast()
        } else {
            PredictOptions::full()
        }
    }
}

fn usage() -> String {
    format!("{} {}\nusage: shieldsight [--fast] [--json] [--batch] [--explain] <url>...", APP_NAME, APP_VERSION)
}

fn print_outcome(outcome: &PredictionOutcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("serialize failed: {}", e),
        }
        return;
    }
    let r = &outcome.result;
    println!(
        "{:<10} {:>5.1}%  {:<9} threat={:<3} {}{}",
        r.prediction.as_str(),
        r.confidence * 100.0,
        r.risk_level.as_str(),
        r.threat.index,
        r.url,
        if outcome.from_cache { "  (cached)" } else { "" }
    );
    println!("           {}", r.summary);
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::parse() {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{}", msg);
            std::process::exit(2);
        }
    };

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let predictor = Arc::new(Predictor::new(PredictorConfig::from_env()));
    if let Err(e) = predictor.load() {
        log::warn!("Model load failed: {} - predictions unavailable", e);
    } else {
        let info = predictor.model_info();
        log::info!(
            "Classifier ready: {} (fallback: {})",
            info.model_name.as_deref().unwrap_or("rule engine"),
            info.using_fallback
        );
    }

    let mut failures = 0;
    let opts = args.options();

    if args.batch {
        let controller = BatchController::new(
            Arc::clone(&predictor),
            constants::DEFAULT_BATCH_CONCURRENCY,
            constants::DEFAULT_BATCH_MAX_SIZE,
        );
        match controller.run(args.urls.clone(), opts).await {
            Ok(report) => {
                if args.json {
                    match serde_json::to_string_pretty(&report) {
                        Ok(s) => println!("{}", s),
                        Err(e) => eprintln!("serialize failed: {}", e),
                    }
                } else {
                    report.results.iter().for_each(|o| print_outcome(o, false));
                    for e in &report.errors {
                        eprintln!("[{}] {}: {}", e.index, e.url, e.error);
                    }
                    println!("{}/{} successful in {:.0}ms", report.successful, report.total, report.processing_time_ms);
                }
                failures = report.failed;
            }
            Err(e) => {
                eprintln!("{}", e);
                failures = args.urls.len();
            }
        }
    } else {
        for url in &args.urls {
            if args.explain {
                match predictor.explain(url).await {
                    Ok(report) => match serde_json::to_string_pretty(report.as_ref()) {
                        Ok(s) => println!("{}", s),
                        Err(e) => eprintln!("serialize failed: {}", e),
                    },
                    Err(e) => {
                        eprintln!("{}: {}", url, e);
                        failures += 1;
                    }
                }
                continue;
            }
            match predictor.predict(url, &opts).await {
                Ok(outcome) => print_outcome(&outcome, args.json),
                Err(e) => {
                    eprintln!("{}: {}", url, e);
                    failures += 1;
                }
            }
        }
    }

    predictor.shutdown().await;

    if failures > 0 {
        std::process::exit(1);
    }
}
