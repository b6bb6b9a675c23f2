use clap::{Arg, Command};
use log::LevelFilter;
use std::process;

use botguard::client::AnalysisClient;
use botguard::config::Config;
use botguard::presentation::MetricPresenter;
use botguard::retry::RetryConfig;
use botguard::schema::AnalysisResult;
use botguard::scoring::local::LocalScorer;
use botguard::session::{Notification, SessionController};

#[tokio::main]
async fn main() {
    let matches = Command::new("botguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Social-post URL risk analyzer with remote ML classification")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("botguard.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("analyze")
                .short('a')
                .long("analyze")
                .value_name("URL")
                .help("Analyze a social-post URL")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("local")
                .long("local")
                .help("Use the deterministic offline scorer instead of the remote classifier")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("expanded")
                .long("expanded")
                .help("Show all metric rows instead of the truncated view")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("model-performance")
                .long("model-performance")
                .help("Show the remote model's performance metrics")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dataset")
                .long("dataset")
                .help("Show the remote model's training-dataset metrics")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("health")
                .long("health")
                .help("Check classifier service health")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        match Config::default().to_file(path) {
            Ok(()) => println!("Default configuration written to {path}"),
            Err(e) => {
                eprintln!("Error writing configuration: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let config_path = matches.get_one::<String>("config").unwrap();
    let config = if std::path::Path::new(config_path).exists() {
        match Config::from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration: {e}");
                process::exit(1);
            }
        }
    } else {
        log::debug!("no config file at {config_path}, using defaults");
        Config::default()
    };

    if let Some(url) = matches.get_one::<String>("analyze") {
        let expanded = matches.get_flag("expanded");
        let use_local = matches.get_flag("local");
        if run_analysis(&config, url, use_local, expanded).await.is_err() {
            process::exit(1);
        }
        return;
    }

    let client = match AnalysisClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error building API client: {e}");
            process::exit(1);
        }
    };
    let retry = RetryConfig {
        max_retries: config.read_retries,
        ..RetryConfig::default()
    };

    if matches.get_flag("model-performance") {
        match botguard::retry::retry_read(&retry, "model performance", || {
            client.model_performance()
        })
        .await
        {
            Ok(perf) => {
                println!("Model performance ({})", client.base_url());
                println!("  accuracy:  {:.2}", perf.accuracy);
                println!("  precision: {:.2}", perf.precision);
                println!("  recall:    {:.2}", perf.recall);
                println!("  f1 score:  {:.2}", perf.f1_score);
                if let Some(framework) = &perf.framework {
                    println!("  framework: {framework}");
                }
                if !perf.base_models.is_empty() {
                    println!("  base models: {}", perf.base_models.join(", "));
                }
            }
            Err(e) => {
                eprintln!("Error fetching model performance: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("dataset") {
        match botguard::retry::retry_read(&retry, "dataset metrics", || client.dataset_metrics())
            .await
        {
            Ok(ds) => {
                println!("Training dataset");
                println!("  total samples:     {}", ds.total_samples);
                println!("  malicious samples: {}", ds.malicious_samples);
                println!("  safe samples:      {}", ds.safe_samples);
                if !ds.features.is_empty() {
                    println!("  features: {}", ds.features.join(", "));
                }
            }
            Err(e) => {
                eprintln!("Error fetching dataset metrics: {e}");
                process::exit(1);
            }
        }
        return;
    }

    if matches.get_flag("health") {
        match botguard::retry::retry_read(&retry, "health check", || client.health()).await {
            Ok(health) => {
                println!("Classifier health: {}", health.status);
                if let Some(message) = &health.message {
                    println!("  {message}");
                }
                if let Some(version) = &health.version {
                    println!("  version: {version}");
                }
            }
            Err(e) => {
                eprintln!("Classifier unreachable: {e}");
                process::exit(1);
            }
        }
        return;
    }

    eprintln!("Nothing to do. Try --analyze <URL>, --model-performance, --dataset or --health.");
    process::exit(2);
}

async fn run_analysis(
    config: &Config,
    url: &str,
    use_local: bool,
    expanded: bool,
) -> Result<(), ()> {
    // The controller is generic over the strategy, so each mode gets its own
    // concrete instantiation.
    if use_local {
        let (mut session, events) =
            SessionController::new(LocalScorer::new(), config.performance_ttl());
        let outcome = session.submit(url).await;
        report(outcome, events, config, expanded)
    } else {
        let client = match AnalysisClient::from_config(config) {
            Ok(client) => client,
            Err(e) => {
                eprintln!("Error building API client: {e}");
                return Err(());
            }
        };
        let (mut session, events) = SessionController::new(client, config.performance_ttl());
        let outcome = session.submit(url).await;
        report(outcome, events, config, expanded)
    }
}

fn report(
    outcome: Result<AnalysisResult, botguard::errors::SessionError>,
    mut events: tokio::sync::mpsc::UnboundedReceiver<Notification>,
    config: &Config,
    expanded: bool,
) -> Result<(), ()> {
    while let Ok(event) = events.try_recv() {
        match event {
            Notification::AnalysisComplete { message, .. } => log::info!("{message}"),
            Notification::AnalysisFailed { message } => log::warn!("{message}"),
            Notification::InvalidInput { message } => log::warn!("{message}"),
            Notification::PerformanceDegraded { message } => log::warn!("{message}"),
        }
    }

    match outcome {
        Ok(result) => {
            println!(
                "Verdict: {} (confidence {}%)",
                result.verdict().label(),
                result.confidence_percent()
            );
            println!("URL: {}", result.url());
            println!("Analyzed at: {}", result.timestamp().to_rfc3339());

            let presenter = MetricPresenter::new(config.visible_metrics);
            let rows = presenter.rows(&result, expanded);
            let total = presenter.rows(&result, true).len();
            for row in &rows {
                println!(
                    "  [{:>6}] {:<22} {}",
                    row.tier.label(),
                    row.label,
                    row.display_value
                );
            }
            if !expanded && total > rows.len() {
                println!("  ... {} more rows (--expanded to show)", total - rows.len());
            }

            if let AnalysisResult::Categorical(r) = &result {
                if let Some(details) = &r.details {
                    println!("\n{details}");
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Analysis failed: {e}");
            Err(())
        }
    }
}
