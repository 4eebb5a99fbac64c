use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webreply::http::envelope::ChatReply;
use webreply::{build_router, AppState};
use webreply_core::{Answerer, Clock, SystemClock};
use webreply_local::gather::GatherConfig;
use webreply_local::respond::ResponderConfig;
use webreply_local::{gather, pacing, respond, WebAnswerer, DEFAULT_TIMEOUT_MS, DESKTOP_USER_AGENT};

#[derive(Parser, Debug)]
#[command(name = "webreply")]
#[command(about = "Scrape the web for a question and stitch together an answer", long_about = None)]
struct Cli {
    /// Log format: text|json
    #[arg(long, env = "WEBREPLY_LOG_FORMAT", default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP chat endpoint.
    Serve(ServeCmd),
    /// Answer one message and print the JSON reply.
    Ask(AskCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct ServeCmd {
    /// Listen address.
    #[arg(long, env = "WEBREPLY_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(clap::Args, Debug)]
struct AskCmd {
    /// The question.
    message: String,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug, Clone)]
struct PipelineArgs {
    /// Per-request upstream timeout (ms).
    #[arg(long, env = "WEBREPLY_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Pause after every scrape attempt (ms).
    #[arg(long, env = "WEBREPLY_POLITENESS_MS", default_value_t = pacing::DEFAULT_POLITENESS_MS)]
    politeness_ms: u64,
    /// Search results visited by the scrape loop.
    #[arg(long, env = "WEBREPLY_MAX_RESULTS", default_value_t = gather::DEFAULT_MAX_RESULTS)]
    max_results: usize,
    #[arg(long, env = "WEBREPLY_SEARCH_ENDPOINT", default_value = webreply_local::search::DEFAULT_SEARCH_ENDPOINT)]
    search_endpoint: String,
    #[arg(long, env = "WEBREPLY_ENCYCLOPEDIA_ENDPOINT", default_value = webreply_local::encyclopedia::DEFAULT_ENCYCLOPEDIA_ENDPOINT)]
    encyclopedia_endpoint: String,
    #[arg(long, env = "WEBREPLY_NEWS_ENDPOINT", default_value = webreply_local::news::DEFAULT_NEWS_ENDPOINT)]
    news_endpoint: String,
    #[arg(long, env = "WEBREPLY_USER_AGENT", default_value = DESKTOP_USER_AGENT)]
    user_agent: String,
    /// Seed for connective-phrase selection.
    #[arg(long, env = "WEBREPLY_PHRASE_SEED", default_value_t = respond::DEFAULT_PHRASE_SEED)]
    phrase_seed: u64,
}

impl PipelineArgs {
    fn gather_config(&self) -> GatherConfig {
        GatherConfig {
            search_endpoint: self.search_endpoint.clone(),
            encyclopedia_endpoint: self.encyclopedia_endpoint.clone(),
            news_endpoint: self.news_endpoint.clone(),
            timeout_ms: self.timeout_ms,
            max_results: self.max_results,
            politeness_ms: self.politeness_ms,
            ..GatherConfig::default()
        }
    }

    fn responder_config(&self) -> ResponderConfig {
        ResponderConfig::default().with_seed(self.phrase_seed)
    }

    fn answerer(&self) -> Result<WebAnswerer> {
        WebAnswerer::live(
            &self.user_agent,
            self.gather_config(),
            self.responder_config(),
        )
        .context("build answer pipeline")
    }
}

fn init_tracing(format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout belongs to command output (`ask`, `version`).
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format.to_ascii_lowercase().as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("init tracing: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            init_tracing(&cli.log_format)?;
            let answerer = args.pipeline.answerer()?;
            let app = build_router(AppState::new(Arc::new(answerer)));
            let listener = tokio::net::TcpListener::bind(args.bind)
                .await
                .with_context(|| format!("bind {}", args.bind))?;
            tracing::info!(addr = %args.bind, "webreply listening");
            axum::serve(listener, app).await?;
        }
        Commands::Ask(args) => {
            init_tracing(&cli.log_format)?;
            let query = args.message.trim();
            if query.is_empty() {
                anyhow::bail!("message is required");
            }
            let answerer = args.pipeline.answerer()?;
            let payload = answerer.answer(query).await?;
            let reply = ChatReply::new(query, payload, SystemClock.now());
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "webreply",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("webreply {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn pipeline_flags_flow_into_configs() {
        let cli = Cli::try_parse_from([
            "webreply",
            "ask",
            "what is rust",
            "--politeness-ms",
            "0",
            "--max-results",
            "3",
            "--search-endpoint",
            "http://127.0.0.1:9/html/",
            "--phrase-seed",
            "7",
        ])
        .unwrap();
        let Commands::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.message, "what is rust");
        let g = args.pipeline.gather_config();
        assert_eq!(g.politeness_ms, 0);
        assert_eq!(g.max_results, 3);
        assert_eq!(g.search_endpoint, "http://127.0.0.1:9/html/");
        assert_eq!(g.min_scraped_chars, gather::DEFAULT_MIN_SCRAPED_CHARS);
        assert_eq!(args.pipeline.responder_config().phrase_seed, 7);
    }
}
