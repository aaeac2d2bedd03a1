mod api;
mod server;

use base64::Engine;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use cooked::config::AppConfig;
use cooked::judgment::{ImagePayload, JudgeRequest};
use cooked::llm::{JudgeService, LlmClient};
use cooked::scoring::classify_band;
use cooked::PostKind;

#[derive(Parser)]
#[command(name = "cooked", about = "Am I Cooked? roast board")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Judge a single story
    Judge(JudgeArgs),
    /// Show the band for a score
    Band(BandArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    web_root: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct JudgeArgs {
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value = "shame")]
    kind: String,
}

#[derive(Args, Debug, Clone)]
struct BandArgs {
    score: u8,
    #[arg(long, default_value = "shame")]
    kind: String,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let (mut config, config_path) = AppConfig::load(cli.config)?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    let command = cli.command.unwrap_or(Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            if let Some(web_root) = args.web_root {
                config.server.web_root = web_root;
            }
            server::serve(config).await
        }
        Command::Judge(args) => run_judge(args, &config).await,
        Command::Band(args) => run_band(args),
    }
}

async fn run_judge(args: JudgeArgs, config: &AppConfig) -> Result<(), String> {
    let kind = parse_kind(&args.kind)?;
    let story = read_text(args.text)?;
    let image_base64 = match args.image {
        Some(path) => Some(read_image(&path)?),
        None => None,
    };
    if let Some(raw) = image_base64.as_deref() {
        ImagePayload::parse(raw)?;
    }

    let client = LlmClient::from_env(&config.judge);
    if client.is_none() {
        eprintln!("GEMINI_API_KEY is not set; showing a fallback judgment");
    }
    let service = JudgeService::new(client);
    let result = service
        .judge(&JudgeRequest {
            story,
            image_base64,
        })
        .await;

    let band = classify_band(result.cooked_score, kind);
    println!("Cooked score: {}% ({})", result.cooked_score, band.label);
    println!("Verdict: {}", result.verdict);
    Ok(())
}

fn run_band(args: BandArgs) -> Result<(), String> {
    if args.score > 100 {
        return Err(format!("invalid score (0-100): {}", args.score));
    }
    let kind = parse_kind(&args.kind)?;
    let band = classify_band(args.score, kind);
    println!("{}% {} -> {} [{}]", args.score, kind.label(), band.label, band.color);
    Ok(())
}

fn parse_kind(value: &str) -> Result<PostKind, String> {
    PostKind::from_str(value).ok_or_else(|| format!("invalid post kind: {}", value))
}

fn read_text(arg: Option<String>) -> Result<String, String> {
    if let Some(text) = arg {
        if !text.trim().is_empty() {
            return Ok(text);
        }
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("failed reading stdin: {}", err))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err("missing story: pass --text or pipe stdin".to_string());
    }
    Ok(trimmed.to_string())
}

fn read_image(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path)
        .map_err(|err| format!("failed reading image {}: {}", path.display(), err))?;
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    let data = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, data))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cooked=info,tower_http=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
