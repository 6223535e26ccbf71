use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use config_plane::config::loader::{decode_document, read_document};
use config_plane::service::{DocumentPayload, UpdateConfigRequest};

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Client for the config-plane control API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8765")]
    server: String,

    /// Bearer token for /v1/config
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show control API status
    Status,
    /// Print the active configuration
    Get,
    /// Replace the active configuration with a file
    Update { file: PathBuf },
    /// Check a file locally without contacting the server
    Validate { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.api_key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }
    let client = reqwest::Client::builder().default_headers(headers).build()?;

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/v1/status", cli.server)).send().await?;
            print_response(res).await?;
        }
        Commands::Get => {
            let res = client.get(format!("{}/v1/config", cli.server)).send().await?;
            print_response(res).await?;
        }
        Commands::Update { file } => {
            let document = read_document(&file)?;
            let request = UpdateConfigRequest {
                config: Some(DocumentPayload::new(
                    document.format,
                    String::from_utf8(document.content)?,
                )),
            };
            let res = client
                .post(format!("{}/v1/config", cli.server))
                .json(&request)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Validate { file } => {
            let document = read_document(&file)?;
            match decode_document(&document) {
                Ok(config) => {
                    println!("{} is valid", file.display());
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                Err(errors) => {
                    for message in errors.messages() {
                        eprintln!("- {}", message);
                    }
                    let summary = format!("{} has {} problem(s)", file.display(), errors.len());
                    return Err(summary.into());
                }
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or(text);

    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
        eprintln!("{}", body);
        return Err(format!("request failed with status {}", status).into());
    }

    println!("{}", body);
    Ok(())
}
