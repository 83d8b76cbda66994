use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "shield-cli")]
#[command(about = "Management CLI for the checkout shield", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "SHIELD_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show limits and log size
    Status,
    /// List blocked attempts, newest first
    Logs,
    /// Show the attempt count for an address
    Attempts { ip: String },
    /// Reset the attempt counter for an address
    Unblock {
        ip: String,
        /// Also delete the address's log entries
        #[arg(long)]
        remove_logs: bool,
    },
    /// Delete one log entry by its index in `logs`
    RemoveLog { index: i64 },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Logs => {
            let res = client.get(format!("{}/admin/logs", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Attempts { ip } => {
            let res = client
                .get(format!("{}/admin/attempts/{}", cli.url, ip))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Unblock { ip, remove_logs } => {
            let token = fetch_token(&client, &cli.url, "ip_block_unblock_action").await?;
            let mut form = vec![
                ("ip_block_action", "unblock_ip".to_string()),
                ("ip_block_nonce", token),
                ("ip", ip),
            ];
            if remove_logs {
                form.push(("ip_block_remove_logs", "1".to_string()));
            }
            let res = client
                .post(format!("{}/admin/actions", cli.url))
                .form(&form)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::RemoveLog { index } => {
            let token = fetch_token(&client, &cli.url, "ip_block_remove_log").await?;
            let form = [
                ("ip_block_action", "remove_log_entry".to_string()),
                ("ip_block_nonce", token),
                ("log_index", index.to_string()),
            ];
            let res = client
                .post(format!("{}/admin/actions", cli.url))
                .form(&form)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn fetch_token(
    client: &reqwest::Client,
    url: &str,
    action: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let res = client
        .get(format!("{}/admin/token/{}", url, action))
        .send()
        .await?
        .error_for_status()?;
    let body: Value = res.json().await?;
    body.get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "token missing from response".into())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
