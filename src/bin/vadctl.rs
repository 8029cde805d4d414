//! `vadctl` — thin HTTP client for the `vad-streamerd` control surface.
//!
//! Mirrors the wire contract documented for the service: `status` issues a
//! GET, `stop` a POST, and `start key=value ...` a POST with a JSON body
//! built from the trailing `key=value` pairs (numeric-looking values are
//! coerced to JSON numbers, everything else stays a string).

use clap::Parser;
use serde_json::Value;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "vadctl")]
#[command(about = "Control the vad-streamerd VAD service over HTTP")]
#[command(disable_help_flag = true)]
struct Args {
    /// `status`, `stop`, `start [key=value ...]`, or `help`
    command: Option<String>,
    /// Trailing `key=value` pairs for `start`.
    rest: Vec<String>,
}

fn print_usage() {
    println!("usage: vadctl <status|stop|start [key=value ...]|help>");
    println!();
    println!("  status              print current VAD status as JSON");
    println!("  stop                stop the running VAD pipeline");
    println!("  start [k=v ...]     start the VAD pipeline, optionally overriding options");
    println!();
    println!("environment: SERVER_URL (default http://localhost:5173)");
}

fn server_url() -> String {
    std::env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:5173".to_string())
}

/// Parse a `key=value` pair into a JSON value, coercing numeric-looking
/// values to JSON numbers and leaving everything else as a string.
fn parse_kv(pair: &str) -> Option<(String, Value)> {
    let (key, raw) = pair.split_once('=')?;
    let value = match raw.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => match raw.parse::<f64>() {
            Ok(f) => Value::from(f),
            Err(_) => Value::from(raw),
        },
    };
    Some((key.to_string(), value))
}

async fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let base = server_url();
    let client = reqwest::Client::new();

    let command = match args.command.as_deref() {
        None => {
            print_usage();
            return Ok(ExitCode::SUCCESS);
        }
        Some(c) => c,
    };

    match command {
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(ExitCode::SUCCESS)
        }
        "status" => {
            let resp = client
                .get(format!("{}/api/v1/vad/status", base))
                .send()
                .await?;
            let body: Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        "stop" => {
            let resp = client
                .post(format!("{}/api/v1/vad/stop", base))
                .send()
                .await?;
            let body: Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        "start" => {
            let mut body = serde_json::Map::new();
            for pair in &args.rest {
                if let Some((key, value)) = parse_kv(pair) {
                    body.insert(key, value);
                } else {
                    eprintln!("ignoring malformed argument (expected key=value): {}", pair);
                }
            }

            let resp = client
                .post(format!("{}/api/v1/vad/start", base))
                .json(&Value::Object(body))
                .send()
                .await?;
            let status = resp.status();
            let body: Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            if status.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        other => {
            eprintln!("unknown command: {}", other);
            print_usage();
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("vadctl: {}", e);
            ExitCode::FAILURE
        }
    }
}
