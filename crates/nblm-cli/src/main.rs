mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use nblm_config::{load_config, Config};
use nblm_core::codes;
use nblm_rpc::{Client, QueryOptions, RpcError};
use nblm_util::{init_tracing, LogLevel};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let level = if cli.debug || config.is_debug() {
        LogLevel::Debug
    } else {
        config
            .log_level
            .as_deref()
            .map(LogLevel::parse)
            .unwrap_or_default()
    };
    let _logging = if cli.log_file {
        init_tracing(level, Some(log_dir()), false)
    } else {
        init_tracing(level, None, true)
    };

    run(cli.command, &config).await
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    if let Commands::Codes { table } = &command {
        return print_codes(table.as_deref());
    }

    let client = Client::from_config(config).await;
    tracing::debug!(
        base_url = client.auth().base_url(),
        build_label = client.build_label(),
        "client ready"
    );
    match command {
        Commands::Status => print_json(&status_report(&client).await),
        Commands::Tokens { refresh } => {
            let auth = client.auth();
            let result = if refresh {
                auth.refresh_tokens().await
            } else {
                auth.ensure_tokens().await
            };
            result.map_err(|e| explain(e.into()))?;
            print_json(&status_report(&client).await)
        }
        Commands::Exec {
            rpc_id,
            params,
            source_path,
        } => {
            let params: Value =
                serde_json::from_str(&params).context("PARAMS must be a JSON value")?;
            let payload = client
                .execute(&rpc_id, &params, &source_path)
                .await
                .map_err(explain)?;
            print_json(&payload)
        }
        Commands::Sources { notebook_id } => {
            let sources = client
                .notebook_sources(&notebook_id)
                .await
                .map_err(explain)?;
            print_json(&sources)
        }
        Commands::Query {
            notebook_id,
            question,
            sources,
            conversation,
            timeout,
        } => {
            let options = QueryOptions {
                source_ids: (!sources.is_empty()).then_some(sources),
                conversation_id: conversation,
                timeout: Some(Duration::from_secs(timeout)),
            };
            let answer = client
                .query(&notebook_id, &question.join(" "), options)
                .await
                .map_err(explain)?;
            print_json(&answer)
        }
        Commands::Codes { .. } => Ok(()),
    }
}

async fn status_report(client: &Client) -> Value {
    let auth = client.auth();
    json!({
        "status": auth.status().await,
        "base_url": auth.base_url(),
        "build_label": client.build_label(),
        "token_extractions": auth.extraction_count(),
    })
}

fn print_codes(table: Option<&str>) -> anyhow::Result<()> {
    let Some(name) = table else {
        for name in codes::TABLE_NAMES {
            println!("{name}");
        }
        return Ok(());
    };
    let map = codes::table(name).with_context(|| {
        format!(
            "unknown code table '{name}', expected one of: {}",
            codes::TABLE_NAMES.join(", ")
        )
    })?;
    for entry in map.names() {
        if let Some(code) = map.code(entry) {
            println!("{code}\t{entry}");
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn explain(error: RpcError) -> anyhow::Error {
    let hint = if error.should_retry() {
        Some("tokens were refreshed; run the command again")
    } else if error.is_auth_related() {
        Some("export fresh browser cookies in NOTEBOOKLM_COOKIES")
    } else {
        None
    };
    let error = anyhow::Error::new(error);
    match hint {
        Some(hint) => error.context(hint),
        None => error,
    }
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("nblm")
        .join("log")
}
