//! `idea-gen`: request one idea from the generation service and print it as JSON.

mod args;
mod observability;

use clap::Parser;
use idea_session::prelude::*;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::args::Args;
use crate::observability::init_observability;

const PROGRESS_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_observability();

    let args = Args::parse();
    let client = SessionClient::from_config(ClientConfig::from_env()?)?;
    let request = args.request();
    info!(
        event = "cli.run_started",
        caller_id = args.id,
        stage = %client.options().structured_stage,
        themes = request.themes.len() as u64
    );

    let result = if args.progress {
        let (tx, mut rx) = mpsc::channel(PROGRESS_BUFFER);
        let printer = tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                print_progress(&item);
            }
            eprintln!();
        });
        let result = client.run_with_progress(request, args.id, tx).await;
        let _ = printer.await;
        result
    } else {
        client.run(request, args.id).await
    };
    let idea = match result {
        Ok(idea) => idea,
        Err(err) => {
            error!(event = "cli.run_failed", caller_id = args.id, error = %err);
            return Err(err.into());
        }
    };
    info!(event = "cli.run_completed", caller_id = args.id, title = %idea.title);

    println!("{}", serde_json::to_string_pretty(&idea)?);
    Ok(())
}

fn print_progress(item: &Progress) {
    match item {
        Progress::Connected { message } => {
            eprintln!("[connected] {}", message.as_deref().unwrap_or(""));
        }
        Progress::Token { content, .. } => eprint!("{content}"),
        Progress::StageComplete { node } => eprintln!("\n[stage complete] {node}"),
    }
}
