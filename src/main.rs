//! Spotter - AI 健身教练编排核心
//!
//! 入口：初始化日志、装配 Coach，从命令行参数取一条请求并流式打印回答。

use std::io::Write;

use anyhow::Context;
use spotter::core::CoachBuilder;
use spotter::stream::StreamEvent;
use spotter::{load_config, AppConfig, RequestContext};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let text = if text.trim().is_empty() {
        "generate a 45 minute strength workout with dumbbells".to_string()
    } else {
        text
    };

    let coach = CoachBuilder::new(cfg)
        .build()
        .await
        .context("Failed to build coach")?;

    let request = RequestContext::from_text(text).context("Empty request")?;
    let (mut rx, _cancel) = coach.orchestrate_stream(request);

    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::Chunk(chunk) => {
                print!("{chunk}");
                stdout.flush().ok();
            }
            StreamEvent::Complete(response) => {
                println!();
                tracing::info!(
                    provider = %response.provider,
                    confidence = response.confidence,
                    tools = ?response.tools_used,
                    "response complete"
                );
            }
        }
    }

    Ok(())
}
