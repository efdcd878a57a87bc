use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use tracker_core::config::{Configuration, EngineConfig, MqttConfig};
use tracker_core::sensor::HttpSensorClient;
use tracker_core::session::{PollerDeps, PollerRegistry};
use tracker_core::sink::{MemoryStore, MqttPublisher};

/// 标准输出 + 按天滚动文件双路日志
pub fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let _ = LogTracer::builder().init();
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "tracker"));
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_timer(fmt::time::ChronoLocal::rfc_3339())
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stdout)
        .with_filter(LevelFilter::INFO);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(LevelFilter::INFO);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(ErrorLayer::default())
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer);
    tracing::subscriber::set_global_default(subscriber).expect("Tracing collect error");
    guard
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "tracker配置文件")]
    config: String,
}

pub async fn cmd() -> anyhow::Result<()> {
    let args = Args::parse();
    let configuration = Configuration::new(args.config).await?;
    let mqtt = MqttConfig::from(configuration.project.mqtt.clone());
    let engine = EngineConfig::try_from(configuration.project)?;

    let publisher = Arc::new(MqttPublisher::new(&mqtt));
    let deps = PollerDeps {
        fetcher: Arc::new(HttpSensorClient::new(engine.fetch_timeout)),
        store: Arc::new(MemoryStore::new()),
        publisher: publisher.clone(),
    };
    let registry = PollerRegistry::new(engine.sources.clone(), deps, engine.shutdown_timeout);

    for session_id in &engine.sessions {
        registry.start(*session_id);
    }
    info!("已启动{}个会话轮询, Ctrl-C 退出", registry.len());

    tokio::signal::ctrl_c().await?;
    info!("收到停止信号, 正在关闭");
    registry.stop_all().await;
    publisher.disconnect().await;
    Ok(())
}
