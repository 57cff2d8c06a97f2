// src/logging/logger.rs

use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// 默认过滤级别，RUST_LOG 未设置时使用
const DEFAULT_FILTER: &str = "info";

/// 初始化全局 tracing：JSON 格式，按小时滚动写入 `log_dir/file_name`。
/// 返回的 guard 必须在进程生命周期内保持存活，否则缓冲的日志会丢失。
pub fn init_tracing(log_dir: &str, file_name: &str) -> Result<WorkerGuard, SetGlobalDefaultError> {
    let log_file = rolling::hourly(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking));

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
