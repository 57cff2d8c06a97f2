// src/main.rs

use axum::serve;
use clap::{Parser, Subcommand};
use pubmatic_adapter::api::exchange_client::ExchangeClient;
use pubmatic_adapter::api::handlers::{router, AppState, RequestTranslation};
use pubmatic_adapter::config::ConfigManager;
use pubmatic_adapter::logging::logger::init_tracing;
use pubmatic_adapter::logging::translation_log::TranslationLog;
use pubmatic_adapter::mock_exchange;
use pubmatic_adapter::model::bidder::{BidderCall, HttpResponse};
use pubmatic_adapter::openrtb::request::BidRequest;
use pubmatic_adapter::{Bidder, PubmaticBidder};
use std::error::Error;
use std::fs;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "PubMatic OpenRTB bidder adapter")]
struct CliArgs {
    /// 适配器配置文件
    #[arg(long, default_value = "static/pubmatic.json")]
    config: String,
    /// 覆盖配置文件中的交易所地址
    #[arg(long)]
    endpoint: Option<String>,
    /// 覆盖配置文件中的 bidder 名称
    #[arg(long)]
    bidder_name: Option<String>,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 翻译一个归一化 BidRequest 文件，打印交易所请求
    Request { file: String },
    /// 翻译一个交易所响应体文件，打印归一化 bid
    Response { file: String },
    /// 启动翻译服务和 Mock 交易所
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value_t = 9001)]
        mock_port: u16,
        /// 调用交易所的超时（毫秒）
        #[arg(long, default_value_t = 300)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("pubmatic-adapter: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    // guard 需要存活到进程退出
    let _guard = init_tracing(&args.log_dir, "pubmatic_adapter.json")?;

    let config = ConfigManager::from_args(&args.config, args.endpoint.clone(), args.bidder_name.clone())?;
    let bidder = PubmaticBidder::from_config(&config.adapter)?;
    info!(endpoint = %bidder.endpoint(), bidder = bidder.bidder_name(), "adapter configured");

    match args.command {
        Command::Request { file } => {
            let bid_request: BidRequest = serde_json::from_str(&fs::read_to_string(&file)?)?;
            let result = bidder.make_http_requests(&bid_request);
            TranslationLog::for_request(&bid_request.id, bid_request.imp.len(), &result).emit();
            println!("{}", serde_json::to_string_pretty(&RequestTranslation::from(&result))?);
        }
        Command::Response { file } => {
            let body = fs::read_to_string(&file)?;
            let call = BidderCall::succeeded(None, HttpResponse::ok(body));
            let response = bidder.make_bidder_response(&call);
            TranslationLog::for_response("", &response).emit();
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Serve {
            port,
            mock_port,
            timeout_ms,
        } => serve_translator(bidder, port, mock_port, timeout_ms).await?,
    }

    Ok(())
}

async fn serve_translator(
    bidder: PubmaticBidder,
    port: u16,
    mock_port: u16,
    timeout_ms: u64,
) -> Result<(), Box<dyn Error>> {
    // 启动 Mock 交易所
    let mock_exchange = tokio::spawn(async move {
        if let Err(e) = mock_exchange::start_mock_exchange_server(mock_port).await {
            error!("Mock exchange stopped: {}", e);
        }
    });

    let state = Arc::new(AppState {
        bidder: Arc::new(bidder),
        exchange: Arc::new(ExchangeClient::new(timeout_ms)),
    });

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("PubMatic translator running at http://{}", addr);

    serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Unable to listen for shutdown signal: {}", e);
            }
            info!("Shutting down gracefully...");
        })
        .await?;

    mock_exchange.abort();
    info!("PubMatic translator shut down.");
    Ok(())
}
