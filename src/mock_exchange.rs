// src/mock_exchange.rs

use crate::openrtb::request::{BidRequest, Imp};
use crate::openrtb::response::{Bid, BidResponse, ExtBidResponse, SeatBid};
use axum::{routing::post, serve, Json, Router};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::info;

/// 模拟 PubMatic 交易所的出价
/// 每个 imp 出一个 bid，mtype 按 imp 的媒体类型给出；带 ae=1 的 imp 额外返回 fledge 配置
async fn handle_translator(Json(request): Json<BidRequest>) -> Json<BidResponse> {
    info!(
        "Mock exchange received BidRequest: id={}, imp_count={}",
        request.id,
        request.imp.len()
    );

    // 模拟交易所处理延迟（20 ~ 80 毫秒）
    let delay_ms = rand::thread_rng().gen_range(20..80);
    sleep(Duration::from_millis(delay_ms)).await;

    let bids: Vec<Bid> = request.imp.iter().map(mock_bid).collect();

    let fledge_auction_configs: Map<String, Value> = request
        .imp
        .iter()
        .filter(|imp| wants_fledge(imp))
        .map(|imp| {
            (
                imp.id.clone(),
                json!({"seller": "https://ads.pubmatic.com", "interestGroupBuyers": ["https://dsp.example"]}),
            )
        })
        .collect();

    Json(BidResponse {
        id: request.id.clone(),
        seatbid: Some(vec![SeatBid {
            bid: Some(bids),
            seat: Some("pubmatic".to_string()),
            ..Default::default()
        }]),
        cur: Some("USD".to_string()),
        ext: (!fledge_auction_configs.is_empty()).then(|| ExtBidResponse {
            fledge_auction_configs: Some(fledge_auction_configs),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn mock_bid(imp: &Imp) -> Bid {
    let bid_id = format!("bid-{}", imp.id);
    let bidfloor = imp.bidfloor.and_then(|floor| floor.to_f64()).unwrap_or(0.1);
    let price = bidfloor * rand::thread_rng().gen_range(1.0..2.0);

    let (mtype, adm, ext) = if imp.video.is_some() {
        (
            2,
            format!(
                r#"<VAST version="3.0"><Ad id="{bid_id}"><InLine><AdSystem>Mock PubMatic</AdSystem><Impression><![CDATA[http://tracker.local/impression?bid={bid_id}]]></Impression></InLine></Ad></VAST>"#
            ),
            json!({"video": {"duration": 30}}),
        )
    } else if imp.native.is_some() {
        (
            4,
            json!({"native": {"assets": [{"title": {"text": "Mock Native Ad"}}], "imptrackers": [format!("http://tracker.local/impression?bid={bid_id}")]}})
                .to_string(),
            json!({}),
        )
    } else {
        (
            1,
            format!(
                "<html><body>Mock PubMatic Banner<img src=\"http://tracker.local/impression?bid={bid_id}\" style=\"display:none;\" /></body></html>"
            ),
            json!({"prebiddealpriority": 1}),
        )
    };

    Bid {
        id: bid_id,
        impid: imp.id.clone(),
        price,
        adm: Some(adm),
        crid: Some(format!("creative-{}", imp.id)),
        cat: Some(vec!["IAB1".to_string(), "IAB2".to_string()]),
        mtype: Some(mtype),
        ext: ext.as_object().cloned(),
        ..Default::default()
    }
}

fn wants_fledge(imp: &Imp) -> bool {
    imp.ext
        .as_ref()
        .and_then(|ext| ext.get("ae"))
        .and_then(Value::as_i64)
        == Some(1)
}

/// 启动 Mock 交易所，路由为 `/translator`
pub async fn start_mock_exchange_server(port: u16) -> std::io::Result<()> {
    let app = Router::new().route("/translator", post(handle_translator));

    let addr = format!("0.0.0.0:{}", port);
    info!("Mock exchange running at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    serve(listener, app).await
}
