// src/api/handlers.rs

use crate::api::exchange_client::ExchangeClient;
use crate::bidding::bidder::Bidder;
use crate::bidding::pubmatic::PubmaticBidder;
use crate::logging::translation_log::TranslationLog;
use crate::model::bidder::{BidderCall, BidderResult, CompositeBidderResponse, HttpRequest, HttpResponse};
use crate::model::error::BidderError;
use crate::openrtb::request::BidRequest;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub bidder: Arc<PubmaticBidder>,
    pub exchange: Arc<ExchangeClient>,
}

/// HttpRequest 的可序列化视图
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutgoingRequestView {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub imp_ids: BTreeSet<String>,
    pub body: Value,
}

impl From<&HttpRequest> for OutgoingRequestView {
    fn from(request: &HttpRequest) -> Self {
        Self {
            method: request.method.to_string(),
            uri: request.uri.to_string(),
            headers: request
                .headers
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|value| (name.to_string(), value.to_string()))
                })
                .collect(),
            imp_ids: request.imp_ids.clone(),
            body: json!(request.payload),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RequestTranslation {
    pub requests: Vec<OutgoingRequestView>,
    pub errors: Vec<BidderError>,
}

impl From<&BidderResult<Vec<HttpRequest>>> for RequestTranslation {
    fn from(result: &BidderResult<Vec<HttpRequest>>) -> Self {
        Self {
            requests: result.value.iter().map(OutgoingRequestView::from).collect(),
            errors: result.errors.clone(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/pubmatic/request", post(handle_translate_request))
        .route("/pubmatic/response", post(handle_translate_response))
        .route("/pubmatic/auction", post(handle_auction))
        .with_state(state)
}

/// **归一化请求 -> 交易所请求**
pub async fn handle_translate_request(
    State(state): State<Arc<AppState>>,
    Json(bid_request): Json<BidRequest>,
) -> (StatusCode, Json<RequestTranslation>) {
    let result = state.bidder.make_http_requests(&bid_request);
    TranslationLog::for_request(&bid_request.id, bid_request.imp.len(), &result).emit();

    let status = if result.value.is_empty() && !result.errors.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(RequestTranslation::from(&result)))
}

/// **交易所响应体 -> 归一化 bid**
pub async fn handle_translate_response(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Json<CompositeBidderResponse> {
    let call = BidderCall::succeeded(None, HttpResponse::ok(body));
    let response = state.bidder.make_bidder_response(&call);
    TranslationLog::for_response("", &response).emit();
    Json(response)
}

/// **完整往返**：翻译请求、调用交易所、翻译响应
pub async fn handle_auction(
    State(state): State<Arc<AppState>>,
    Json(bid_request): Json<BidRequest>,
) -> (StatusCode, Json<CompositeBidderResponse>) {
    let result = state.bidder.make_http_requests(&bid_request);
    TranslationLog::for_request(&bid_request.id, bid_request.imp.len(), &result).emit();

    if result.value.is_empty() {
        let status = if result.errors.is_empty() {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::BAD_REQUEST
        };
        return (
            status,
            Json(CompositeBidderResponse {
                errors: result.errors,
                ..Default::default()
            }),
        );
    }

    let mut combined = CompositeBidderResponse::default();
    for request in result.value {
        match state.exchange.send(&request).await {
            Ok(response) => {
                let translated = translate_exchange_response(&state.bidder, request, response);
                TranslationLog::for_response(&bid_request.id, &translated).emit();

                combined.bids.extend(translated.bids);
                combined.errors.extend(translated.errors);
                if let Some(igi) = translated.igi {
                    combined.igi.get_or_insert_with(Vec::new).extend(igi);
                }
            }
            Err(e) => combined.errors.push(BidderError::generic(e.to_string())),
        }
    }

    (StatusCode::OK, Json(combined))
}

/// 204 表示无出价；其它非 2xx 状态不进入响应转换
pub fn translate_exchange_response(
    bidder: &PubmaticBidder,
    request: HttpRequest,
    response: HttpResponse,
) -> CompositeBidderResponse {
    if response.is_no_content() {
        return CompositeBidderResponse::default();
    }
    if !response.is_success() {
        return CompositeBidderResponse::with_error(BidderError::generic(format!(
            "Unexpected status code: {}",
            response.status_code
        )));
    }

    bidder.make_bidder_response(&BidderCall::succeeded(Some(request), response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            bidder: Arc::new(
                PubmaticBidder::new("http://test.endpoint.com/translator?source=prebid-server", "pubmatic")
                    .unwrap(),
            ),
            exchange: Arc::new(ExchangeClient::new(100)),
        })
    }

    #[tokio::test]
    async fn translates_request_into_outgoing_view() {
        let bid_request: BidRequest = serde_json::from_value(json!({
            "id": "requestId",
            "imp": [{
                "id": "123",
                "banner": {"w": 300, "h": 250},
                "ext": {"bidder": {"publisherId": "pub id", "adSlot": "slot@300x250"}}
            }],
            "site": {"id": "site"}
        }))
        .unwrap();

        let (status, Json(translation)) =
            handle_translate_request(State(state()), Json(bid_request)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(translation.errors.is_empty());
        let view = &translation.requests[0];
        assert_eq!(view.method, "POST");
        assert_eq!(view.uri, "http://test.endpoint.com/translator?source=prebid-server");
        assert_eq!(view.headers.get("accept").map(String::as_str), Some("application/json"));
        assert_eq!(view.body["imp"][0]["tagid"], json!("slot"));
        assert_eq!(view.body["site"]["publisher"]["id"], json!("pub id"));
    }

    #[tokio::test]
    async fn rejected_request_is_bad_request() {
        let bid_request: BidRequest =
            serde_json::from_value(json!({"id": "requestId", "imp": [{"id": "123"}]})).unwrap();

        let (status, Json(translation)) =
            handle_translate_request(State(state()), Json(bid_request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(translation.requests.is_empty());
        assert_eq!(translation.errors.len(), 1);
    }

    #[tokio::test]
    async fn translates_exchange_body() {
        let body = json!({
            "cur": "USD",
            "seatbid": [{"bid": [{"id": "b1", "impid": "123", "price": 1.5, "mtype": 2}]}]
        })
        .to_string();

        let Json(response) = handle_translate_response(State(state()), body).await;
        assert!(response.errors.is_empty());
        assert_eq!(response.bids.len(), 1);
        assert_eq!(response.bids[0].bid.price, 1.5);
    }

    fn outgoing_request() -> HttpRequest {
        let bid_request: BidRequest = serde_json::from_value(json!({
            "id": "requestId",
            "imp": [{"id": "123", "banner": {"w": 300, "h": 250}, "ext": {"bidder": {}}}]
        }))
        .unwrap();
        state().bidder.make_http_requests(&bid_request).value.remove(0)
    }

    #[test]
    fn no_content_from_exchange_means_no_bids() {
        let response = HttpResponse {
            status_code: 204,
            ..Default::default()
        };

        let translated = translate_exchange_response(&state().bidder, outgoing_request(), response);
        assert_eq!(translated, CompositeBidderResponse::default());
    }

    #[test]
    fn non_success_status_is_generic_error() {
        let response = HttpResponse {
            status_code: 500,
            body: "oops".to_string(),
            ..Default::default()
        };

        let translated = translate_exchange_response(&state().bidder, outgoing_request(), response);
        assert!(translated.bids.is_empty());
        assert_eq!(
            translated.errors,
            vec![BidderError::generic("Unexpected status code: 500")]
        );
    }

    #[test]
    fn successful_exchange_body_is_translated() {
        let body = json!({"seatbid": [{"bid": [{"impid": "123", "mtype": 1}]}]}).to_string();

        let translated =
            translate_exchange_response(&state().bidder, outgoing_request(), HttpResponse::ok(body));
        assert!(translated.errors.is_empty());
        assert_eq!(translated.bids.len(), 1);
    }

    #[tokio::test]
    async fn auction_with_no_content_exchange_has_no_errors() {
        let exchange = Router::new().route("/translator", post(|| async { StatusCode::NO_CONTENT }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, exchange).await;
        });

        let state = Arc::new(AppState {
            bidder: Arc::new(
                PubmaticBidder::new(&format!("http://{}/translator", addr), "pubmatic").unwrap(),
            ),
            exchange: Arc::new(ExchangeClient::new(1000)),
        });
        let bid_request: BidRequest = serde_json::from_value(json!({
            "id": "requestId",
            "imp": [{"id": "123", "banner": {"w": 300, "h": 250}, "ext": {"bidder": {}}}]
        }))
        .unwrap();

        let (status, Json(response)) = handle_auction(State(state), Json(bid_request)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.bids.is_empty());
        assert!(response.errors.is_empty());
    }

    #[tokio::test]
    async fn auction_without_imps_has_no_content() {
        let bid_request = BidRequest {
            id: "requestId".to_string(),
            ..Default::default()
        };

        let (status, Json(response)) = handle_auction(State(state()), Json(bid_request)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(response.bids.is_empty() && response.errors.is_empty());
    }
}
