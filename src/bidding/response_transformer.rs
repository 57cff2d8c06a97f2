// src/bidding/response_transformer.rs

use crate::model::bid_ext::{ExtBidPrebid, ExtBidPrebidMeta, ExtBidPrebidVideo, PubmaticBidExt};
use crate::model::bidder::{BidType, BidderBid, CompositeBidderResponse, ExtIgi, ExtIgiIgs};
use crate::model::error::BidderError;
use crate::openrtb::response::{Bid, BidResponse};
use serde_json::{json, Map, Value};
use tracing::warn;

const PREBID_KEY: &str = "prebid";
const NATIVE_KEY: &str = "native";

/// 交易所响应体 -> 归一化 bid + IGI 旁路信息 + 错误
pub fn transform_response(body: &str) -> CompositeBidderResponse {
    let bid_response = match decode_response(body) {
        Ok(bid_response) => bid_response,
        Err(error) => return CompositeBidderResponse::with_error(error),
    };

    let mut errors = Vec::new();
    let bids = extract_bids(bid_response.as_ref(), &mut errors);
    let igi = extract_igi(bid_response.as_ref());

    CompositeBidderResponse { bids, igi, errors }
}

/// 响应体为 JSON null 时返回 Ok(None)
pub fn decode_response(body: &str) -> Result<Option<BidResponse>, BidderError> {
    // simd-json 需要可变缓冲区
    let mut buffer = body.as_bytes().to_vec();
    simd_json::serde::from_slice::<Option<BidResponse>>(&mut buffer)
        .map_err(|e| BidderError::bad_server_response(format!("Failed to decode: {}", e)))
}

fn extract_bids(bid_response: Option<&BidResponse>, errors: &mut Vec<BidderError>) -> Vec<BidderBid> {
    let Some(bid_response) = bid_response else {
        return Vec::new();
    };
    let currency = bid_response.cur.as_deref();

    bid_response
        .seatbid
        .iter()
        .flatten()
        .filter_map(|seat_bid| seat_bid.bid.as_ref())
        .flatten()
        .filter_map(|bid| resolve_bidder_bid(bid, currency, errors))
        .collect()
}

fn resolve_bidder_bid(
    bid: &Bid,
    currency: Option<&str>,
    errors: &mut Vec<BidderError>,
) -> Option<BidderBid> {
    let first_cat = bid
        .cat
        .as_ref()
        .and_then(|cat| cat.first())
        .map(|first| vec![first.clone()]);

    let bid_ext = parse_bid_ext(bid.ext.as_ref(), errors);

    let Some(bid_type) = BidType::from_mtype(bid.mtype) else {
        let mtype = bid
            .mtype
            .map_or_else(|| "null".to_string(), |mtype| mtype.to_string());
        warn!(impid = %bid.impid, mtype = %mtype, "dropping bid with unknown mtype");
        errors.push(BidderError::bad_server_response(format!(
            "failed to parse bid mtype ({}) for impression id {}",
            mtype, bid.impid
        )));
        return None;
    };

    let adm = match (&bid.adm, bid_type) {
        (Some(adm), BidType::Native) => Some(resolve_native_adm(adm, errors).unwrap_or_else(|| adm.clone())),
        (adm, _) => adm.clone(),
    };

    let ext = update_bid_ext(bid_ext.as_ref(), bid_type, bid.ext.clone());

    let updated_bid = Bid {
        cat: first_cat,
        adm,
        ext: Some(ext),
        ..bid.clone()
    };

    Some(BidderBid {
        bid: updated_bid,
        bid_type,
        bid_currency: currency.map(str::to_string),
        deal_priority: bid_ext.as_ref().and_then(|ext| ext.prebiddealpriority),
        seat: bid_ext.and_then(|ext| ext.marketplace),
    })
}

fn parse_bid_ext(ext: Option<&Map<String, Value>>, errors: &mut Vec<BidderError>) -> Option<PubmaticBidExt> {
    let ext = ext?;
    match serde_json::from_value::<PubmaticBidExt>(Value::Object(ext.clone())) {
        Ok(bid_ext) => Some(bid_ext),
        Err(e) => {
            errors.push(BidderError::bad_server_response(e.to_string()));
            None
        }
    }
}

/// native adm 形如 {"native": {...}} 时取出内层；无法解析时记录错误，返回 None 表示保持原值
fn resolve_native_adm(adm: &str, errors: &mut Vec<BidderError>) -> Option<String> {
    let adm_node: Value = match serde_json::from_str(adm) {
        Ok(node) => node,
        Err(_) => {
            errors.push(BidderError::bad_server_response(format!(
                "Unable to parse native adm: {}",
                adm
            )));
            return None;
        }
    };

    adm_node.get(NATIVE_KEY).map(Value::to_string)
}

fn update_bid_ext(
    bid_ext: Option<&PubmaticBidExt>,
    bid_type: BidType,
    ext: Option<Map<String, Value>>,
) -> Map<String, Value> {
    let in_banner_video = bid_ext.is_some_and(PubmaticBidExt::is_in_banner_video);
    let media_type = if in_banner_video { BidType::Video } else { bid_type };

    let ext_bid_prebid = ExtBidPrebid {
        meta: ExtBidPrebidMeta {
            media_type: media_type.name().to_string(),
        },
        video: bid_ext
            .and_then(PubmaticBidExt::duration)
            .map(|duration| ExtBidPrebidVideo { duration }),
    };

    let mut ext = ext.unwrap_or_default();
    ext.insert(PREBID_KEY.to_string(), json!(ext_bid_prebid));
    ext
}

fn extract_igi(bid_response: Option<&BidResponse>) -> Option<Vec<ExtIgi>> {
    let configs = bid_response?.ext.as_ref()?.fledge_auction_configs.as_ref()?;

    let igs: Vec<ExtIgiIgs> = configs
        .iter()
        .map(|(impid, config)| ExtIgiIgs {
            impid: impid.clone(),
            config: config.clone(),
        })
        .collect();

    (!igs.is_empty()).then(|| vec![ExtIgi { igs }])
}
