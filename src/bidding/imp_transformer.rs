// src/bidding/imp_transformer.rs

use crate::bidding::ad_slot::parse_ad_slot;
use crate::bidding::keywords::{as_text, make_keywords};
use crate::model::error::BidderError;
use crate::model::imp_ext::{ExtImpPubmatic, PubmaticBidderImpExt};
use crate::openrtb::request::{App, Banner, Imp};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// app 扩展中声明的 SDK 来源与版本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayManager {
    pub source: String,
    pub version: String,
}

/// 优先 app.ext.prebid.{source,version}，其次 app.ext.{source,version}；
/// 两个字段都非空白才算有效
pub fn extract_display_manager(app: Option<&App>) -> Option<DisplayManager> {
    let app_ext = app?.ext.as_ref()?;

    let from_prebid = app_ext
        .get("prebid")
        .and_then(Value::as_object)
        .and_then(|prebid| {
            display_manager_of(
                prebid.get("source").and_then(Value::as_str).map(str::to_string),
                prebid.get("version").and_then(Value::as_str).map(str::to_string),
            )
        });

    from_prebid.or_else(|| {
        display_manager_of(
            scalar_property(app_ext, "source"),
            scalar_property(app_ext, "version"),
        )
    })
}

fn display_manager_of(source: Option<String>, version: Option<String>) -> Option<DisplayManager> {
    match (source, version) {
        (Some(source), Some(version)) if !is_blank(&source) && !is_blank(&version) => {
            Some(DisplayManager { source, version })
        }
        _ => None,
    }
}

fn scalar_property(ext: &Map<String, Value>, name: &str) -> Option<String> {
    ext.get(name)
        .filter(|value| !value.is_array() && !value.is_object())
        .map(as_text)
}

/// imp.ext 解析为 PubMatic 扩展；缺失时按空扩展处理
pub fn parse_imp_ext(imp: &Imp) -> Result<PubmaticBidderImpExt, BidderError> {
    match &imp.ext {
        None => Ok(PubmaticBidderImpExt::default()),
        Some(ext) => serde_json::from_value(Value::Object(ext.clone()))
            .map_err(|e| BidderError::bad_input(e.to_string())),
    }
}

pub fn validate_media_type(imp: &Imp) -> Result<(), BidderError> {
    if imp.has_supported_media_type() {
        return Ok(());
    }

    Err(BidderError::bad_input(format!(
        "Invalid MediaType. PubMatic only supports Banner, Video and Native. Ignoring ImpID={}",
        imp.id
    )))
}

/// 生成发往交易所的 imp：banner 尺寸补全、去掉 audio、底价、display manager、tagid、keywords
pub fn transform_imp(
    imp: &Imp,
    imp_ext: &PubmaticBidderImpExt,
    display_manager: Option<&DisplayManager>,
) -> Result<Imp, BidderError> {
    let default_bidder = ExtImpPubmatic::default();
    let bidder = imp_ext.bidder.as_ref().unwrap_or(&default_bidder);
    let keywords = make_keywords(imp_ext);

    let mut transformed = imp.clone();

    transformed.banner = match &imp.banner {
        Some(banner) if is_valid_banner(banner) => Some(assign_sizes_if_missing(banner)?),
        _ => None,
    };
    transformed.audio = None;
    transformed.bidfloor = resolve_bid_floor(bidder.kadfloor.as_deref(), imp.bidfloor);
    transformed.displaymanager = first_non_blank(
        imp.displaymanager.as_deref(),
        display_manager.map(|dm| dm.source.as_str()),
    );
    transformed.displaymanagerver = first_non_blank(
        imp.displaymanagerver.as_deref(),
        display_manager.map(|dm| dm.version.as_str()),
    );
    transformed.ext = (!keywords.is_empty()).then_some(keywords);

    if let Some(ad_slot) = parse_ad_slot(bidder.ad_slot.as_deref(), imp.banner.is_some())? {
        transformed.tagid = Some(ad_slot.tag_id);

        // adSlot 尺寸作用在原始 banner 上
        if let (Some(size), Some(banner)) = (ad_slot.size, &imp.banner) {
            transformed.banner = Some(Banner {
                w: size.w,
                h: size.h,
                ..banner.clone()
            });
        }
    }

    Ok(transformed)
}

fn is_valid_banner(banner: &Banner) -> bool {
    banner.w.is_some() || banner.h.is_some() || !banner.formats().is_empty()
}

fn assign_sizes_if_missing(banner: &Banner) -> Result<Banner, BidderError> {
    if banner.w.is_some() && banner.h.is_some() {
        return Ok(banner.clone());
    }

    let first_format = banner.formats().first().ok_or_else(|| {
        BidderError::bad_input("Banner width and height is not provided, but required")
    })?;

    Ok(Banner {
        w: first_format.w,
        h: first_format.h,
        ..banner.clone()
    })
}

/// kadfloor 与原底价取较大者；kadfloor 无法解析时忽略
pub fn resolve_bid_floor(kadfloor: Option<&str>, existing: Option<Decimal>) -> Option<Decimal> {
    let kadfloor = kadfloor.and_then(parse_kadfloor);

    match (kadfloor, existing) {
        (Some(kadfloor), Some(existing)) => Some(kadfloor.max(existing)),
        (kadfloor, existing) => kadfloor.or(existing),
    }
}

fn parse_kadfloor(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

fn first_non_blank(first: Option<&str>, second: Option<&str>) -> Option<String> {
    [first, second]
        .into_iter()
        .flatten()
        .find(|value| !is_blank(value))
        .map(str::to_string)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
