// src/bidding/keywords.rs

use crate::model::imp_ext::{ExtImpPubmatic, PubmaticBidderImpExt, PubmaticExtDataAdServer};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const DCTR_KEY_NAME: &str = "key_val";
pub const PM_ZONE_ID_KEY_NAME: &str = "pmZoneId";
pub const PM_ZONE_ID_OLD_KEY_NAME: &str = "pmZoneID";
pub const IMP_EXT_AD_UNIT_KEY: &str = "dfp_ad_unit_code";
const AD_SERVER_GAM: &str = "gam";
const AE_KEY: &str = "ae";
const GPID_KEY: &str = "gpid";
const IMP_EXT_PBADSLOT: &str = "pbadslot";
const IMP_EXT_ADSERVER: &str = "adserver";

/// imp.ext.data 中不参与 dctr 拼接的保留字段
static RESERVED_DATA_KEYS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from([IMP_EXT_PBADSLOT, IMP_EXT_ADSERVER]));

/// 组装交易所的 keywords（即转发 imp 的 ext）。
/// 写入顺序决定覆盖关系：显式 keywords -> pmZoneId -> key_val -> dfp_ad_unit_code -> ae/gpid
pub fn make_keywords(imp_ext: &PubmaticBidderImpExt) -> Map<String, Value> {
    let mut keywords = Map::new();
    let default_bidder = ExtImpPubmatic::default();
    let bidder = imp_ext.bidder.as_ref().unwrap_or(&default_bidder);

    put_bidder_keywords(&mut keywords, bidder);
    put_ext_data_keywords(&mut keywords, imp_ext.data.as_ref(), bidder.dctr.as_deref());

    if let Some(ae) = imp_ext.ae {
        keywords.insert(AE_KEY.to_string(), Value::from(ae));
    }
    if let Some(gpid) = &imp_ext.gpid {
        keywords.insert(GPID_KEY.to_string(), Value::String(gpid.clone()));
    }

    keywords
}

fn put_bidder_keywords(keywords: &mut Map<String, Value>, bidder: &ExtImpPubmatic) {
    for keyword in bidder.keywords.iter().flatten() {
        if keyword.value.is_empty() {
            continue;
        }
        keywords.insert(keyword.key.clone(), Value::String(keyword.value.join(",")));
    }

    let legacy_zone_id = keywords.shift_remove(PM_ZONE_ID_OLD_KEY_NAME);
    match bidder.pm_zone_id.as_deref() {
        Some(zone_id) if !zone_id.is_empty() => {
            keywords.insert(PM_ZONE_ID_KEY_NAME.to_string(), Value::String(zone_id.to_string()));
        }
        _ => {
            if let Some(zone_id) = legacy_zone_id {
                keywords.insert(PM_ZONE_ID_KEY_NAME.to_string(), zone_id);
            }
        }
    }
}

fn put_ext_data_keywords(
    keywords: &mut Map<String, Value>,
    data: Option<&Map<String, Value>>,
    dctr: Option<&str>,
) {
    if let Some(dctr) = extract_dctr(dctr, data).filter(|dctr| !dctr.is_empty()) {
        keywords.insert(DCTR_KEY_NAME.to_string(), Value::String(dctr));
    }

    if let Some(ad_unit) = extract_ad_unit_code(data).filter(|code| !code.is_empty()) {
        keywords.insert(IMP_EXT_AD_UNIT_KEY.to_string(), Value::String(ad_unit));
    }
}

/// dctr + data 中的非保留字段，`|` 分隔，每段为 `key=value`
pub fn extract_dctr(dctr: Option<&str>, data: Option<&Map<String, Value>>) -> Option<String> {
    let Some(data) = data else {
        return dctr.map(str::to_string);
    };

    let parts: Vec<String> = dctr
        .map(str::to_string)
        .into_iter()
        .chain(
            data.iter()
                .filter(|(key, _)| !RESERVED_DATA_KEYS.contains(key.as_str()))
                .filter_map(|(key, value)| build_dctr_part(key, value)),
        )
        .collect();

    Some(parts.join("|"))
}

fn build_dctr_part(key: &str, value: &Value) -> Option<String> {
    let value_part = match value {
        Value::Object(_) => return None,
        Value::Array(items) => items
            .iter()
            .map(|item| as_text(item).trim().to_string())
            .collect::<Vec<_>>()
            .join(","),
        scalar => as_text(scalar).trim().to_string(),
    };

    Some(format!("{}={}", key.trim(), value_part))
}

/// adserver.name == "gam" 时取 adserver.adslot，否则回退到 pbadslot
pub fn extract_ad_unit_code(data: Option<&Map<String, Value>>) -> Option<String> {
    let data = data?;

    let ad_server = data
        .get(IMP_EXT_ADSERVER)
        .and_then(|node| serde_json::from_value::<PubmaticExtDataAdServer>(node.clone()).ok());

    if let Some(PubmaticExtDataAdServer {
        name: Some(name),
        adslot: Some(adslot),
    }) = ad_server
    {
        if name == AD_SERVER_GAM && !adslot.is_empty() {
            return Some(adslot);
        }
    }

    data.get(IMP_EXT_PBADSLOT).map(as_text)
}

/// JSON 节点的文本形式：字符串取原值，数字/布尔转字符串，容器节点为空串
pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(_) | Value::Object(_) => String::new(),
    }
}
