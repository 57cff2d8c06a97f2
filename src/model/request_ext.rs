// src/model/request_ext.rs

use crate::model::error::BidderError;
use crate::openrtb::request::ExtRequestPrebid;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const WRAPPER_KEY: &str = "wrapper";
const ACAT_KEY: &str = "acat";
const ALL_BIDDERS_WILDCARD: &str = "*";
const ALL_BIDDERS: &str = "all";

/// PubMatic wrapper：profile + version，两者各自默认 0
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PubmaticWrapper {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub profile: i32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub version: i32,
}

impl PubmaticWrapper {
    pub fn of(profile: i32, version: i32) -> Self {
        Self { profile, version }
    }

    /// 按字段合并：已经非零的字段保持不变
    pub fn merge(self, other: PubmaticWrapper) -> Self {
        Self {
            profile: if self.profile == 0 { other.profile } else { self.profile },
            version: if self.version == 0 { other.version } else { self.version },
        }
    }
}

/// wrapper 字段既可以是整数也可以是数字字符串，其它类型按 0 处理；
/// 非数字字符串视为转换失败
pub fn coerce_wrapper_field(value: &Value) -> Result<i32, String> {
    match value {
        Value::String(text) => text
            .parse::<i32>()
            .map_err(|_| format!("For input string: \"{}\"", text)),
        Value::Number(number) => Ok(number
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .unwrap_or(0)),
        _ => Ok(0),
    }
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_wrapper_field(&value).map_err(de::Error::custom)
}

/// ext.marketplace
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PubmaticMarketplace {
    pub allowedbidders: Vec<String>,
}

/// 从请求级 ext.prebid 中提取出的 PubMatic 配置
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PubmaticExtRequest {
    pub wrapper: Option<PubmaticWrapper>,
    pub acat: Vec<String>,
    pub marketplace: Option<PubmaticMarketplace>,
}

impl PubmaticExtRequest {
    /// 解析 ext.prebid.bidderparams.<bidder> 以及 alternatebiddercodes
    pub fn from_prebid(
        prebid: Option<&ExtRequestPrebid>,
        bidder_name: &str,
    ) -> Result<Self, BidderError> {
        let Some(prebid) = prebid else {
            return Ok(Self::default());
        };

        let mut ext_request = Self::default();

        let bidder_params = prebid
            .bidderparams
            .as_ref()
            .and_then(|params| params.get(bidder_name));

        if let Some(params) = bidder_params {
            ext_request.wrapper = extract_wrapper(params.get(WRAPPER_KEY)).map_err(conversion_error)?;
            ext_request.acat = extract_acat(params.get(ACAT_KEY)).map_err(conversion_error)?;
        }

        ext_request.marketplace = resolve_allowed_bidder_codes(prebid, bidder_name)
            .map(|allowedbidders| PubmaticMarketplace { allowedbidders });

        Ok(ext_request)
    }
}

fn conversion_error(detail: String) -> BidderError {
    BidderError::bad_input(format!(
        "Error converting bidder params in Pubmatic extension: {}",
        detail
    ))
}

fn extract_wrapper(node: Option<&Value>) -> Result<Option<PubmaticWrapper>, String> {
    let object = match node {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(object)) => object,
        // 非对象的 wrapper 没有可用字段
        Some(_) => return Ok(Some(PubmaticWrapper::default())),
    };

    let mut wrapper = PubmaticWrapper::default();
    if let Some(profile) = object.get("profile") {
        wrapper.profile = coerce_wrapper_field(profile)?;
    }
    if let Some(version) = object.get("version") {
        wrapper.version = coerce_wrapper_field(version)?;
    }
    Ok(Some(wrapper))
}

fn extract_acat(node: Option<&Value>) -> Result<Vec<String>, String> {
    let Some(Value::Array(items)) = node else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(text) => Ok(text.trim().to_string()),
            Value::Null => Ok(String::new()),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            other => Err(format!("Cannot deserialize acat entry from {}", other)),
        })
        .collect()
}

/// alternatebiddercodes 开启且当前 bidder 开启时才返回允许的 bidder code 列表
pub fn resolve_allowed_bidder_codes(
    prebid: &ExtRequestPrebid,
    bidder_name: &str,
) -> Option<Vec<String>> {
    let alternate_codes = prebid.alternatebiddercodes.as_ref()?;
    if alternate_codes.enabled != Some(true) {
        return None;
    }

    let config = alternate_codes.bidders.as_ref()?.get(bidder_name)?;
    if config.enabled != Some(true) {
        return None;
    }

    match config.allowedbiddercodes.as_deref() {
        None => Some(vec![ALL_BIDDERS.to_string()]),
        Some([only]) if only == ALL_BIDDERS_WILDCARD => Some(vec![ALL_BIDDERS.to_string()]),
        Some(codes) => {
            let mut allowed = Vec::with_capacity(codes.len() + 1);
            allowed.push(bidder_name.to_string());
            allowed.extend(codes.iter().cloned());
            Some(allowed)
        }
    }
}
