// src/model/imp_ext.rs

use crate::model::request_ext::PubmaticWrapper;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// imp.ext 的解析结果：bidder 参数、data、ae、gpid
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PubmaticBidderImpExt {
    #[serde(
        default,
        deserialize_with = "object_only",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidder: Option<ExtImpPubmatic>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ae: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpid: Option<String>,
}

/// imp.ext.bidder，PubMatic 的广告位级参数
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtImpPubmatic {
    #[serde(default, rename = "publisherId", skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,

    #[serde(default, rename = "adSlot", skip_serializing_if = "Option::is_none")]
    pub ad_slot: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dctr: Option<String>,

    #[serde(default, rename = "pmzoneid", skip_serializing_if = "Option::is_none")]
    pub pm_zone_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "object_only",
        skip_serializing_if = "Option::is_none"
    )]
    pub wrapper: Option<PubmaticWrapper>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<ExtImpPubmaticKeyVal>>,

    /// 广告位底价，字符串形式；数字也接受
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub kadfloor: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtImpPubmaticKeyVal {
    pub key: String,
    #[serde(default)]
    pub value: Vec<String>,
}

impl ExtImpPubmaticKeyVal {
    pub fn of(key: &str, value: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            value: value.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// imp.ext.data.adserver
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PubmaticExtDataAdServer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub adslot: Option<String>,
}

/// 只接受 JSON 对象；派生的结构体反序列化会按位置接受数组
fn object_only<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Null) | None => Ok(None),
        Some(object @ Value::Object(_)) => serde_json::from_value(object)
            .map(Some)
            .map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!(
            "invalid type: {}, expected an object",
            other
        ))),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(D::Error::custom(format!(
            "invalid type: {}, expected a string",
            other
        ))),
    }
}
