use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// OpenRTB BidRequest 结构体。
/// 适配器关心的字段采用强类型，其余字段通过 `extra` 原样保留（保持原始顺序），
/// 这样转发给交易所的请求不会丢失任何上游字段。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidRequest {
    #[serde(default)]
    pub id: String,

    /// 广告展示请求列表
    #[serde(default)]
    pub imp: Vec<Imp>,

    /// 网站信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<Site>,

    /// 应用信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<App>,

    /// 请求级扩展（ext.prebid 等）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<ExtRequest>,

    // 其它字段（device/user/regs/source/tmax ...）原样透传
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// Imp 表示单个广告展示请求
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Imp {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,

    #[serde(default, rename = "native", skip_serializing_if = "Option::is_none")]
    pub native: Option<Native>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagid: Option<String>,

    /// 底价，十进制精度处理，序列化时仍输出 JSON 数字
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub bidfloor: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaymanager: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaymanagerver: Option<String>,

    /// imp.ext 保持原始 JSON 对象，由适配器自行解析
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Map<String, Value>>,

    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl Imp {
    /// 是否携带 PubMatic 支持的媒体类型（banner / video / native）
    pub fn has_supported_media_type(&self) -> bool {
        self.banner.is_some() || self.video.is_some() || self.native.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Banner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Vec<Format>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl Banner {
    pub fn formats(&self) -> &[Format] {
        self.format.as_deref().unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Format {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Video {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Audio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimes: Option<Vec<String>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Native {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// 网站信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Site {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// 应用信息
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct App {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    /// app.ext 保持原始 JSON，display manager 字段从这里读取
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<Map<String, Value>>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Publisher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// 请求级扩展 ext
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebid: Option<ExtRequestPrebid>,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl ExtRequest {
    pub fn is_empty(&self) -> bool {
        self.prebid.is_none() && self.extra.is_empty()
    }
}

/// ext.prebid
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtRequestPrebid {
    /// 各 bidder 的参数，按 bidder 名称索引，值保持原始 JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidderparams: Option<Map<String, Value>>,

    #[serde(
        default,
        alias = "alternateBidderCodes",
        skip_serializing_if = "Option::is_none"
    )]
    pub alternatebiddercodes: Option<ExtRequestPrebidAlternateBidderCodes>,

    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// ext.prebid.alternatebiddercodes
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtRequestPrebidAlternateBidderCodes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidders: Option<BTreeMap<String, ExtRequestPrebidAlternateBidderCodesBidder>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExtRequestPrebidAlternateBidderCodesBidder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowedbiddercodes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "id": "req-1",
            "imp": [{"id": "1", "banner": {"w": 300, "h": 250, "pos": 1}, "secure": 1}],
            "device": {"ua": "test-agent"},
            "tmax": 500
        });

        let request: BidRequest = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(request.imp[0].banner.as_ref().unwrap().w, Some(300));
        assert_eq!(request.extra.get("tmax"), Some(&json!(500)));

        assert_eq!(serde_json::to_value(&request).unwrap(), raw);
    }

    #[test]
    fn bidfloor_is_read_as_decimal_and_written_as_number() {
        let imp: Imp = serde_json::from_value(json!({"id": "1", "bidfloor": 12.5})).unwrap();
        assert_eq!(imp.bidfloor, Some(dec!(12.5)));

        let out = serde_json::to_value(&imp).unwrap();
        assert_eq!(out["bidfloor"], json!(12.5));
    }

    #[test]
    fn alternate_bidder_codes_accepts_camel_case_alias() {
        let prebid: ExtRequestPrebid = serde_json::from_value(json!({
            "alternateBidderCodes": {"enabled": true, "bidders": {"pubmatic": {"enabled": true}}}
        }))
        .unwrap();

        let codes = prebid.alternatebiddercodes.unwrap();
        assert_eq!(codes.enabled, Some(true));
        assert!(codes.bidders.unwrap().contains_key("pubmatic"));
    }
}
