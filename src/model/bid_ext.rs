// src/model/bid_ext.rs

use serde::{Deserialize, Serialize};

/// PubMatic bid.ext 中适配器关心的字段
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PubmaticBidExt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoCreativeInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebiddealpriority: Option<i32>,

    /// 实际出价的 seat（alternate bidder code）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,

    /// in-banner video
    #[serde(default, rename = "ibv", skip_serializing_if = "Option::is_none")]
    pub in_banner_video: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VideoCreativeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
}

/// 注入到 bid.ext.prebid 的元数据
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExtBidPrebid {
    pub meta: ExtBidPrebidMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<ExtBidPrebidVideo>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExtBidPrebidMeta {
    #[serde(rename = "mediaType")]
    pub media_type: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExtBidPrebidVideo {
    pub duration: i32,
}

impl PubmaticBidExt {
    pub fn duration(&self) -> Option<i32> {
        self.video.as_ref().and_then(|video| video.duration)
    }

    pub fn is_in_banner_video(&self) -> bool {
        self.in_banner_video.unwrap_or(false)
    }
}
