// src/bidding/ad_slot.rs

use crate::model::error::BidderError;

/// adSlot 解析结果：`TAGID` 或 `TAGID@WIDTHxHEIGHT[:extra]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAdSlot {
    pub tag_id: String,
    /// 只有 imp 带 banner 且 adSlot 带尺寸时才有值
    pub size: Option<SlotSize>,
}

/// 0 视为未设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSize {
    pub w: Option<i32>,
    pub h: Option<i32>,
}

/// 解析 adSlot。空白字符串返回 Ok(None)，格式错误返回 bad input。
pub fn parse_ad_slot(
    ad_slot: Option<&str>,
    has_banner: bool,
) -> Result<Option<ParsedAdSlot>, BidderError> {
    let raw = ad_slot.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if !trimmed.contains('@') {
        return Ok(Some(ParsedAdSlot {
            tag_id: trimmed.to_string(),
            size: None,
        }));
    }

    let params = split_dropping_trailing_empty(trimmed, '@');
    let (tag_id, size_param) = match params.as_slice() {
        [tag_id, size_param] if !tag_id.trim().is_empty() && !size_param.trim().is_empty() => {
            (tag_id.trim(), size_param.trim())
        }
        _ => {
            return Err(BidderError::bad_input(format!(
                "Invalid adSlot '{}'",
                trimmed
            )))
        }
    };

    if !has_banner {
        return Ok(Some(ParsedAdSlot {
            tag_id: tag_id.to_string(),
            size: None,
        }));
    }

    let lowered = size_param.to_lowercase();
    let dimensions = split_dropping_trailing_empty(&lowered, 'x');
    let [width, height] = dimensions.as_slice() else {
        return Err(BidderError::bad_input(format!(
            "Invalid size provided in adSlot '{}'",
            trimmed
        )));
    };

    let width = parse_dimension(width, "width", raw)?;
    let height = parse_dimension(
        height.split(':').next().unwrap_or_default(),
        "height",
        raw,
    )?;

    Ok(Some(ParsedAdSlot {
        tag_id: tag_id.to_string(),
        size: Some(SlotSize {
            w: non_zero(width),
            h: non_zero(height),
        }),
    }))
}

fn parse_dimension(number: &str, name: &str, ad_slot: &str) -> Result<i32, BidderError> {
    number.trim().parse::<i32>().map_err(|_| {
        BidderError::bad_input(format!("Invalid {} provided in adSlot '{}'", name, ad_slot))
    })
}

fn non_zero(value: i32) -> Option<i32> {
    (value != 0).then_some(value)
}

// 丢弃末尾的空片段，至少保留一段
fn split_dropping_trailing_empty(text: &str, separator: char) -> Vec<&str> {
    let mut parts: Vec<&str> = text.split(separator).collect();
    while parts.len() > 1 && parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(ad_slot: &str) -> Result<Option<ParsedAdSlot>, BidderError> {
        parse_ad_slot(Some(ad_slot), true)
    }

    #[test]
    fn blank_slot_is_a_no_op() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse_ad_slot(None, true).unwrap(), None);
    }

    #[test]
    fn slot_without_at_sign_is_the_tag_id() {
        let slot = parse(" adSlot ").unwrap().unwrap();
        assert_eq!(slot.tag_id, "adSlot");
        assert_eq!(slot.size, None);
    }

    #[test]
    fn slot_with_size_sets_tag_and_dimensions() {
        let slot = parse("slot@300x250").unwrap().unwrap();
        assert_eq!(slot.tag_id, "slot");
        assert_eq!(slot.size, Some(SlotSize { w: Some(300), h: Some(250) }));
    }

    #[test]
    fn height_suffix_after_colon_is_ignored() {
        let slot = parse("slot@728X90:1").unwrap().unwrap();
        assert_eq!(slot.size, Some(SlotSize { w: Some(728), h: Some(90) }));
    }

    #[test]
    fn zero_dimension_is_unset() {
        let slot = parse("slot@0x250").unwrap().unwrap();
        assert_eq!(slot.size, Some(SlotSize { w: None, h: Some(250) }));
    }

    #[test]
    fn sizes_are_skipped_without_banner() {
        let slot = parse_ad_slot(Some("slot@300x250"), false).unwrap().unwrap();
        assert_eq!(slot.tag_id, "slot");
        assert_eq!(slot.size, None);
    }

    #[test]
    fn missing_part_is_invalid() {
        assert_eq!(
            parse("invalid ad slot@").unwrap_err(),
            BidderError::bad_input("Invalid adSlot 'invalid ad slot@'")
        );
        assert_eq!(
            parse("@300x250").unwrap_err(),
            BidderError::bad_input("Invalid adSlot '@300x250'")
        );
        assert_eq!(
            parse("a@b@c").unwrap_err(),
            BidderError::bad_input("Invalid adSlot 'a@b@c'")
        );
    }

    #[test]
    fn wrong_segment_count_is_invalid_size() {
        assert_eq!(
            parse("slot@300x200x100").unwrap_err(),
            BidderError::bad_input("Invalid size provided in adSlot 'slot@300x200x100'")
        );
        assert_eq!(
            parse("slot@300").unwrap_err(),
            BidderError::bad_input("Invalid size provided in adSlot 'slot@300'")
        );
    }

    #[test]
    fn non_numeric_dimensions_name_the_field() {
        assert_eq!(
            parse("slot@widthx200").unwrap_err(),
            BidderError::bad_input("Invalid width provided in adSlot 'slot@widthx200'")
        );
        assert_eq!(
            parse("slot@300xHeight:1").unwrap_err(),
            BidderError::bad_input("Invalid height provided in adSlot 'slot@300xHeight:1'")
        );
    }

    #[test]
    fn x_in_suffix_is_an_extra_size_segment() {
        assert_eq!(
            parse("slot@300x250:extra").unwrap_err(),
            BidderError::bad_input("Invalid size provided in adSlot 'slot@300x250:extra'")
        );
    }

    proptest! {
        #[test]
        fn well_formed_slots_parse(
            tag in "[a-zA-Z0-9_/]{1,20}",
            w in 1i32..4000,
            h in 1i32..4000,
            upper in any::<bool>(),
            suffix in "[a-wyz0-9]{0,8}",
        ) {
            let separator = if upper { "X" } else { "x" };
            let raw = format!("{}@{}{}{}:{}", tag, w, separator, h, suffix);
            let slot = parse(&raw).unwrap().unwrap();
            prop_assert_eq!(slot.tag_id, tag);
            prop_assert_eq!(slot.size, Some(SlotSize { w: Some(w), h: Some(h) }));
        }

        #[test]
        fn slots_without_at_sign_never_fail(raw in "[^@]{0,40}") {
            let parsed = parse(&raw).unwrap();
            match parsed {
                None => prop_assert!(raw.trim().is_empty()),
                Some(slot) => prop_assert_eq!(slot.tag_id, raw.trim()),
            }
        }
    }
}
