//! 输入验证模块
//!
//! 枚举型选项（彩色模式、深度模式、帧率、IMU、同步模式）按不区分大小写的方式匹配，
//! 命令行和配置文件共用同一套解析。

use k4a_types::{ColorResolution, DepthMode, FrameRate, ImageFormat, WiredSyncMode};
use std::cmp::Ordering;
use thiserror::Error;

/// 不区分大小写的字符串比较
///
/// 结果与逐字节比较两个 ASCII 小写化后的字符串一致，较短的前缀排在前面。
pub fn string_compare(s1: &str, s2: &str) -> Ordering {
    s1.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(s2.bytes().map(|c| c.to_ascii_lowercase()))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {what} specified: {value}")]
pub struct UnknownValue {
    pub what: &'static str,
    pub value: String,
}

fn lookup<T: Copy>(
    table: &[(&str, T)],
    what: &'static str,
    value: &str,
) -> Result<T, UnknownValue> {
    table
        .iter()
        .find(|(name, _)| string_compare(value, name) == Ordering::Equal)
        .map(|&(_, parsed)| parsed)
        .ok_or_else(|| UnknownValue {
            what,
            value: value.to_string(),
        })
}

const COLOR_MODES: &[(&str, (ColorResolution, ImageFormat))] = &[
    ("3072p", (ColorResolution::R3072p, ImageFormat::ColorMjpg)),
    ("2160p", (ColorResolution::R2160p, ImageFormat::ColorMjpg)),
    ("1536p", (ColorResolution::R1536p, ImageFormat::ColorMjpg)),
    ("1440p", (ColorResolution::R1440p, ImageFormat::ColorMjpg)),
    ("1080p", (ColorResolution::R1080p, ImageFormat::ColorMjpg)),
    ("720p", (ColorResolution::R720p, ImageFormat::ColorMjpg)),
    ("720p_NV12", (ColorResolution::R720p, ImageFormat::ColorNv12)),
    ("720p_YUY2", (ColorResolution::R720p, ImageFormat::ColorYuy2)),
    ("off", (ColorResolution::Off, ImageFormat::ColorMjpg)),
];

const DEPTH_MODES: &[(&str, DepthMode)] = &[
    ("NFOV_2X2BINNED", DepthMode::NfovBinned2x2),
    ("NFOV_UNBINNED", DepthMode::NfovUnbinned),
    ("WFOV_2X2BINNED", DepthMode::WfovBinned2x2),
    ("WFOV_UNBINNED", DepthMode::WfovUnbinned),
    ("PASSIVE_IR", DepthMode::PassiveIr),
    ("off", DepthMode::Off),
];

const FRAME_RATES: &[(&str, FrameRate)] = &[
    ("30", FrameRate::Fps30),
    ("25", FrameRate::Fps25),
    ("15", FrameRate::Fps15),
    ("5", FrameRate::Fps5),
];

const IMU_MODES: &[(&str, bool)] = &[("on", true), ("off", false)];

const SYNC_MODES: &[(&str, WiredSyncMode)] = &[
    ("master", WiredSyncMode::Master),
    ("subordinate", WiredSyncMode::Subordinate),
    ("sub", WiredSyncMode::Subordinate),
    ("standalone", WiredSyncMode::Standalone),
];

/// 彩色模式 → (分辨率, 像素格式)
pub fn parse_color_mode(value: &str) -> Result<(ColorResolution, ImageFormat), UnknownValue> {
    lookup(COLOR_MODES, "color mode", value)
}

pub fn parse_depth_mode(value: &str) -> Result<DepthMode, UnknownValue> {
    lookup(DEPTH_MODES, "depth mode", value)
}

pub fn parse_frame_rate(value: &str) -> Result<FrameRate, UnknownValue> {
    lookup(FRAME_RATES, "frame rate", value)
}

/// `ON` / `OFF`
pub fn parse_imu_mode(value: &str) -> Result<bool, UnknownValue> {
    lookup(IMU_MODES, "imu mode", value)
}

pub fn parse_sync_mode(value: &str) -> Result<WiredSyncMode, UnknownValue> {
    lookup(SYNC_MODES, "external sync mode", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_string_compare_basic() {
        assert_eq!(string_compare("720p_nv12", "720P_NV12"), Ordering::Equal);
        assert_eq!(string_compare("OFF", "off"), Ordering::Equal);
        assert_eq!(string_compare("720p", "720p_NV12"), Ordering::Less);
        assert_eq!(string_compare("sub", "subordinate"), Ordering::Less);
        assert_eq!(string_compare("b", "A"), Ordering::Greater);
        assert_eq!(string_compare("", ""), Ordering::Equal);
        assert_eq!(string_compare("", "x"), Ordering::Less);
    }

    #[test]
    fn test_parse_color_mode() {
        assert_eq!(
            parse_color_mode("1080P"),
            Ok((ColorResolution::R1080p, ImageFormat::ColorMjpg))
        );
        assert_eq!(
            parse_color_mode("720p_yuy2"),
            Ok((ColorResolution::R720p, ImageFormat::ColorYuy2))
        );
        assert_eq!(
            parse_color_mode("Off"),
            Ok((ColorResolution::Off, ImageFormat::ColorMjpg))
        );

        let err = parse_color_mode("4k").unwrap_err();
        assert_eq!(err.to_string(), "Unknown color mode specified: 4k");
    }

    #[test]
    fn test_parse_depth_mode() {
        assert_eq!(parse_depth_mode("wfov_unbinned"), Ok(DepthMode::WfovUnbinned));
        assert_eq!(parse_depth_mode("Passive_IR"), Ok(DepthMode::PassiveIr));
        assert_eq!(
            parse_depth_mode("NFOV").unwrap_err().to_string(),
            "Unknown depth mode specified: NFOV"
        );
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25"), Ok(FrameRate::Fps25));
        assert_eq!(parse_frame_rate("5"), Ok(FrameRate::Fps5));
        assert!(parse_frame_rate("60").is_err());
        assert!(parse_frame_rate("30fps").is_err());
    }

    #[test]
    fn test_parse_imu_and_sync() {
        assert_eq!(parse_imu_mode("ON"), Ok(true));
        assert_eq!(parse_imu_mode("off"), Ok(false));
        assert_eq!(
            parse_imu_mode("yes").unwrap_err().to_string(),
            "Unknown imu mode specified: yes"
        );

        assert_eq!(parse_sync_mode("Sub"), Ok(WiredSyncMode::Subordinate));
        assert_eq!(parse_sync_mode("SUBORDINATE"), Ok(WiredSyncMode::Subordinate));
        assert_eq!(parse_sync_mode("Master"), Ok(WiredSyncMode::Master));
        assert_eq!(parse_sync_mode("standalone"), Ok(WiredSyncMode::Standalone));
        assert!(parse_sync_mode("slave").is_err());
    }

    proptest! {
        #[test]
        fn prop_matches_lowercased_comparison(a in "[a-zA-Z0-9_]{0,12}", b in "[a-zA-Z0-9_]{0,12}") {
            prop_assert_eq!(
                string_compare(&a, &b),
                a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase())
            );
        }

        #[test]
        fn prop_case_changes_compare_equal(s in "[a-zA-Z0-9_]{0,16}") {
            prop_assert_eq!(string_compare(&s, &s.to_ascii_uppercase()), Ordering::Equal);
            prop_assert_eq!(string_compare(&s.to_ascii_lowercase(), &s), Ordering::Equal);
        }

        #[test]
        fn prop_antisymmetric(a in ".{0,8}", b in ".{0,8}") {
            prop_assert_eq!(string_compare(&a, &b), string_compare(&b, &a).reverse());
        }
    }
}
