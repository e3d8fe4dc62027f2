//! # K4A Types
//!
//! 深度相机 SDK 的配置与数值类型定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `config`: 图像格式、分辨率、深度模式、帧率、同步模式与设备配置
//! - `controls`: 彩色相机控制项（曝光、白平衡、增益等）及取值范围
//! - `version`: 固件/硬件版本信息
//! - `imu`: IMU 采样
//!
//! ## 数值约定
//!
//! 所有枚举的判别值与 SDK C 头文件保持一致，FFI 层可以直接 `as` 转换。

pub mod config;
pub mod controls;
pub mod imu;
pub mod version;

// 重新导出常用类型
pub use config::*;
pub use controls::*;
pub use imu::ImuSample;
pub use version::{FirmwareBuild, FirmwareSignature, HardwareVersion, Version};

use thiserror::Error;

/// 配置层统一错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// 枚举值无法识别（通常来自 FFI 或配置文件）
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: u32 },

    /// 数值超出允许范围
    #[error("{name} value must be between {min} and {max}.")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// 数值必须为非负
    #[error("{name} must be positive")]
    Negative { name: &'static str, value: i64 },

    /// 当前相机模式不支持该帧率
    #[error("{0} Frames per second is not supported by this camera mode.")]
    UnsupportedFrameRate(u32),

    /// 主从同步延迟只在 Subordinate 模式下有效
    #[error("Subordinate delay off master is only valid in Subordinate sync mode")]
    SyncDelayRequiresSubordinate,

    /// 深度相对彩色的延迟必须小于一个帧周期
    #[error("Depth delay of {delay_usec}us must be less than one frame period ({period_usec}us)")]
    DepthDelayTooLarge { delay_usec: i32, period_usec: u32 },

    /// 彩色与深度都关闭时无法录制
    #[error("Either the color or depth modes must be enabled to record.")]
    NoStreamsEnabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::OutOfRange {
            name: "Brightness",
            value: 101,
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "Brightness value must be between 0 and 100.");

        let err = ConfigError::UnsupportedFrameRate(30);
        assert_eq!(
            err.to_string(),
            "30 Frames per second is not supported by this camera mode."
        );

        let err = ConfigError::Negative {
            name: "Recording length",
            value: -1,
        };
        assert_eq!(err.to_string(), "Recording length must be positive");
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            field: "DepthMode",
            value: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("DepthMode") && msg.contains("42"), "{}", msg);
    }
}
