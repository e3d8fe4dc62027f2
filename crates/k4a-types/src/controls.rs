//! 彩色相机控制项
//!
//! 曝光、白平衡、增益、亮度等控制命令，以及录制工具使用的默认值和取值范围。

use crate::ConfigError;

/// 彩色相机控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorControlCommand {
    /// 曝光时间（微秒）
    ExposureTimeAbsolute = 0,
    AutoExposurePriority = 1,
    Brightness = 2,
    Contrast = 3,
    Saturation = 4,
    Sharpness = 5,
    /// 白平衡（开尔文）
    Whitebalance = 6,
    BacklightCompensation = 7,
    Gain = 8,
    PowerlineFrequency = 9,
}

impl ColorControlCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ColorControlCommand::ExposureTimeAbsolute => "exposure",
            ColorControlCommand::AutoExposurePriority => "auto exposure priority",
            ColorControlCommand::Brightness => "brightness",
            ColorControlCommand::Contrast => "contrast",
            ColorControlCommand::Saturation => "saturation",
            ColorControlCommand::Sharpness => "sharpness",
            ColorControlCommand::Whitebalance => "white balance",
            ColorControlCommand::BacklightCompensation => "backlight compensation",
            ColorControlCommand::Gain => "gain",
            ColorControlCommand::PowerlineFrequency => "powerline frequency",
        }
    }
}

/// 控制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorControlMode {
    Auto = 0,
    Manual = 1,
}

// ============================================================================
// 默认值（与录制工具的历史行为保持一致）
// ============================================================================

/// 自动白平衡时随命令一起下发的值（自动模式下相机忽略该值）
pub const DEFAULT_WHITEBALANCE: i32 = 4500;
pub const DEFAULT_BRIGHTNESS: i32 = 50;
pub const DEFAULT_CONTRAST: i32 = 50;
pub const DEFAULT_SATURATION: i32 = 50;
pub const DEFAULT_SHARPNESS: i32 = 50;

// ============================================================================
// 取值范围
// ============================================================================

/// 闭区间取值范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub name: &'static str,
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    pub const fn new(name: &'static str, min: i64, max: i64) -> Self {
        Self { name, min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// 校验数值，超出范围时返回 [`ConfigError::OutOfRange`]
    pub fn check(&self, value: i64) -> Result<i64, ConfigError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(ConfigError::OutOfRange {
                name: self.name,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const DEVICE_INDEX_RANGE: ValueRange = ValueRange::new("Device index", 0, 255);
pub const EXPOSURE_RANGE: ValueRange = ValueRange::new("Exposure", 100, 409_500);
pub const BRIGHTNESS_RANGE: ValueRange = ValueRange::new("Brightness", 0, 100);
pub const CONTRAST_RANGE: ValueRange = ValueRange::new("Contrast", 0, 100);
pub const SATURATION_RANGE: ValueRange = ValueRange::new("Saturation", 0, 100);
pub const SHARPNESS_RANGE: ValueRange = ValueRange::new("Sharpness", 0, 100);
pub const WHITEBALANCE_RANGE: ValueRange = ValueRange::new("White balance", 2000, 11_000);
pub const GAIN_RANGE: ValueRange = ValueRange::new("Gain", 1, 255);

/// 非负校验（录制时长、同步延迟）
pub fn check_non_negative(name: &'static str, value: i64) -> Result<i64, ConfigError> {
    if value < 0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(value)
}

/// 录制时要下发的彩色相机设置
///
/// `None` 表示交给相机自动控制（增益为保持设备当前值）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorSettings {
    /// 手动曝光时间（微秒）
    pub exposure_usec: Option<i32>,
    /// 手动白平衡（开尔文）
    pub whitebalance: Option<i32>,
    pub gain: Option<i32>,
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub sharpness: i32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            exposure_usec: None,
            whitebalance: None,
            gain: None,
            brightness: DEFAULT_BRIGHTNESS,
            contrast: DEFAULT_CONTRAST,
            saturation: DEFAULT_SATURATION,
            sharpness: DEFAULT_SHARPNESS,
        }
    }
}

impl ColorSettings {
    /// 校验所有数值是否在相机允许范围内
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(exposure) = self.exposure_usec {
            EXPOSURE_RANGE.check(exposure.into())?;
        }
        if let Some(whitebalance) = self.whitebalance {
            WHITEBALANCE_RANGE.check(whitebalance.into())?;
        }
        if let Some(gain) = self.gain {
            GAIN_RANGE.check(gain.into())?;
        }
        BRIGHTNESS_RANGE.check(self.brightness.into())?;
        CONTRAST_RANGE.check(self.contrast.into())?;
        SATURATION_RANGE.check(self.saturation.into())?;
        SHARPNESS_RANGE.check(self.sharpness.into())?;
        Ok(())
    }

    /// 展开为 SDK 控制命令序列（按下发顺序）
    pub fn commands(&self) -> Vec<(ColorControlCommand, ColorControlMode, i32)> {
        let mut commands = Vec::with_capacity(7);

        match self.exposure_usec {
            Some(value) => commands.push((
                ColorControlCommand::ExposureTimeAbsolute,
                ColorControlMode::Manual,
                value,
            )),
            None => commands.push((
                ColorControlCommand::ExposureTimeAbsolute,
                ColorControlMode::Auto,
                0,
            )),
        }

        match self.whitebalance {
            Some(value) => commands.push((
                ColorControlCommand::Whitebalance,
                ColorControlMode::Manual,
                value,
            )),
            None => commands.push((
                ColorControlCommand::Whitebalance,
                ColorControlMode::Auto,
                DEFAULT_WHITEBALANCE,
            )),
        }

        if let Some(gain) = self.gain {
            commands.push((ColorControlCommand::Gain, ColorControlMode::Manual, gain));
        }

        commands.push((
            ColorControlCommand::Brightness,
            ColorControlMode::Manual,
            self.brightness,
        ));
        commands.push((
            ColorControlCommand::Contrast,
            ColorControlMode::Manual,
            self.contrast,
        ));
        commands.push((
            ColorControlCommand::Saturation,
            ColorControlMode::Manual,
            self.saturation,
        ));
        commands.push((
            ColorControlCommand::Sharpness,
            ColorControlMode::Manual,
            self.sharpness,
        ));

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_bounds() {
        assert!(EXPOSURE_RANGE.contains(100));
        assert!(EXPOSURE_RANGE.contains(409_500));
        assert!(!EXPOSURE_RANGE.contains(99));
        assert!(!EXPOSURE_RANGE.contains(409_501));

        assert!(GAIN_RANGE.check(0).is_err());
        assert_eq!(GAIN_RANGE.check(255), Ok(255));
        assert!(DEVICE_INDEX_RANGE.check(256).is_err());
    }

    #[test]
    fn test_out_of_range_message_uses_real_bounds() {
        let err = WHITEBALANCE_RANGE.check(1999).unwrap_err();
        assert_eq!(err.to_string(), "White balance value must be between 2000 and 11000.");

        let err = GAIN_RANGE.check(0).unwrap_err();
        assert_eq!(err.to_string(), "Gain value must be between 1 and 255.");
    }

    #[test]
    fn test_check_non_negative() {
        assert_eq!(check_non_negative("Recording length", 0), Ok(0));
        assert!(check_non_negative("Recording length", -5).is_err());
    }

    #[test]
    fn test_default_settings_commands() {
        let settings = ColorSettings::default();
        assert!(settings.validate().is_ok());

        let commands = settings.commands();
        assert_eq!(commands.len(), 6); // 未设置增益
        assert_eq!(
            commands[0],
            (ColorControlCommand::ExposureTimeAbsolute, ColorControlMode::Auto, 0)
        );
        assert_eq!(
            commands[1],
            (ColorControlCommand::Whitebalance, ColorControlMode::Auto, DEFAULT_WHITEBALANCE)
        );
        assert!(commands.contains(&(
            ColorControlCommand::Brightness,
            ColorControlMode::Manual,
            DEFAULT_BRIGHTNESS
        )));
    }

    #[test]
    fn test_manual_settings_commands() {
        let settings = ColorSettings {
            exposure_usec: Some(8330),
            whitebalance: Some(DEFAULT_WHITEBALANCE),
            gain: Some(128),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        let commands = settings.commands();
        assert_eq!(commands.len(), 7);
        assert_eq!(
            commands[0],
            (ColorControlCommand::ExposureTimeAbsolute, ColorControlMode::Manual, 8330)
        );
        assert_eq!(
            commands[2],
            (ColorControlCommand::Gain, ColorControlMode::Manual, 128)
        );
    }

    #[test]
    fn test_invalid_settings() {
        let settings = ColorSettings {
            sharpness: 101,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange { name: "Sharpness", .. })
        ));
    }
}
