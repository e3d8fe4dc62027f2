//! 固件版本信息

use std::fmt;

/// 单个组件的版本号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub iteration: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, iteration: u32) -> Self {
        Self {
            major,
            minor,
            iteration,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.iteration)
    }
}

/// 固件构建类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FirmwareBuild {
    #[default]
    Release = 0,
    Debug = 1,
}

/// 固件签名类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FirmwareSignature {
    #[default]
    Msft = 0,
    Test = 1,
    Unsigned = 2,
}

/// 设备硬件/固件版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardwareVersion {
    /// 彩色相机固件
    pub rgb: Version,
    /// 深度相机固件
    pub depth: Version,
    /// 音频固件
    pub audio: Version,
    /// 深度传感器固件
    pub depth_sensor: Version,
    pub firmware_build: FirmwareBuild,
    pub firmware_signature: FirmwareSignature,
}

impl fmt::Display for HardwareVersion {
    /// 形如 `Rel; C: 1.6.110; D: 1.6.80[6109.7]; A: 1.6.14`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let build = match self.firmware_build {
            FirmwareBuild::Release => "Rel",
            FirmwareBuild::Debug => "Dbg",
        };
        write!(
            f,
            "{}; C: {}; D: {}[{}.{}]; A: {}",
            build,
            self.rgb,
            self.depth,
            self.depth_sensor.major,
            self.depth_sensor.minor,
            self.audio
        )
    }
}
