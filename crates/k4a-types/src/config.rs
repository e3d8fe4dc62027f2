//! 设备配置结构体定义
//!
//! 包含相机流的各项模式枚举，以及启动相机时提交给 SDK 的设备配置。

use crate::ConfigError;
use std::time::Duration;

// ============================================================================
// 流模式枚举
// ============================================================================

/// 图像格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageFormat {
    /// MJPEG 压缩彩色图像
    #[default]
    ColorMjpg = 0,
    /// NV12（仅 720p）
    ColorNv12 = 1,
    /// YUY2（仅 720p）
    ColorYuy2 = 2,
    /// BGRA32 未压缩彩色图像
    ColorBgra32 = 3,
    /// 16 位深度图
    Depth16 = 4,
    /// 16 位红外图
    Ir16 = 5,
}

impl TryFrom<u32> for ImageFormat {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ImageFormat::ColorMjpg),
            1 => Ok(ImageFormat::ColorNv12),
            2 => Ok(ImageFormat::ColorYuy2),
            3 => Ok(ImageFormat::ColorBgra32),
            4 => Ok(ImageFormat::Depth16),
            5 => Ok(ImageFormat::Ir16),
            _ => Err(ConfigError::InvalidValue {
                field: "ImageFormat",
                value,
            }),
        }
    }
}

/// 彩色相机分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorResolution {
    /// 关闭彩色相机
    #[default]
    Off = 0,
    /// 1280x720 16:9
    R720p = 1,
    /// 1920x1080 16:9
    R1080p = 2,
    /// 2560x1440 16:9
    R1440p = 3,
    /// 2048x1536 4:3
    R1536p = 4,
    /// 3840x2160 16:9
    R2160p = 5,
    /// 4096x3072 4:3
    R3072p = 6,
}

impl TryFrom<u32> for ColorResolution {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ColorResolution::Off),
            1 => Ok(ColorResolution::R720p),
            2 => Ok(ColorResolution::R1080p),
            3 => Ok(ColorResolution::R1440p),
            4 => Ok(ColorResolution::R1536p),
            5 => Ok(ColorResolution::R2160p),
            6 => Ok(ColorResolution::R3072p),
            _ => Err(ConfigError::InvalidValue {
                field: "ColorResolution",
                value,
            }),
        }
    }
}

/// 深度相机模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DepthMode {
    /// 关闭深度相机
    #[default]
    Off = 0,
    /// 窄视场 2x2 binning（320x288）
    NfovBinned2x2 = 1,
    /// 窄视场无 binning（640x576）
    NfovUnbinned = 2,
    /// 宽视场 2x2 binning（512x512）
    WfovBinned2x2 = 3,
    /// 宽视场无 binning（1024x1024）
    WfovUnbinned = 4,
    /// 被动红外（1024x1024）
    PassiveIr = 5,
}

impl TryFrom<u32> for DepthMode {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DepthMode::Off),
            1 => Ok(DepthMode::NfovBinned2x2),
            2 => Ok(DepthMode::NfovUnbinned),
            3 => Ok(DepthMode::WfovBinned2x2),
            4 => Ok(DepthMode::WfovUnbinned),
            5 => Ok(DepthMode::PassiveIr),
            _ => Err(ConfigError::InvalidValue {
                field: "DepthMode",
                value,
            }),
        }
    }
}

/// 相机帧率
///
/// 判别值沿用 SDK 的枚举序号，`Fps25` 排在最后（后加入的模式）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameRate {
    Fps5 = 0,
    Fps15 = 1,
    #[default]
    Fps30 = 2,
    Fps25 = 3,
}

impl FrameRate {
    /// 帧率（Hz）
    pub fn as_hz(&self) -> u32 {
        match self {
            FrameRate::Fps5 => 5,
            FrameRate::Fps15 => 15,
            FrameRate::Fps25 => 25,
            FrameRate::Fps30 => 30,
        }
    }

    /// 帧周期
    pub fn period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.as_hz()))
    }
}

impl TryFrom<u32> for FrameRate {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FrameRate::Fps5),
            1 => Ok(FrameRate::Fps15),
            2 => Ok(FrameRate::Fps30),
            3 => Ok(FrameRate::Fps25),
            _ => Err(ConfigError::InvalidValue {
                field: "FrameRate",
                value,
            }),
        }
    }
}

/// 有线同步模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WiredSyncMode {
    /// 独立运行，忽略同步线
    #[default]
    Standalone = 0,
    /// 主设备，向 Sync Out 输出触发信号
    Master = 1,
    /// 从设备，等待 Sync In 的触发信号
    Subordinate = 2,
}

impl TryFrom<u32> for WiredSyncMode {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WiredSyncMode::Standalone),
            1 => Ok(WiredSyncMode::Master),
            2 => Ok(WiredSyncMode::Subordinate),
            _ => Err(ConfigError::InvalidValue {
                field: "WiredSyncMode",
                value,
            }),
        }
    }
}

// ============================================================================
// 设备配置
// ============================================================================

/// 启动相机时提交给 SDK 的设备配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceConfiguration {
    pub color_format: ImageFormat,
    pub color_resolution: ColorResolution,
    pub depth_mode: DepthMode,
    pub camera_fps: FrameRate,
    /// 只输出彩色和深度都齐全的 capture
    pub synchronized_images_only: bool,
    /// 深度帧相对彩色帧的偏移（微秒），负值表示深度先到
    pub depth_delay_off_color_usec: i32,
    pub wired_sync_mode: WiredSyncMode,
    /// 从设备相对主设备的触发延迟（微秒）
    pub subordinate_delay_off_master_usec: u32,
    pub disable_streaming_indicator: bool,
}

impl DeviceConfiguration {
    /// 全部关闭的初始配置（对应 SDK 的 `DISABLE_ALL` 初始化宏）
    pub const fn disable_all() -> Self {
        Self {
            color_format: ImageFormat::ColorMjpg,
            color_resolution: ColorResolution::Off,
            depth_mode: DepthMode::Off,
            camera_fps: FrameRate::Fps30,
            synchronized_images_only: false,
            depth_delay_off_color_usec: 0,
            wired_sync_mode: WiredSyncMode::Standalone,
            subordinate_delay_off_master_usec: 0,
            disable_streaming_indicator: false,
        }
    }

    pub fn is_color_enabled(&self) -> bool {
        self.color_resolution != ColorResolution::Off
    }

    pub fn is_depth_enabled(&self) -> bool {
        self.depth_mode != DepthMode::Off
    }

    /// 当前模式下支持的最高帧率
    ///
    /// 宽视场无 binning 深度与 3072p 彩色最高只支持 15 fps。
    pub fn max_frame_rate(&self) -> FrameRate {
        if self.depth_mode == DepthMode::WfovUnbinned
            || self.color_resolution == ColorResolution::R3072p
        {
            FrameRate::Fps15
        } else {
            FrameRate::Fps30
        }
    }

    /// 确定最终帧率并写入 `camera_fps`
    ///
    /// - 未显式指定：取当前模式支持的最高帧率
    /// - 显式指定 30 fps 但模式上限更低：返回错误
    /// - 其余显式帧率原样使用，由 SDK 在启动相机时校验
    pub fn resolve_frame_rate(
        &mut self,
        requested: Option<FrameRate>,
    ) -> Result<FrameRate, ConfigError> {
        let max = self.max_frame_rate();
        let rate = match requested {
            None => max,
            Some(FrameRate::Fps30) if max != FrameRate::Fps30 => {
                return Err(ConfigError::UnsupportedFrameRate(FrameRate::Fps30.as_hz()));
            },
            Some(rate) => rate,
        };

        self.camera_fps = rate;
        Ok(rate)
    }

    /// 检查字段之间的约束
    ///
    /// # 错误
    /// - 非 Subordinate 模式下设置了从设备延迟
    /// - 深度延迟的绝对值不小于一个帧周期
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subordinate_delay_off_master_usec > 0
            && self.wired_sync_mode != WiredSyncMode::Subordinate
        {
            return Err(ConfigError::SyncDelayRequiresSubordinate);
        }

        let period_usec = self.camera_fps.period().as_micros() as u32;
        if self.depth_delay_off_color_usec.unsigned_abs() >= period_usec {
            return Err(ConfigError::DepthDelayTooLarge {
                delay_usec: self.depth_delay_off_color_usec,
                period_usec,
            });
        }

        Ok(())
    }

    /// 录制前要求至少开启彩色或深度中的一路
    pub fn ensure_streams_enabled(&self) -> Result<(), ConfigError> {
        if !self.is_color_enabled() && !self.is_depth_enabled() {
            return Err(ConfigError::NoStreamsEnabled);
        }
        Ok(())
    }
}

impl Default for DeviceConfiguration {
    fn default() -> Self {
        Self::disable_all()
    }
}
