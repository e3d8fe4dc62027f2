//! # K4A Device Layer
//!
//! 深度相机硬件抽象层，把 SDK 的设备访问和录制库的文件写入统一成三个 trait：
//!
//! - [`DeviceProvider`]：设备枚举与打开
//! - [`CameraDevice`]：单台设备（版本、彩色控制、相机/IMU 启停、取帧）
//! - [`RecordWriter`]：录制文件（文件头、capture、IMU 采样、flush）
//!
//! ## 后端
//!
//! - `k4a`（feature）：通过 FFI 调用厂商的 `libk4a` / `libk4arecord`
//! - `mock`（feature）：进程内模拟设备，按帧率生成 capture，输出 JSON 摘要

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub use k4a_types::{
    ColorControlCommand, ColorControlMode, ConfigError, DeviceConfiguration, HardwareVersion,
    ImuSample,
};

#[cfg(feature = "k4a")]
pub mod k4a;

#[cfg(feature = "k4a")]
pub use k4a::{K4aCapture, K4aDevice, K4aProvider, K4aRecordWriter};

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{
    MockCapture, MockDevice, MockDeviceSpec, MockDeviceState, MockProvider, MockRecordLog,
    MockRecordWriter, MockWriteFaults,
};

/// 设备层统一错误类型
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] DeviceFailure),
    #[error("Wait timeout")]
    Timeout,
    #[error("Device not started")]
    NotStarted,
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    /// 索引超出已连接设备
    NotFound,
    OpenFailed,
    /// 设备已被打开或相机已启动
    Busy,
    /// SDK / 录制库调用返回失败
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct DeviceFailure {
    pub kind: DeviceErrorKind,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl DeviceError {
    /// 便捷构造：后端调用失败
    pub fn backend(message: impl Into<String>) -> Self {
        DeviceError::Device(DeviceFailure::new(DeviceErrorKind::Backend, message))
    }
}

/// 设备枚举与打开
pub trait DeviceProvider {
    type Device: CameraDevice;

    /// 当前连接的设备数量
    fn installed_count(&self) -> u32;

    /// 按索引打开设备
    fn open(&self, index: u32) -> Result<Self::Device, DeviceError>;
}

/// 已打开的单台设备
///
/// 设备在 Drop 时关闭。由 [`CameraDevice::create_recording`] 创建的录制句柄
/// 引用底层设备，必须先于设备释放。
pub trait CameraDevice {
    /// 一组同步的彩色/深度/红外图像，Drop 时归还给 SDK
    type Capture;
    type Writer: RecordWriter<Capture = Self::Capture>;

    fn serial_number(&self) -> Result<String, DeviceError>;

    fn hardware_version(&self) -> Result<HardwareVersion, DeviceError>;

    fn set_color_control(
        &mut self,
        command: ColorControlCommand,
        mode: ColorControlMode,
        value: i32,
    ) -> Result<(), DeviceError>;

    fn start_cameras(&mut self, config: &DeviceConfiguration) -> Result<(), DeviceError>;

    fn stop_cameras(&mut self);

    /// 相机启动后才能启动 IMU
    fn start_imu(&mut self) -> Result<(), DeviceError>;

    fn stop_imu(&mut self);

    /// 等待下一个 capture，超时返回 [`DeviceError::Timeout`]
    fn get_capture(&mut self, timeout: Duration) -> Result<Self::Capture, DeviceError>;

    /// 等待下一个 IMU 采样，超时返回 [`DeviceError::Timeout`]
    fn get_imu_sample(&mut self, timeout: Duration) -> Result<ImuSample, DeviceError>;

    fn try_get_capture(&mut self, timeout: Duration) -> Result<Option<Self::Capture>, DeviceError> {
        match self.get_capture(timeout) {
            Ok(capture) => Ok(Some(capture)),
            Err(DeviceError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn try_get_imu_sample(&mut self, timeout: Duration) -> Result<Option<ImuSample>, DeviceError> {
        match self.get_imu_sample(timeout) {
            Ok(sample) => Ok(Some(sample)),
            Err(DeviceError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 创建录制文件（交给录制库处理容器格式）
    fn create_recording(
        &self,
        path: &Path,
        config: &DeviceConfiguration,
    ) -> Result<Self::Writer, DeviceError>;
}

/// 录制文件写入端，Drop 时关闭文件
///
/// 调用顺序：`add_imu_track`（可选）→ `write_header` → `write_capture` /
/// `write_imu_sample` → `flush`。
pub trait RecordWriter {
    type Capture;

    fn add_imu_track(&mut self) -> Result<(), DeviceError>;

    fn write_header(&mut self) -> Result<(), DeviceError>;

    fn write_capture(&mut self, capture: &Self::Capture) -> Result<(), DeviceError>;

    fn write_imu_sample(&mut self, sample: &ImuSample) -> Result<(), DeviceError>;

    fn flush(&mut self) -> Result<(), DeviceError>;
}
