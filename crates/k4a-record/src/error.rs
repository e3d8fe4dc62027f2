//! 录制层错误类型

use k4a_device::DeviceError;
use k4a_types::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Device not found (index {index}, {installed} connected).")]
    DeviceNotFound { index: u32, installed: u32 },

    /// SDK / 录制库调用失败，`operation` 为失败的调用
    #[error("Runtime error: {operation} failed: {source}")]
    Device {
        operation: &'static str,
        #[source]
        source: DeviceError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Timed out waiting for first capture.")]
    FirstCaptureTimeout,
}

/// 为设备调用结果附加失败的操作名
pub(crate) trait DeviceResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T, RecordError>;
}

impl<T> DeviceResultExt<T> for Result<T, DeviceError> {
    fn during(self, operation: &'static str) -> Result<T, RecordError> {
        self.map_err(|source| RecordError::Device { operation, source })
    }
}
