//! 设备枚举

use k4a_device::{CameraDevice, DeviceProvider};
use k4a_types::HardwareVersion;
use std::fmt;
use tracing::debug;

/// 单台设备的枚举结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingStatus {
    /// 设备可以打开；序列号或版本读取失败时为 `None`
    Opened {
        serial: Option<String>,
        version: Option<HardwareVersion>,
    },
    OpenFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceListing {
    pub index: u32,
    pub status: ListingStatus,
}

impl fmt::Display for DeviceListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index:{}", self.index)?;
        match &self.status {
            ListingStatus::Opened { serial, version } => {
                match serial {
                    Some(serial) => write!(f, "\tSerial:{}", serial)?,
                    None => write!(f, "\tSerial:ERROR")?,
                }
                if let Some(version) = version {
                    write!(f, "\tColor:{}\tDepth:{}", version.rgb, version.depth)?;
                }
                Ok(())
            },
            ListingStatus::OpenFailed => write!(f, "\tDevice Open Failed"),
        }
    }
}

/// 逐个打开已连接的设备，读取序列号和固件版本
///
/// 每台设备读取完成后立即关闭。
pub fn list_devices<P: DeviceProvider + ?Sized>(provider: &P) -> Vec<DeviceListing> {
    let count = provider.installed_count();
    debug!("{} device(s) installed", count);

    (0..count)
        .map(|index| {
            let status = match provider.open(index) {
                Ok(device) => ListingStatus::Opened {
                    serial: device.serial_number().ok(),
                    version: device.hardware_version().ok(),
                },
                Err(e) => {
                    debug!("Failed to open device {}: {}", index, e);
                    ListingStatus::OpenFailed
                },
            };
            DeviceListing { index, status }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k4a_device::{MockDeviceSpec, MockProvider};

    #[test]
    fn test_no_devices() {
        let provider = MockProvider::new(Vec::new());
        assert!(list_devices(&provider).is_empty());
    }

    #[test]
    fn test_listing_lines() {
        let provider = MockProvider::new(vec![
            MockDeviceSpec::new("000123"),
            MockDeviceSpec::new("000456").fail_serial(),
            MockDeviceSpec::new("000789").fail_open(),
        ]);

        let lines: Vec<String> = list_devices(&provider).iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "Index:0\tSerial:000123\tColor:1.6.110\tDepth:1.6.79",
                "Index:1\tSerial:ERROR\tColor:1.6.110\tDepth:1.6.79",
                "Index:2\tDevice Open Failed",
            ]
        );
    }

    #[test]
    fn test_devices_closed_after_listing() {
        let provider = MockProvider::with_devices(2);
        list_devices(&provider);
        assert!(!provider.device_state(0).unwrap().opened);
        assert!(!provider.device_state(1).unwrap().opened);
    }
}
