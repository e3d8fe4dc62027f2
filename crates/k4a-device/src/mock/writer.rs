//! Mock 录制写入端
//!
//! 不生成 MKV，只在 `flush` 时把录制摘要以 JSON 写入目标文件。
//! 写入顺序与真实录制库一致：IMU 轨道必须在文件头之前添加，数据必须在文件头之后写入。

use crate::{DeviceError, RecordWriter};
use k4a_types::{DeviceConfiguration, ImuSample};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{MockCapture, MockWriteFaults};

/// 录制过程记录（同时作为 JSON 摘要写入文件）
#[derive(Debug, Clone, Default, Serialize)]
pub struct MockRecordLog {
    pub path: Option<PathBuf>,
    pub device_serial: String,
    pub config: Option<DeviceConfiguration>,
    pub imu_track: bool,
    pub header_written: bool,
    pub captures: u64,
    pub imu_samples: u64,
    pub first_capture_usec: Option<u64>,
    pub last_capture_usec: Option<u64>,
    pub flushes: u32,
    pub closed: bool,
}

/// Mock 录制句柄
pub struct MockRecordWriter {
    file: File,
    faults: MockWriteFaults,
    log: Arc<Mutex<MockRecordLog>>,
}

impl MockRecordWriter {
    pub(crate) fn create(
        path: &Path,
        serial: &str,
        config: &DeviceConfiguration,
        faults: MockWriteFaults,
        log: Arc<Mutex<MockRecordLog>>,
    ) -> Result<Self, DeviceError> {
        let file = File::create(path)?;
        *log.lock() = MockRecordLog {
            path: Some(path.to_path_buf()),
            device_serial: serial.to_string(),
            config: Some(*config),
            ..MockRecordLog::default()
        };
        debug!("Created mock recording {}", path.display());
        Ok(Self { file, faults, log })
    }

    fn require_header(&self) -> Result<(), DeviceError> {
        if self.log.lock().header_written {
            Ok(())
        } else {
            Err(DeviceError::backend("recording header not written"))
        }
    }
}

impl RecordWriter for MockRecordWriter {
    type Capture = MockCapture;

    fn add_imu_track(&mut self) -> Result<(), DeviceError> {
        let mut log = self.log.lock();
        if log.header_written {
            return Err(DeviceError::backend(
                "IMU track must be added before the header",
            ));
        }
        log.imu_track = true;
        Ok(())
    }

    fn write_header(&mut self) -> Result<(), DeviceError> {
        let mut log = self.log.lock();
        if log.header_written {
            return Err(DeviceError::backend("recording header already written"));
        }
        log.header_written = true;
        Ok(())
    }

    fn write_capture(&mut self, capture: &MockCapture) -> Result<(), DeviceError> {
        self.require_header()?;
        let mut log = self.log.lock();
        if self.faults.capture_after.is_some_and(|n| log.captures >= n) {
            return Err(DeviceError::backend("injected capture write failure"));
        }
        log.captures += 1;
        log.first_capture_usec.get_or_insert(capture.device_timestamp_usec);
        log.last_capture_usec = Some(capture.device_timestamp_usec);
        Ok(())
    }

    fn write_imu_sample(&mut self, _sample: &ImuSample) -> Result<(), DeviceError> {
        self.require_header()?;
        let mut log = self.log.lock();
        if !log.imu_track {
            return Err(DeviceError::backend("recording has no IMU track"));
        }
        if self.faults.imu_sample_after.is_some_and(|n| log.imu_samples >= n) {
            return Err(DeviceError::backend("injected IMU sample write failure"));
        }
        log.imu_samples += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DeviceError> {
        let summary = {
            let mut log = self.log.lock();
            log.flushes += 1;
            serde_json::to_vec_pretty(&*log)
                .map_err(|e| DeviceError::backend(format!("summary encoding failed: {}", e)))?
        };

        self.file.set_len(0)?;
        let mut file = &self.file;
        std::io::Seek::rewind(&mut file)?;
        file.write_all(&summary)?;
        file.flush()?;
        Ok(())
    }
}

impl Drop for MockRecordWriter {
    fn drop(&mut self) {
        self.log.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k4a_types::{ColorResolution, FrameRate};

    fn writer(path: &Path) -> (MockRecordWriter, Arc<Mutex<MockRecordLog>>) {
        writer_with_faults(path, MockWriteFaults::default())
    }

    fn writer_with_faults(
        path: &Path,
        faults: MockWriteFaults,
    ) -> (MockRecordWriter, Arc<Mutex<MockRecordLog>>) {
        let log = Arc::new(Mutex::new(MockRecordLog::default()));
        let config = DeviceConfiguration {
            color_resolution: ColorResolution::R1080p,
            camera_fps: FrameRate::Fps15,
            ..DeviceConfiguration::disable_all()
        };
        let writer =
            MockRecordWriter::create(path, "000123", &config, faults, Arc::clone(&log)).unwrap();
        (writer, log)
    }

    fn capture(index: u64) -> MockCapture {
        MockCapture {
            index,
            device_timestamp_usec: index * 66_666,
            has_color: true,
            has_depth: false,
        }
    }

    #[test]
    fn test_ordering_rules() {
        let dir = tempfile::tempdir().unwrap();
        let (mut writer, _log) = writer(&dir.path().join("out.mkv"));

        assert!(writer.write_capture(&capture(0)).is_err());
        writer.add_imu_track().unwrap();
        writer.write_header().unwrap();
        assert!(writer.add_imu_track().is_err());
        assert!(writer.write_header().is_err());
        writer.write_capture(&capture(0)).unwrap();
        writer.write_imu_sample(&ImuSample::default()).unwrap();
    }

    #[test]
    fn test_imu_sample_requires_track() {
        let dir = tempfile::tempdir().unwrap();
        let (mut writer, _log) = writer(&dir.path().join("out.mkv"));
        writer.write_header().unwrap();
        assert!(writer.write_imu_sample(&ImuSample::default()).is_err());
    }

    #[test]
    fn test_injected_write_faults() {
        let dir = tempfile::tempdir().unwrap();
        let faults = MockWriteFaults {
            capture_after: Some(2),
            imu_sample_after: Some(1),
        };
        let (mut writer, log) = writer_with_faults(&dir.path().join("out.mkv"), faults);
        writer.add_imu_track().unwrap();
        writer.write_header().unwrap();

        writer.write_capture(&capture(0)).unwrap();
        writer.write_capture(&capture(1)).unwrap();
        assert!(writer.write_capture(&capture(2)).is_err());

        writer.write_imu_sample(&ImuSample::default()).unwrap();
        assert!(writer.write_imu_sample(&ImuSample::default()).is_err());

        let log = log.lock();
        assert_eq!(log.captures, 2);
        assert_eq!(log.imu_samples, 1);
    }

    #[test]
    fn test_flush_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mkv");
        let (mut writer, log) = writer(&path);

        writer.write_header().unwrap();
        for i in 0..3 {
            writer.write_capture(&capture(i)).unwrap();
        }
        writer.flush().unwrap();
        writer.flush().unwrap();
        drop(writer);

        let text = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["device_serial"], "000123");
        assert_eq!(json["captures"], 3);
        assert_eq!(json["flushes"], 2);
        assert_eq!(json["first_capture_usec"], 0);
        assert_eq!(json["last_capture_usec"], 133_332);

        let log = log.lock();
        assert!(log.closed);
        assert_eq!(log.config.unwrap().camera_fps, FrameRate::Fps15);
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Mutex::new(MockRecordLog::default()));
        let result = MockRecordWriter::create(
            &dir.path().join("missing/out.mkv"),
            "x",
            &DeviceConfiguration::disable_all(),
            MockWriteFaults::default(),
            log,
        );
        assert!(matches!(result, Err(DeviceError::Io(_))));
    }
}
