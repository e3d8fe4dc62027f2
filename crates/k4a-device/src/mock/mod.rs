//! Mock 设备后端
//!
//! 用于测试和无硬件演练：
//! - capture 按配置帧率生成（真实 sleep，保证录制时长语义一致）
//! - IMU 采样按 1.6 kHz 累积
//! - 录制文件写入 JSON 摘要而不是 MKV
//!
//! 所有设备和录制的状态都记录在共享结构中，测试可以通过 [`MockProvider`] 查询。

mod writer;

pub use writer::{MockRecordLog, MockRecordWriter};

use crate::{
    CameraDevice, DeviceError, DeviceErrorKind, DeviceFailure, DeviceProvider,
};
use k4a_types::{
    ColorControlCommand, ColorControlMode, DeviceConfiguration, FirmwareBuild, FirmwareSignature,
    HardwareVersion, ImuSample, Version,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// 模拟 IMU 采样率（Hz）
pub const MOCK_IMU_RATE_HZ: u64 = 1600;

/// 单台模拟设备的描述
#[derive(Debug, Clone)]
pub struct MockDeviceSpec {
    pub serial: String,
    pub version: HardwareVersion,
    /// 打开设备失败
    pub fail_open: bool,
    /// 读取序列号失败
    pub fail_serial: bool,
    /// 产生 N 个 capture 后返回设备错误
    pub fail_capture_after: Option<u64>,
    /// 第一个 capture 之前的等待（模拟从设备等待主设备触发）
    pub first_capture_delay: Duration,
    /// 下发失败的控制命令
    pub rejected_controls: Vec<ColorControlCommand>,
    /// 录制文件的写入故障
    pub write_faults: MockWriteFaults,
}

/// 录制写入端的故障注入：写入 N 条之后返回后端错误
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockWriteFaults {
    pub capture_after: Option<u64>,
    pub imu_sample_after: Option<u64>,
}

impl MockDeviceSpec {
    pub fn new(serial: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            version: default_version(),
            fail_open: false,
            fail_serial: false,
            fail_capture_after: None,
            first_capture_delay: Duration::ZERO,
            rejected_controls: Vec::new(),
            write_faults: MockWriteFaults::default(),
        }
    }

    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn fail_serial(mut self) -> Self {
        self.fail_serial = true;
        self
    }

    pub fn fail_capture_after(mut self, captures: u64) -> Self {
        self.fail_capture_after = Some(captures);
        self
    }

    pub fn first_capture_delay(mut self, delay: Duration) -> Self {
        self.first_capture_delay = delay;
        self
    }

    pub fn reject_control(mut self, command: ColorControlCommand) -> Self {
        self.rejected_controls.push(command);
        self
    }

    pub fn fail_write_capture_after(mut self, captures: u64) -> Self {
        self.write_faults.capture_after = Some(captures);
        self
    }

    pub fn fail_write_imu_sample_after(mut self, samples: u64) -> Self {
        self.write_faults.imu_sample_after = Some(samples);
        self
    }
}

fn default_version() -> HardwareVersion {
    HardwareVersion {
        rgb: Version::new(1, 6, 110),
        depth: Version::new(1, 6, 79),
        audio: Version::new(1, 6, 14),
        depth_sensor: Version::new(6109, 7, 0),
        firmware_build: FirmwareBuild::Release,
        firmware_signature: FirmwareSignature::Msft,
    }
}

/// 模拟设备运行时状态（测试可读取快照）
#[derive(Debug, Clone, Default)]
pub struct MockDeviceState {
    pub opened: bool,
    pub controls: Vec<(ColorControlCommand, ColorControlMode, i32)>,
    pub started_config: Option<DeviceConfiguration>,
    pub cameras_running: bool,
    pub imu_running: bool,
    pub captures_delivered: u64,
    pub imu_samples_delivered: u64,
}

/// Mock 设备枚举入口
pub struct MockProvider {
    specs: Vec<MockDeviceSpec>,
    states: Vec<Arc<Mutex<MockDeviceState>>>,
    record_log: Arc<Mutex<MockRecordLog>>,
}

impl MockProvider {
    pub fn new(specs: Vec<MockDeviceSpec>) -> Self {
        let states = specs
            .iter()
            .map(|_| Arc::new(Mutex::new(MockDeviceState::default())))
            .collect();
        Self {
            specs,
            states,
            record_log: Arc::new(Mutex::new(MockRecordLog::default())),
        }
    }

    /// N 台正常设备，序列号为 `000000000001` 起递增
    pub fn with_devices(count: u32) -> Self {
        Self::new(
            (1..=count)
                .map(|i| MockDeviceSpec::new(format!("{:012}", i)))
                .collect(),
        )
    }

    /// 设备状态快照
    pub fn device_state(&self, index: u32) -> Option<MockDeviceState> {
        self.states.get(index as usize).map(|state| state.lock().clone())
    }

    /// 最近一次录制的日志快照
    pub fn record_log(&self) -> MockRecordLog {
        self.record_log.lock().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::with_devices(1)
    }
}

impl DeviceProvider for MockProvider {
    type Device = MockDevice;

    fn installed_count(&self) -> u32 {
        self.specs.len() as u32
    }

    fn open(&self, index: u32) -> Result<MockDevice, DeviceError> {
        let spec = self.specs.get(index as usize).ok_or_else(|| {
            DeviceFailure::new(
                DeviceErrorKind::NotFound,
                format!("no mock device at index {}", index),
            )
        })?;

        if spec.fail_open {
            return Err(DeviceFailure::new(
                DeviceErrorKind::OpenFailed,
                format!("mock device {} refused to open", index),
            )
            .into());
        }

        let state = Arc::clone(&self.states[index as usize]);
        {
            let mut state = state.lock();
            if state.opened {
                return Err(DeviceFailure::new(
                    DeviceErrorKind::Busy,
                    format!("mock device {} already open", index),
                )
                .into());
            }
            state.opened = true;
        }

        debug!("Opened mock device {} ({})", index, spec.serial);
        Ok(MockDevice {
            spec: spec.clone(),
            state,
            record_log: Arc::clone(&self.record_log),
            stream: None,
            imu_started_at: None,
            imu_produced: 0,
        })
    }
}

/// 模拟 capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCapture {
    /// 从 0 开始的序号
    pub index: u64,
    /// 设备时间戳（微秒，从相机启动开始计）
    pub device_timestamp_usec: u64,
    pub has_color: bool,
    pub has_depth: bool,
}

/// 相机流的节拍
struct StreamClock {
    config: DeviceConfiguration,
    started_at: Instant,
    next_frame_at: Instant,
    produced: u64,
}

/// 已打开的模拟设备
pub struct MockDevice {
    spec: MockDeviceSpec,
    state: Arc<Mutex<MockDeviceState>>,
    record_log: Arc<Mutex<MockRecordLog>>,
    stream: Option<StreamClock>,
    imu_started_at: Option<Instant>,
    imu_produced: u64,
}

impl CameraDevice for MockDevice {
    type Capture = MockCapture;
    type Writer = MockRecordWriter;

    fn serial_number(&self) -> Result<String, DeviceError> {
        if self.spec.fail_serial {
            return Err(DeviceError::backend("serial number unavailable"));
        }
        Ok(self.spec.serial.clone())
    }

    fn hardware_version(&self) -> Result<HardwareVersion, DeviceError> {
        Ok(self.spec.version)
    }

    fn set_color_control(
        &mut self,
        command: ColorControlCommand,
        mode: ColorControlMode,
        value: i32,
    ) -> Result<(), DeviceError> {
        if self.spec.rejected_controls.contains(&command) {
            return Err(DeviceError::backend(format!(
                "{} control rejected",
                command.name()
            )));
        }
        self.state.lock().controls.push((command, mode, value));
        Ok(())
    }

    fn start_cameras(&mut self, config: &DeviceConfiguration) -> Result<(), DeviceError> {
        if self.stream.is_some() {
            return Err(DeviceFailure::new(DeviceErrorKind::Busy, "cameras already started").into());
        }
        config.validate()?;
        config.ensure_streams_enabled()?;

        let now = Instant::now();
        self.stream = Some(StreamClock {
            config: *config,
            started_at: now,
            next_frame_at: now + self.spec.first_capture_delay,
            produced: 0,
        });

        let mut state = self.state.lock();
        state.started_config = Some(*config);
        state.cameras_running = true;
        Ok(())
    }

    fn stop_cameras(&mut self) {
        self.stop_imu();
        if self.stream.take().is_some() {
            self.state.lock().cameras_running = false;
        }
    }

    fn start_imu(&mut self) -> Result<(), DeviceError> {
        if self.stream.is_none() {
            return Err(DeviceError::NotStarted);
        }
        self.imu_started_at = Some(Instant::now());
        self.imu_produced = 0;
        self.state.lock().imu_running = true;
        Ok(())
    }

    fn stop_imu(&mut self) {
        if self.imu_started_at.take().is_some() {
            self.state.lock().imu_running = false;
        }
    }

    fn get_capture(&mut self, timeout: Duration) -> Result<MockCapture, DeviceError> {
        let fail_after = self.spec.fail_capture_after;
        let stream = self.stream.as_mut().ok_or(DeviceError::NotStarted)?;

        if let Some(limit) = fail_after
            && stream.produced >= limit
        {
            return Err(DeviceError::backend("mock capture failure"));
        }

        let now = Instant::now();
        if stream.next_frame_at > now + timeout {
            std::thread::sleep(timeout);
            return Err(DeviceError::Timeout);
        }
        if stream.next_frame_at > now {
            std::thread::sleep(stream.next_frame_at - now);
        }

        let capture = MockCapture {
            index: stream.produced,
            device_timestamp_usec: (stream.next_frame_at - stream.started_at).as_micros() as u64,
            has_color: stream.config.is_color_enabled(),
            has_depth: stream.config.is_depth_enabled(),
        };
        stream.produced += 1;
        stream.next_frame_at += stream.config.camera_fps.period();

        self.state.lock().captures_delivered += 1;
        Ok(capture)
    }

    fn get_imu_sample(&mut self, timeout: Duration) -> Result<ImuSample, DeviceError> {
        let started_at = self.imu_started_at.ok_or(DeviceError::NotStarted)?;

        let due = |produced: u64| {
            let elapsed_usec = started_at.elapsed().as_micros() as u64;
            elapsed_usec * MOCK_IMU_RATE_HZ / 1_000_000 > produced
        };

        if !due(self.imu_produced) {
            let period = Duration::from_micros(1_000_000 / MOCK_IMU_RATE_HZ);
            std::thread::sleep(timeout.min(period));
            if !due(self.imu_produced) {
                return Err(DeviceError::Timeout);
            }
        }

        let timestamp_usec = self.imu_produced * 1_000_000 / MOCK_IMU_RATE_HZ;
        self.imu_produced += 1;
        self.state.lock().imu_samples_delivered += 1;

        Ok(ImuSample {
            temperature: 30.0,
            acc: [0.0, 0.0, -9.81],
            acc_timestamp_usec: timestamp_usec,
            gyro: [0.0, 0.0, 0.0],
            gyro_timestamp_usec: timestamp_usec,
        })
    }

    fn create_recording(
        &self,
        path: &Path,
        config: &DeviceConfiguration,
    ) -> Result<MockRecordWriter, DeviceError> {
        MockRecordWriter::create(
            path,
            &self.spec.serial,
            config,
            self.spec.write_faults,
            Arc::clone(&self.record_log),
        )
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.stop_cameras();
        self.state.lock().opened = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k4a_types::{ColorResolution, DepthMode, FrameRate};

    fn config(fps: FrameRate) -> DeviceConfiguration {
        DeviceConfiguration {
            color_resolution: ColorResolution::R720p,
            depth_mode: DepthMode::NfovUnbinned,
            camera_fps: fps,
            ..DeviceConfiguration::disable_all()
        }
    }

    #[test]
    fn test_with_devices_serials() {
        let provider = MockProvider::with_devices(3);
        assert_eq!(provider.installed_count(), 3);
        let device = provider.open(2).unwrap();
        assert_eq!(device.serial_number().unwrap(), "000000000003");
        assert_eq!(device.hardware_version().unwrap().rgb, Version::new(1, 6, 110));
    }

    #[test]
    fn test_open_failures() {
        let provider = MockProvider::new(vec![MockDeviceSpec::new("A").fail_open()]);
        let err = provider.open(0).err().unwrap();
        assert!(matches!(
            err,
            DeviceError::Device(DeviceFailure {
                kind: DeviceErrorKind::OpenFailed,
                ..
            })
        ));
        assert!(provider.open(5).is_err());
    }

    #[test]
    fn test_open_twice_is_busy_until_dropped() {
        let provider = MockProvider::default();
        let device = provider.open(0).unwrap();
        assert!(provider.open(0).is_err());
        drop(device);
        assert!(provider.open(0).is_ok());
    }

    #[test]
    fn test_capture_requires_started_cameras() {
        let provider = MockProvider::default();
        let mut device = provider.open(0).unwrap();
        assert!(matches!(
            device.get_capture(Duration::from_millis(1)),
            Err(DeviceError::NotStarted)
        ));
        assert!(matches!(device.start_imu(), Err(DeviceError::NotStarted)));
    }

    #[test]
    fn test_captures_are_paced() {
        let provider = MockProvider::default();
        let mut device = provider.open(0).unwrap();
        device.start_cameras(&config(FrameRate::Fps30)).unwrap();

        let start = Instant::now();
        let first = device.get_capture(Duration::from_millis(100)).unwrap();
        let second = device.get_capture(Duration::from_millis(100)).unwrap();
        let third = device.get_capture(Duration::from_millis(100)).unwrap();

        assert_eq!((first.index, second.index, third.index), (0, 1, 2));
        assert!(first.has_color && first.has_depth);
        assert_eq!(second.device_timestamp_usec, 33_333);
        // 第三帧在启动后约 66ms
        assert!(start.elapsed() >= Duration::from_millis(60));
        assert_eq!(provider.device_state(0).unwrap().captures_delivered, 3);
    }

    #[test]
    fn test_first_capture_delay_times_out() {
        let provider = MockProvider::new(vec![
            MockDeviceSpec::new("sub").first_capture_delay(Duration::from_millis(200)),
        ]);
        let mut device = provider.open(0).unwrap();
        device.start_cameras(&config(FrameRate::Fps30)).unwrap();

        assert!(matches!(
            device.try_get_capture(Duration::from_millis(10)),
            Ok(None)
        ));
        assert!(device.get_capture(Duration::from_millis(500)).is_ok());
    }

    #[test]
    fn test_capture_failure_after_limit() {
        let provider = MockProvider::new(vec![MockDeviceSpec::new("X").fail_capture_after(1)]);
        let mut device = provider.open(0).unwrap();
        device.start_cameras(&config(FrameRate::Fps30)).unwrap();
        assert!(device.get_capture(Duration::from_millis(100)).is_ok());
        assert!(matches!(
            device.try_get_capture(Duration::from_millis(100)),
            Err(DeviceError::Device(_))
        ));
    }

    #[test]
    fn test_start_cameras_validates_config() {
        let provider = MockProvider::default();
        let mut device = provider.open(0).unwrap();
        let err = device
            .start_cameras(&DeviceConfiguration::disable_all())
            .unwrap_err();
        assert!(matches!(err, DeviceError::Config(_)));
    }

    #[test]
    fn test_imu_samples_accumulate() {
        let provider = MockProvider::default();
        let mut device = provider.open(0).unwrap();
        device.start_cameras(&config(FrameRate::Fps30)).unwrap();
        device.start_imu().unwrap();

        std::thread::sleep(Duration::from_millis(20));
        let mut drained = 0;
        while let Some(sample) = device.try_get_imu_sample(Duration::ZERO).unwrap() {
            assert_eq!(sample.acc[2], -9.81);
            drained += 1;
        }
        // 20ms @ 1.6kHz ≈ 32 个
        assert!(drained >= 20, "drained {}", drained);

        device.stop_cameras();
        let state = provider.device_state(0).unwrap();
        assert!(!state.cameras_running);
        assert!(!state.imu_running);
    }

    #[test]
    fn test_rejected_control() {
        let provider = MockProvider::new(vec![
            MockDeviceSpec::new("C").reject_control(ColorControlCommand::Gain),
        ]);
        let mut device = provider.open(0).unwrap();
        assert!(
            device
                .set_color_control(ColorControlCommand::Gain, ColorControlMode::Manual, 10)
                .is_err()
        );
        device
            .set_color_control(ColorControlCommand::Brightness, ColorControlMode::Manual, 50)
            .unwrap();
        assert_eq!(
            provider.device_state(0).unwrap().controls,
            vec![(ColorControlCommand::Brightness, ColorControlMode::Manual, 50)]
        );
    }
}
