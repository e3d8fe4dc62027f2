//! 录制会话
//!
//! [`do_recording`] 串起一次完整录制：
//!
//! 1. 打开设备，读取序列号和版本
//! 2. 下发彩色控制项，启动相机（和 IMU）
//! 3. 创建录制文件，写文件头
//! 4. 等待第一个 capture（从设备模式下等待主设备触发）
//! 5. 循环取帧写入，直到收到停止请求、设备出错或达到录制时长
//! 6. 停止设备，flush 并关闭文件
//!
//! 进度通过 [`SessionHook`] 回调通知，命令行和日志各自决定如何展示。

use crate::controls::{ControlFailure, apply_color_settings};
use crate::error::{DeviceResultExt, RecordError};
use crate::stop::StopFlag;
use k4a_device::{CameraDevice, DeviceProvider, RecordWriter};
use k4a_types::{ColorSettings, DeviceConfiguration, HardwareVersion, WiredSyncMode};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 等待第一个 capture 的超时
pub const FIRST_CAPTURE_TIMEOUT: Duration = Duration::from_secs(60);

/// 从设备模式下等待主设备触发的超时
pub const SUBORDINATE_FIRST_CAPTURE_TIMEOUT: Duration = Duration::from_secs(360);

/// 等待第一个 capture 时单次取帧的超时（保证能及时响应停止请求）
const FIRST_CAPTURE_POLL: Duration = Duration::from_millis(100);

/// 一次录制的全部参数
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    pub device_index: u32,
    pub output_path: PathBuf,
    /// `None` 表示一直录制到收到停止请求
    pub record_length: Option<Duration>,
    pub device_config: DeviceConfiguration,
    pub record_imu: bool,
    pub color: ColorSettings,
    /// 覆盖默认的首帧等待超时
    pub first_capture_timeout: Option<Duration>,
}

impl RecordingOptions {
    pub fn new(output_path: impl Into<PathBuf>, device_config: DeviceConfiguration) -> Self {
        Self {
            device_index: 0,
            output_path: output_path.into(),
            record_length: None,
            device_config,
            record_imu: false,
            color: ColorSettings::default(),
            first_capture_timeout: None,
        }
    }

    pub fn is_subordinate(&self) -> bool {
        self.device_config.wired_sync_mode == WiredSyncMode::Subordinate
    }

    /// 实际使用的首帧等待超时
    pub fn first_capture_timeout(&self) -> Duration {
        self.first_capture_timeout.unwrap_or(if self.is_subordinate() {
            SUBORDINATE_FIRST_CAPTURE_TIMEOUT
        } else {
            FIRST_CAPTURE_TIMEOUT
        })
    }
}

/// 录制结束的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 收到停止请求
    Requested,
    /// 在第一个 capture 到达之前收到停止请求
    RequestedBeforeFirstCapture,
    /// 达到录制时长
    LengthElapsed,
}

/// 录制结果统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub serial: Option<String>,
    pub captures: u64,
    pub imu_samples: u64,
    /// 从第一个 capture 开始计时
    pub duration: Duration,
    pub reason: StopReason,
}

/// 会话进度事件
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DeviceOpened {
        index: u32,
        serial: Option<String>,
        version: Option<HardwareVersion>,
    },
    ControlFailed(ControlFailure),
    DeviceStarted,
    WaitingForMaster,
    RecordingStarted {
        length: Option<Duration>,
    },
    /// 录制自行结束（外部停止请求由信号处理方自行提示）
    Stopping,
    Saving,
    Done,
}

/// 会话进度回调
pub trait SessionHook {
    fn on_event(&self, event: &SessionEvent);
}

/// 只写日志的回调
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl SessionHook for TracingHook {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::DeviceOpened {
                index,
                serial,
                version,
            } => info!(
                "Opened device {} (serial {}, version {})",
                index,
                serial.as_deref().unwrap_or("unknown"),
                version
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown".into())
            ),
            SessionEvent::ControlFailed(failure) => warn!("{}", failure),
            SessionEvent::DeviceStarted => info!("Device started"),
            SessionEvent::WaitingForMaster => info!("Waiting for signal from master"),
            SessionEvent::RecordingStarted { length } => match length {
                Some(length) => info!("Started recording for {:?}", length),
                None => info!("Started recording"),
            },
            SessionEvent::Stopping => info!("Stopping recording"),
            SessionEvent::Saving => info!("Saving recording"),
            SessionEvent::Done => info!("Recording done"),
        }
    }
}

/// 执行一次录制
///
/// # 错误
///
/// - 设备索引超出已连接设备数：[`RecordError::DeviceNotFound`]
/// - 彩色/深度均未开启或配置非法：[`RecordError::Config`]
/// - 首帧等待超时：[`RecordError::FirstCaptureTimeout`]
/// - SDK 调用失败：[`RecordError::Device`]
///
/// 在首帧到达之前收到停止请求属于正常退出，返回零帧的统计。
pub fn do_recording<P>(
    provider: &P,
    options: &RecordingOptions,
    stop: &StopFlag,
    hook: &dyn SessionHook,
) -> Result<RecordingSummary, RecordError>
where
    P: DeviceProvider + ?Sized,
{
    let config = &options.device_config;
    config.ensure_streams_enabled()?;
    config.validate()?;
    options.color.validate()?;

    let installed = provider.installed_count();
    if options.device_index >= installed {
        return Err(RecordError::DeviceNotFound {
            index: options.device_index,
            installed,
        });
    }

    let mut device = provider
        .open(options.device_index)
        .during("k4a_device_open()")?;

    let serial = device.serial_number().ok();
    hook.on_event(&SessionEvent::DeviceOpened {
        index: options.device_index,
        serial: serial.clone(),
        version: device.hardware_version().ok(),
    });

    for failure in apply_color_settings(&mut device, &options.color) {
        hook.on_event(&SessionEvent::ControlFailed(failure));
    }

    device
        .start_cameras(config)
        .during("k4a_device_start_cameras()")?;
    if options.record_imu {
        device.start_imu().during("k4a_device_start_imu()")?;
    }
    hook.on_event(&SessionEvent::DeviceStarted);

    // 录制句柄引用设备，必须先于设备释放（声明在后，先 Drop）
    let mut writer = device
        .create_recording(&options.output_path, config)
        .during("k4a_record_create()")?;
    if options.record_imu {
        writer.add_imu_track().during("k4a_record_add_imu_track()")?;
    }
    writer.write_header().during("k4a_record_write_header()")?;

    if options.is_subordinate() {
        hook.on_event(&SessionEvent::WaitingForMaster);
    }

    if !wait_for_first_capture(&mut device, options.first_capture_timeout(), stop)? {
        debug!("Stop requested before the first capture");
        device.stop_imu();
        device.stop_cameras();
        return Ok(RecordingSummary {
            serial,
            captures: 0,
            imu_samples: 0,
            duration: Duration::ZERO,
            reason: StopReason::RequestedBeforeFirstCapture,
        });
    }

    hook.on_event(&SessionEvent::RecordingStarted {
        length: options.record_length,
    });

    let capture_timeout = config.camera_fps.period();
    let started_at = Instant::now();
    let within_length = |now: Instant| match options.record_length {
        Some(length) => now.duration_since(started_at) < length,
        None => true,
    };

    let mut captures = 0u64;
    let mut imu_samples = 0u64;
    let mut loop_error = None;

    // 先写一帧再判断时长，`-l 0` 也会录下一帧
    loop {
        match device.try_get_capture(capture_timeout) {
            Ok(Some(capture)) => {
                writer
                    .write_capture(&capture)
                    .during("k4a_record_write_capture()")?;
                captures += 1;

                if options.record_imu {
                    imu_samples += drain_imu(&mut device, &mut writer, || {
                        stop.is_stopping() || !within_length(Instant::now())
                    });
                }
            },
            Ok(None) => {},
            Err(e) => {
                error!("Runtime error: k4a_device_get_capture() failed: {}", e);
                loop_error = Some(RecordError::Device {
                    operation: "k4a_device_get_capture()",
                    source: e,
                });
                break;
            },
        }

        if stop.is_stopping() || !within_length(Instant::now()) {
            break;
        }
    }

    let duration = started_at.elapsed();
    let reason = if stop.mark_stopped() {
        hook.on_event(&SessionEvent::Stopping);
        StopReason::LengthElapsed
    } else {
        StopReason::Requested
    };

    if options.record_imu {
        device.stop_imu();
    }
    device.stop_cameras();

    hook.on_event(&SessionEvent::Saving);
    writer.flush().during("k4a_record_flush()")?;
    drop(writer);
    hook.on_event(&SessionEvent::Done);

    debug!(
        "Recorded {} captures and {} IMU samples in {:?}",
        captures, imu_samples, duration
    );

    match loop_error {
        Some(e) => Err(e),
        None => Ok(RecordingSummary {
            serial,
            captures,
            imu_samples,
            duration,
            reason,
        }),
    }
}

/// 写入当前已到达的 IMU 采样，返回写入数量
///
/// 读取或写入失败只记录错误并结束本轮，不中断录制。
fn drain_imu<D>(device: &mut D, writer: &mut D::Writer, done: impl Fn() -> bool) -> u64
where
    D: CameraDevice + ?Sized,
{
    let mut written = 0;
    loop {
        let sample = match device.try_get_imu_sample(Duration::ZERO) {
            Ok(Some(sample)) => sample,
            Ok(None) => break,
            Err(e) => {
                error!("Runtime error: k4a_device_get_imu_sample() failed: {}", e);
                break;
            },
        };
        if let Err(e) = writer.write_imu_sample(&sample) {
            error!("Runtime error: k4a_record_write_imu_sample() failed: {}", e);
            break;
        }
        written += 1;

        if done() {
            break;
        }
    }
    written
}

/// 等待第一个 capture（丢弃，不写入文件）
///
/// 返回 `Ok(false)` 表示等待期间收到了停止请求。
fn wait_for_first_capture<D>(
    device: &mut D,
    timeout: Duration,
    stop: &StopFlag,
) -> Result<bool, RecordError>
where
    D: CameraDevice + ?Sized,
{
    let deadline = Instant::now() + timeout;

    while !stop.is_stopping() {
        let now = Instant::now();
        if now >= deadline {
            return Err(RecordError::FirstCaptureTimeout);
        }

        let poll = FIRST_CAPTURE_POLL.min(deadline - now);
        if device
            .try_get_capture(poll)
            .during("k4a_device_get_capture()")?
            .is_some()
        {
            return Ok(true);
        }
    }

    Ok(false)
}
