//! 录制命令
//!
//! 把命令行选项（和配置文件默认值）转换为 [`RecordingOptions`]，然后执行录制。

use crate::config::FileConfig;
use crate::validation::{
    parse_color_mode, parse_depth_mode, parse_frame_rate, parse_imu_mode, parse_sync_mode,
};
use anyhow::{Context, Result};
use clap::Args;
use k4a_device::DeviceProvider;
use k4a_record::{
    RecordingOptions, SessionEvent, SessionHook, StopFlag, TracingHook, do_recording,
};
use k4a_types::{
    BRIGHTNESS_RANGE, CONTRAST_RANGE, ColorResolution, DEVICE_INDEX_RANGE, DepthMode,
    DeviceConfiguration, EXPOSURE_RANGE, GAIN_RANGE, ImageFormat, SATURATION_RANGE,
    SHARPNESS_RANGE, ValueRange, WHITEBALANCE_RANGE, WiredSyncMode, check_non_negative,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// 录制参数
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordArgs {
    /// Specify the device index to use (default: 0)
    #[arg(long, value_name = "INDEX", allow_negative_numbers = true)]
    pub device: Option<i64>,

    /// Limit the recording to N seconds (default: infinite)
    #[arg(short = 'l', long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub record_length: Option<i64>,

    /// Set the color sensor mode (default: 1080p), available options:
    /// 3072p, 2160p, 1536p, 1440p, 1080p, 720p, 720p_NV12, 720p_YUY2, OFF
    #[arg(short = 'c', long, value_name = "MODE")]
    pub color_mode: Option<String>,

    /// Set the depth sensor mode (default: NFOV_UNBINNED), available options:
    /// NFOV_2X2BINNED, NFOV_UNBINNED, WFOV_2X2BINNED, WFOV_UNBINNED, PASSIVE_IR, OFF
    #[arg(short = 'd', long, value_name = "MODE")]
    pub depth_mode: Option<String>,

    /// Set the time offset between color and depth frames in microseconds (default: 0).
    /// A negative value means depth frames will arrive before color frames.
    /// The delay must be less than 1 frame period.
    #[arg(long, value_name = "USEC", allow_negative_numbers = true)]
    pub depth_delay: Option<i32>,

    /// Set the camera frame rate in frames per second. Default is the maximum rate
    /// supported by the camera modes. Available options: 30, 25, 15, 5
    #[arg(short = 'r', long, value_name = "FPS")]
    pub rate: Option<String>,

    /// Set the IMU recording mode (ON, OFF, default: OFF)
    #[arg(long, value_name = "MODE")]
    pub imu: Option<String>,

    /// Set the external sync mode (Master, Subordinate, Standalone, default: Standalone)
    #[arg(long, value_name = "MODE")]
    pub external_sync: Option<String>,

    /// Set the external sync delay off the master camera in microseconds (default: 0).
    /// Only valid if the camera is in Subordinate mode.
    #[arg(long, value_name = "USEC", allow_negative_numbers = true)]
    pub sync_delay: Option<i64>,

    /// Set manual exposure value from 100 us to 409500 us for the RGB camera
    /// (default: auto exposure)
    #[arg(short = 'e', long, value_name = "USEC", allow_negative_numbers = true)]
    pub exposure_control: Option<i64>,

    /// Set manual brightness value between 0-100 (default: 50)
    #[arg(short = 'b', long, allow_negative_numbers = true)]
    pub brightness: Option<i64>,

    /// Set manual contrast value between 0-100 (default: 50)
    #[arg(short = 't', long, allow_negative_numbers = true)]
    pub contrast: Option<i64>,

    /// Set manual saturation value between 0-100 (default: 50)
    #[arg(short = 's', long, allow_negative_numbers = true)]
    pub saturation: Option<i64>,

    /// Set manual sharpness value between 0-100 (default: 50)
    #[arg(short = 'p', long, allow_negative_numbers = true)]
    pub sharpness: Option<i64>,

    /// Set manual white balance value in Kelvin between 2000-11000 (default: auto)
    #[arg(short = 'w', long, value_name = "KELVIN", allow_negative_numbers = true)]
    pub whitebalance: Option<i64>,

    /// Set cameras manual gain. The valid range is 1 to 255 (default: auto)
    #[arg(short = 'g', long, allow_negative_numbers = true)]
    pub gain: Option<i64>,
}

fn check_range(range: ValueRange, value: i64, option: &'static str) -> Result<i32> {
    let value = range.check(value).context(option)?;
    i32::try_from(value).context(option)
}

impl RecordArgs {
    /// 命令行未指定的值取配置文件中的值
    pub fn with_defaults(self, file: &FileConfig) -> Self {
        Self {
            device: self.device.or(file.device),
            record_length: self.record_length.or(file.record_length),
            color_mode: self.color_mode.or_else(|| file.color_mode.clone()),
            depth_mode: self.depth_mode.or_else(|| file.depth_mode.clone()),
            depth_delay: self.depth_delay.or(file.depth_delay),
            rate: self.rate.or_else(|| file.rate.clone()),
            imu: self.imu.or_else(|| file.imu.clone()),
            external_sync: self.external_sync.or_else(|| file.external_sync.clone()),
            sync_delay: self.sync_delay.or(file.sync_delay),
            exposure_control: self.exposure_control.or(file.exposure_control),
            brightness: self.brightness.or(file.brightness),
            contrast: self.contrast.or(file.contrast),
            saturation: self.saturation.or(file.saturation),
            sharpness: self.sharpness.or(file.sharpness),
            whitebalance: self.whitebalance.or(file.whitebalance),
            gain: self.gain.or(file.gain),
        }
    }

    /// 校验并生成录制参数
    ///
    /// # 错误
    /// - 枚举值无法识别或数值超出范围
    /// - 显式指定了当前模式不支持的帧率
    /// - 非 Subordinate 模式下设置了 `--sync-delay`
    /// - 深度延迟不小于一个帧周期
    pub fn to_recording_options(&self, output: PathBuf) -> Result<RecordingOptions> {
        let mut config = DeviceConfiguration {
            color_format: ImageFormat::ColorMjpg,
            color_resolution: ColorResolution::R1080p,
            depth_mode: DepthMode::NfovUnbinned,
            ..DeviceConfiguration::disable_all()
        };
        let mut options = RecordingOptions::new(output, config);

        if let Some(index) = self.device {
            options.device_index = check_range(DEVICE_INDEX_RANGE, index, "--device")? as u32;
        }
        if let Some(length) = self.record_length {
            let seconds = check_non_negative("Recording length", length).context("--record-length")?;
            options.record_length = Some(Duration::from_secs(seconds.unsigned_abs()));
        }

        if let Some(mode) = &self.color_mode {
            let (resolution, format) = parse_color_mode(mode).context("--color-mode")?;
            config.color_resolution = resolution;
            config.color_format = format;
        }
        if let Some(mode) = &self.depth_mode {
            config.depth_mode = parse_depth_mode(mode).context("--depth-mode")?;
        }
        if let Some(delay) = self.depth_delay {
            config.depth_delay_off_color_usec = delay;
        }
        let requested_rate = self
            .rate
            .as_deref()
            .map(parse_frame_rate)
            .transpose()
            .context("--rate")?;
        if let Some(mode) = &self.imu {
            options.record_imu = parse_imu_mode(mode).context("--imu")?;
        }
        if let Some(mode) = &self.external_sync {
            config.wired_sync_mode = parse_sync_mode(mode).context("--external-sync")?;
        }
        if let Some(delay) = self.sync_delay {
            let delay = check_non_negative("External sync delay", delay).context("--sync-delay")?;
            config.subordinate_delay_off_master_usec =
                u32::try_from(delay).context("--sync-delay")?;
        }

        let color = &mut options.color;
        if let Some(exposure) = self.exposure_control {
            color.exposure_usec = Some(check_range(EXPOSURE_RANGE, exposure, "--exposure-control")?);
        }
        if let Some(brightness) = self.brightness {
            color.brightness = check_range(BRIGHTNESS_RANGE, brightness, "--brightness")?;
        }
        if let Some(contrast) = self.contrast {
            color.contrast = check_range(CONTRAST_RANGE, contrast, "--contrast")?;
        }
        if let Some(saturation) = self.saturation {
            color.saturation = check_range(SATURATION_RANGE, saturation, "--saturation")?;
        }
        if let Some(sharpness) = self.sharpness {
            color.sharpness = check_range(SHARPNESS_RANGE, sharpness, "--sharpness")?;
        }
        if let Some(whitebalance) = self.whitebalance {
            color.whitebalance = Some(check_range(WHITEBALANCE_RANGE, whitebalance, "--whitebalance")?);
        }
        if let Some(gain) = self.gain {
            color.gain = Some(check_range(GAIN_RANGE, gain, "--gain")?);
        }

        config.resolve_frame_rate(requested_rate)?;

        if config.subordinate_delay_off_master_usec > 0
            && config.wired_sync_mode != WiredSyncMode::Subordinate
        {
            anyhow::bail!("--sync-delay is only valid if --external-sync is set to Subordinate.");
        }
        config.validate()?;

        options.device_config = config;
        Ok(options)
    }
}

/// 把会话进度打印到终端，同时写日志
pub struct ConsoleHook;

impl SessionHook for ConsoleHook {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::DeviceOpened {
                serial, version, ..
            } => {
                if let Some(serial) = serial {
                    println!("Device serial number: {}", serial);
                }
                if let Some(version) = version {
                    println!("Device version: {}", version);
                }
            },
            SessionEvent::ControlFailed(failure) => eprintln!("{}", failure),
            SessionEvent::DeviceStarted => println!("Device started"),
            SessionEvent::WaitingForMaster => {
                println!("[subordinate mode] Waiting for signal from master")
            },
            SessionEvent::RecordingStarted { length } => {
                println!("Started recording");
                // 未指定时长或时长为 0 时都需要手动停止提示
                if length.is_none_or(|length| length.is_zero()) {
                    println!("Press Ctrl-C to stop recording.");
                }
            },
            SessionEvent::Stopping => println!("Stopping recording..."),
            SessionEvent::Saving => println!("Saving recording..."),
            SessionEvent::Done => println!("Done"),
        }
        TracingHook.on_event(event);
    }
}

/// 执行录制
pub fn execute<P>(provider: &P, options: &RecordingOptions, stop: &StopFlag) -> Result<()>
where
    P: DeviceProvider + ?Sized,
{
    let summary = do_recording(provider, options, stop, &ConsoleHook)?;
    debug!(
        "Recording finished ({:?}): {} captures, {} IMU samples, {:?}",
        summary.reason, summary.captures, summary.imu_samples, summary.duration
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k4a_types::{ColorSettings, FrameRate};

    fn build(args: RecordArgs) -> Result<RecordingOptions> {
        args.to_recording_options(PathBuf::from("out.mkv"))
    }

    #[test]
    fn test_defaults() {
        let options = build(RecordArgs::default()).unwrap();
        let config = options.device_config;

        assert_eq!(options.device_index, 0);
        assert_eq!(options.record_length, None);
        assert!(!options.record_imu);
        assert_eq!(options.color, ColorSettings::default());
        assert_eq!(config.color_resolution, ColorResolution::R1080p);
        assert_eq!(config.color_format, ImageFormat::ColorMjpg);
        assert_eq!(config.depth_mode, DepthMode::NfovUnbinned);
        assert_eq!(config.camera_fps, FrameRate::Fps30);
        assert_eq!(config.wired_sync_mode, WiredSyncMode::Standalone);
    }

    #[test]
    fn test_full_options() {
        let options = build(RecordArgs {
            device: Some(2),
            record_length: Some(5),
            color_mode: Some("720P_nv12".into()),
            depth_mode: Some("passive_ir".into()),
            depth_delay: Some(-1000),
            rate: Some("25".into()),
            imu: Some("On".into()),
            external_sync: Some("sub".into()),
            sync_delay: Some(160),
            exposure_control: Some(8330),
            whitebalance: Some(5000),
            gain: Some(64),
            brightness: Some(0),
            ..Default::default()
        })
        .unwrap();
        let config = options.device_config;

        assert_eq!(options.device_index, 2);
        assert_eq!(options.record_length, Some(Duration::from_secs(5)));
        assert!(options.record_imu);
        assert_eq!(config.color_format, ImageFormat::ColorNv12);
        assert_eq!(config.color_resolution, ColorResolution::R720p);
        assert_eq!(config.depth_mode, DepthMode::PassiveIr);
        assert_eq!(config.depth_delay_off_color_usec, -1000);
        assert_eq!(config.camera_fps, FrameRate::Fps25);
        assert_eq!(config.wired_sync_mode, WiredSyncMode::Subordinate);
        assert_eq!(config.subordinate_delay_off_master_usec, 160);
        assert_eq!(options.color.exposure_usec, Some(8330));
        assert_eq!(options.color.whitebalance, Some(5000));
        assert_eq!(options.color.gain, Some(64));
        assert_eq!(options.color.brightness, 0);
        assert_eq!(options.color.contrast, 50);
    }

    #[test]
    fn test_wfov_unbinned_rate() {
        let options = build(RecordArgs {
            depth_mode: Some("WFOV_UNBINNED".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(options.device_config.camera_fps, FrameRate::Fps15);

        let err = build(RecordArgs {
            depth_mode: Some("WFOV_UNBINNED".into()),
            rate: Some("30".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "30 Frames per second is not supported by this camera mode."
        );
    }

    #[test]
    fn test_3072p_defaults_to_15() {
        let options = build(RecordArgs {
            color_mode: Some("3072p".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(options.device_config.camera_fps, FrameRate::Fps15);
    }

    #[test]
    fn test_sync_delay_requires_subordinate() {
        let err = build(RecordArgs {
            sync_delay: Some(100),
            external_sync: Some("master".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "--sync-delay is only valid if --external-sync is set to Subordinate."
        );

        let err = build(RecordArgs {
            sync_delay: Some(-1),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(format!("{:#}", err), "--sync-delay: External sync delay must be positive");
    }

    #[test]
    fn test_range_errors_name_option() {
        let cases = [
            (
                RecordArgs {
                    gain: Some(0),
                    ..Default::default()
                },
                "--gain: Gain value must be between 1 and 255.",
            ),
            (
                RecordArgs {
                    device: Some(256),
                    ..Default::default()
                },
                "--device: Device index value must be between 0 and 255.",
            ),
            (
                RecordArgs {
                    exposure_control: Some(50),
                    ..Default::default()
                },
                "--exposure-control: Exposure value must be between 100 and 409500.",
            ),
            (
                RecordArgs {
                    record_length: Some(-3),
                    ..Default::default()
                },
                "--record-length: Recording length must be positive",
            ),
            (
                RecordArgs {
                    color_mode: Some("8k".into()),
                    ..Default::default()
                },
                "--color-mode: Unknown color mode specified: 8k",
            ),
        ];

        for (args, expected) in cases {
            assert_eq!(format!("{:#}", build(args).unwrap_err()), expected);
        }
    }

    #[test]
    fn test_depth_delay_must_be_within_frame() {
        assert!(
            build(RecordArgs {
                depth_delay: Some(40_000),
                ..Default::default()
            })
            .is_err()
        );
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = FileConfig {
            color_mode: Some("720p".into()),
            gain: Some(10),
            imu: Some("on".into()),
            ..Default::default()
        };
        let args = RecordArgs {
            color_mode: Some("off".into()),
            ..Default::default()
        }
        .with_defaults(&file);

        assert_eq!(args.color_mode.as_deref(), Some("off"));
        assert_eq!(args.gain, Some(10));
        assert_eq!(args.imu.as_deref(), Some("on"));
    }
}
