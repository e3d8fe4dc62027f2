//! k4a 硬件后端
//!
//! 通过 FFI 直接转发到厂商 SDK，本模块只负责句柄的 RAII 管理和返回码映射。

mod ffi;

use crate::{
    CameraDevice, DeviceError, DeviceErrorKind, DeviceFailure, DeviceProvider, RecordWriter,
};
use k4a_types::{
    ColorControlCommand, ColorControlMode, DeviceConfiguration, FirmwareBuild, FirmwareSignature,
    HardwareVersion, ImuSample, Version,
};
use libc::{c_char, size_t};
use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;
use std::time::Duration;
use tracing::{debug, trace};

/// 返回码检查
fn check(result: ffi::k4a_result_t, call: &str) -> Result<(), DeviceError> {
    if result == ffi::K4A_RESULT_SUCCEEDED {
        Ok(())
    } else {
        Err(DeviceError::backend(format!("{}() returned error", call)))
    }
}

/// SDK 超时参数为毫秒 i32
fn timeout_ms(timeout: Duration) -> i32 {
    timeout.as_millis().min(i32::MAX as u128) as i32
}

fn raw_config(config: &DeviceConfiguration) -> ffi::k4a_device_configuration_t {
    ffi::k4a_device_configuration_t {
        color_format: config.color_format as libc::c_int,
        color_resolution: config.color_resolution as libc::c_int,
        depth_mode: config.depth_mode as libc::c_int,
        camera_fps: config.camera_fps as libc::c_int,
        synchronized_images_only: config.synchronized_images_only,
        depth_delay_off_color_usec: config.depth_delay_off_color_usec,
        wired_sync_mode: config.wired_sync_mode as libc::c_int,
        subordinate_delay_off_master_usec: config.subordinate_delay_off_master_usec,
        disable_streaming_indicator: config.disable_streaming_indicator,
    }
}

fn version(raw: ffi::k4a_version_t) -> Version {
    Version::new(raw.major, raw.minor, raw.iteration)
}

fn imu_sample(raw: &ffi::k4a_imu_sample_t) -> ImuSample {
    ImuSample {
        temperature: raw.temperature,
        acc: raw.acc_sample.v,
        acc_timestamp_usec: raw.acc_timestamp_usec,
        gyro: raw.gyro_sample.v,
        gyro_timestamp_usec: raw.gyro_timestamp_usec,
    }
}

fn raw_imu_sample(sample: &ImuSample) -> ffi::k4a_imu_sample_t {
    ffi::k4a_imu_sample_t {
        temperature: sample.temperature,
        acc_sample: ffi::k4a_float3_t { v: sample.acc },
        acc_timestamp_usec: sample.acc_timestamp_usec,
        gyro_sample: ffi::k4a_float3_t { v: sample.gyro },
        gyro_timestamp_usec: sample.gyro_timestamp_usec,
    }
}

/// SDK 设备枚举入口
#[derive(Debug, Default, Clone, Copy)]
pub struct K4aProvider;

impl K4aProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceProvider for K4aProvider {
    type Device = K4aDevice;

    fn installed_count(&self) -> u32 {
        // SAFETY: 无参数，SDK 内部完成 USB 枚举
        unsafe { ffi::k4a_device_get_installed_count() }
    }

    fn open(&self, index: u32) -> Result<K4aDevice, DeviceError> {
        let mut handle: ffi::k4a_device_t = ptr::null_mut();
        // SAFETY: handle 是有效的输出位置
        let result = unsafe { ffi::k4a_device_open(index, &mut handle) };
        if result != ffi::K4A_RESULT_SUCCEEDED || handle.is_null() {
            return Err(DeviceFailure::new(
                DeviceErrorKind::OpenFailed,
                format!("k4a_device_open({}) failed", index),
            )
            .into());
        }

        debug!("Opened k4a device {}", index);
        Ok(K4aDevice {
            handle,
            cameras_started: false,
            imu_started: false,
        })
    }
}

/// 已打开的 k4a 设备
pub struct K4aDevice {
    handle: ffi::k4a_device_t,
    cameras_started: bool,
    imu_started: bool,
}

impl CameraDevice for K4aDevice {
    type Capture = K4aCapture;
    type Writer = K4aRecordWriter;

    fn serial_number(&self) -> Result<String, DeviceError> {
        // 第一次调用只取长度
        let mut size: size_t = 0;
        // SAFETY: 传入空缓冲区，SDK 只写回所需长度
        let result =
            unsafe { ffi::k4a_device_get_serialnum(self.handle, ptr::null_mut(), &mut size) };
        if result != ffi::K4A_BUFFER_RESULT_TOO_SMALL && result != ffi::K4A_BUFFER_RESULT_SUCCEEDED
        {
            return Err(DeviceError::backend("k4a_device_get_serialnum() returned error"));
        }

        let mut buffer = vec![0u8; size.max(1)];
        let mut size = buffer.len();
        // SAFETY: buffer 长度与 size 一致
        let result = unsafe {
            ffi::k4a_device_get_serialnum(
                self.handle,
                buffer.as_mut_ptr() as *mut c_char,
                &mut size,
            )
        };
        if result != ffi::K4A_BUFFER_RESULT_SUCCEEDED {
            return Err(DeviceError::backend("k4a_device_get_serialnum() returned error"));
        }

        CStr::from_bytes_until_nul(&buffer)
            .map(|serial| serial.to_string_lossy().into_owned())
            .map_err(|_| DeviceError::backend("serial number is not NUL-terminated"))
    }

    fn hardware_version(&self) -> Result<HardwareVersion, DeviceError> {
        let mut raw = ffi::k4a_hardware_version_t::default();
        // SAFETY: raw 是有效的输出位置
        check(
            unsafe { ffi::k4a_device_get_version(self.handle, &mut raw) },
            "k4a_device_get_version",
        )?;

        Ok(HardwareVersion {
            rgb: version(raw.rgb),
            depth: version(raw.depth),
            audio: version(raw.audio),
            depth_sensor: version(raw.depth_sensor),
            firmware_build: match raw.firmware_build {
                0 => FirmwareBuild::Release,
                _ => FirmwareBuild::Debug,
            },
            firmware_signature: match raw.firmware_signature {
                0 => FirmwareSignature::Msft,
                1 => FirmwareSignature::Test,
                _ => FirmwareSignature::Unsigned,
            },
        })
    }

    fn set_color_control(
        &mut self,
        command: ColorControlCommand,
        mode: ColorControlMode,
        value: i32,
    ) -> Result<(), DeviceError> {
        trace!("set_color_control {:?} {:?} {}", command, mode, value);
        // SAFETY: 句柄有效，枚举值与 C 定义一致
        check(
            unsafe {
                ffi::k4a_device_set_color_control(
                    self.handle,
                    command as libc::c_int,
                    mode as libc::c_int,
                    value,
                )
            },
            "k4a_device_set_color_control",
        )
    }

    fn start_cameras(&mut self, config: &DeviceConfiguration) -> Result<(), DeviceError> {
        let raw = raw_config(config);
        // SAFETY: raw 在调用期间有效
        check(
            unsafe { ffi::k4a_device_start_cameras(self.handle, &raw) },
            "k4a_device_start_cameras",
        )?;
        self.cameras_started = true;
        Ok(())
    }

    fn stop_cameras(&mut self) {
        if self.cameras_started {
            // SAFETY: 句柄有效
            unsafe { ffi::k4a_device_stop_cameras(self.handle) };
            self.cameras_started = false;
        }
    }

    fn start_imu(&mut self) -> Result<(), DeviceError> {
        if !self.cameras_started {
            return Err(DeviceError::NotStarted);
        }
        // SAFETY: 句柄有效
        check(
            unsafe { ffi::k4a_device_start_imu(self.handle) },
            "k4a_device_start_imu",
        )?;
        self.imu_started = true;
        Ok(())
    }

    fn stop_imu(&mut self) {
        if self.imu_started {
            // SAFETY: 句柄有效
            unsafe { ffi::k4a_device_stop_imu(self.handle) };
            self.imu_started = false;
        }
    }

    fn get_capture(&mut self, timeout: Duration) -> Result<K4aCapture, DeviceError> {
        let mut capture: ffi::k4a_capture_t = ptr::null_mut();
        // SAFETY: capture 是有效的输出位置
        let result =
            unsafe { ffi::k4a_device_get_capture(self.handle, &mut capture, timeout_ms(timeout)) };
        match result {
            ffi::K4A_WAIT_RESULT_SUCCEEDED => Ok(K4aCapture { handle: capture }),
            ffi::K4A_WAIT_RESULT_TIMEOUT => Err(DeviceError::Timeout),
            _ => Err(DeviceError::backend(
                "k4a_device_get_capture() returned error",
            )),
        }
    }

    fn get_imu_sample(&mut self, timeout: Duration) -> Result<ImuSample, DeviceError> {
        let mut raw = ffi::k4a_imu_sample_t::default();
        // SAFETY: raw 是有效的输出位置
        let result =
            unsafe { ffi::k4a_device_get_imu_sample(self.handle, &mut raw, timeout_ms(timeout)) };
        match result {
            ffi::K4A_WAIT_RESULT_SUCCEEDED => Ok(imu_sample(&raw)),
            ffi::K4A_WAIT_RESULT_TIMEOUT => Err(DeviceError::Timeout),
            _ => Err(DeviceError::backend(
                "k4a_device_get_imu_sample() returned error",
            )),
        }
    }

    fn create_recording(
        &self,
        path: &Path,
        config: &DeviceConfiguration,
    ) -> Result<K4aRecordWriter, DeviceError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| DeviceError::backend(format!("non UTF-8 path: {}", path.display())))?;
        let c_path = CString::new(path_str)
            .map_err(|_| DeviceError::backend("recording path contains NUL byte"))?;

        let mut handle: ffi::k4a_record_t = ptr::null_mut();
        // SAFETY: c_path 在调用期间有效，设备句柄有效
        check(
            unsafe {
                ffi::k4a_record_create(c_path.as_ptr(), self.handle, raw_config(config), &mut handle)
            },
            "k4a_record_create",
        )?;

        debug!("Created recording {}", path.display());
        Ok(K4aRecordWriter { handle })
    }
}

impl Drop for K4aDevice {
    fn drop(&mut self) {
        self.stop_imu();
        self.stop_cameras();
        // SAFETY: 句柄只在这里释放一次
        unsafe { ffi::k4a_device_close(self.handle) };
        debug!("k4a device closed");
    }
}

/// SDK capture 句柄，Drop 时释放
pub struct K4aCapture {
    handle: ffi::k4a_capture_t,
}

impl Drop for K4aCapture {
    fn drop(&mut self) {
        // SAFETY: 句柄由 get_capture 获得，只释放一次
        unsafe { ffi::k4a_capture_release(self.handle) };
    }
}

/// 录制库句柄，Drop 时关闭文件
pub struct K4aRecordWriter {
    handle: ffi::k4a_record_t,
}

impl RecordWriter for K4aRecordWriter {
    type Capture = K4aCapture;

    fn add_imu_track(&mut self) -> Result<(), DeviceError> {
        // SAFETY: 句柄有效
        check(
            unsafe { ffi::k4a_record_add_imu_track(self.handle) },
            "k4a_record_add_imu_track",
        )
    }

    fn write_header(&mut self) -> Result<(), DeviceError> {
        // SAFETY: 句柄有效
        check(
            unsafe { ffi::k4a_record_write_header(self.handle) },
            "k4a_record_write_header",
        )
    }

    fn write_capture(&mut self, capture: &K4aCapture) -> Result<(), DeviceError> {
        // SAFETY: 两个句柄都有效，录制库自行增加 capture 引用计数
        check(
            unsafe { ffi::k4a_record_write_capture(self.handle, capture.handle) },
            "k4a_record_write_capture",
        )
    }

    fn write_imu_sample(&mut self, sample: &ImuSample) -> Result<(), DeviceError> {
        // SAFETY: 句柄有效，采样按值传递
        check(
            unsafe { ffi::k4a_record_write_imu_sample(self.handle, raw_imu_sample(sample)) },
            "k4a_record_write_imu_sample",
        )
    }

    fn flush(&mut self) -> Result<(), DeviceError> {
        // SAFETY: 句柄有效
        check(
            unsafe { ffi::k4a_record_flush(self.handle) },
            "k4a_record_flush",
        )
    }
}

impl Drop for K4aRecordWriter {
    fn drop(&mut self) {
        // SAFETY: 句柄只在这里关闭一次
        unsafe { ffi::k4a_record_close(self.handle) };
    }
}
