//! `libk4a` / `libk4arecord` 的 C 接口声明
//!
//! 只声明录制工具用到的函数。结构体布局与 `k4atypes.h` 保持一致。

#![allow(non_camel_case_types)]

use libc::{c_char, c_int, c_void, size_t};

pub type k4a_device_t = *mut c_void;
pub type k4a_capture_t = *mut c_void;
pub type k4a_record_t = *mut c_void;

pub type k4a_result_t = c_int;
pub const K4A_RESULT_SUCCEEDED: k4a_result_t = 0;

pub type k4a_buffer_result_t = c_int;
pub const K4A_BUFFER_RESULT_SUCCEEDED: k4a_buffer_result_t = 0;
pub const K4A_BUFFER_RESULT_TOO_SMALL: k4a_buffer_result_t = 2;

pub type k4a_wait_result_t = c_int;
pub const K4A_WAIT_RESULT_SUCCEEDED: k4a_wait_result_t = 0;
pub const K4A_WAIT_RESULT_TIMEOUT: k4a_wait_result_t = 2;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct k4a_version_t {
    pub major: u32,
    pub minor: u32,
    pub iteration: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct k4a_hardware_version_t {
    pub rgb: k4a_version_t,
    pub depth: k4a_version_t,
    pub audio: k4a_version_t,
    pub depth_sensor: k4a_version_t,
    pub firmware_build: c_int,
    pub firmware_signature: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct k4a_device_configuration_t {
    pub color_format: c_int,
    pub color_resolution: c_int,
    pub depth_mode: c_int,
    pub camera_fps: c_int,
    pub synchronized_images_only: bool,
    pub depth_delay_off_color_usec: i32,
    pub wired_sync_mode: c_int,
    pub subordinate_delay_off_master_usec: u32,
    pub disable_streaming_indicator: bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct k4a_float3_t {
    pub v: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct k4a_imu_sample_t {
    pub temperature: f32,
    pub acc_sample: k4a_float3_t,
    pub acc_timestamp_usec: u64,
    pub gyro_sample: k4a_float3_t,
    pub gyro_timestamp_usec: u64,
}

#[link(name = "k4a")]
unsafe extern "C" {
    pub fn k4a_device_get_installed_count() -> u32;

    pub fn k4a_device_open(index: u32, device_handle: *mut k4a_device_t) -> k4a_result_t;

    pub fn k4a_device_close(device_handle: k4a_device_t);

    pub fn k4a_device_get_serialnum(
        device_handle: k4a_device_t,
        serial_number: *mut c_char,
        serial_number_size: *mut size_t,
    ) -> k4a_buffer_result_t;

    pub fn k4a_device_get_version(
        device_handle: k4a_device_t,
        version: *mut k4a_hardware_version_t,
    ) -> k4a_result_t;

    pub fn k4a_device_set_color_control(
        device_handle: k4a_device_t,
        command: c_int,
        mode: c_int,
        value: i32,
    ) -> k4a_result_t;

    pub fn k4a_device_start_cameras(
        device_handle: k4a_device_t,
        config: *const k4a_device_configuration_t,
    ) -> k4a_result_t;

    pub fn k4a_device_stop_cameras(device_handle: k4a_device_t);

    pub fn k4a_device_start_imu(device_handle: k4a_device_t) -> k4a_result_t;

    pub fn k4a_device_stop_imu(device_handle: k4a_device_t);

    pub fn k4a_device_get_capture(
        device_handle: k4a_device_t,
        capture_handle: *mut k4a_capture_t,
        timeout_in_ms: i32,
    ) -> k4a_wait_result_t;

    pub fn k4a_device_get_imu_sample(
        device_handle: k4a_device_t,
        imu_sample: *mut k4a_imu_sample_t,
        timeout_in_ms: i32,
    ) -> k4a_wait_result_t;

    pub fn k4a_capture_release(capture_handle: k4a_capture_t);
}

#[link(name = "k4arecord")]
unsafe extern "C" {
    pub fn k4a_record_create(
        path: *const c_char,
        device: k4a_device_t,
        device_config: k4a_device_configuration_t,
        recording_handle: *mut k4a_record_t,
    ) -> k4a_result_t;

    pub fn k4a_record_add_imu_track(recording_handle: k4a_record_t) -> k4a_result_t;

    pub fn k4a_record_write_header(recording_handle: k4a_record_t) -> k4a_result_t;

    pub fn k4a_record_write_capture(
        recording_handle: k4a_record_t,
        capture_handle: k4a_capture_t,
    ) -> k4a_result_t;

    pub fn k4a_record_write_imu_sample(
        recording_handle: k4a_record_t,
        imu_sample: k4a_imu_sample_t,
    ) -> k4a_result_t;

    pub fn k4a_record_flush(recording_handle: k4a_record_t) -> k4a_result_t;

    pub fn k4a_record_close(recording_handle: k4a_record_t);
}
