//! # K4A Record
//!
//! 录制工具的业务层，建立在 `k4a-device` 的 trait 之上（与具体后端无关）：
//!
//! - [`stop`]：停止标志，支持优雅停止和超时后的强制退出
//! - [`controls`]：彩色相机控制项下发
//! - [`enumerate`]：列出已连接的设备
//! - [`session`]：一次完整的录制流程 [`do_recording`]

pub mod controls;
pub mod enumerate;
mod error;
pub mod session;
pub mod stop;

pub use controls::{ControlFailure, apply_color_settings};
pub use enumerate::{DeviceListing, ListingStatus, list_devices};
pub use error::RecordError;
pub use session::{
    FIRST_CAPTURE_TIMEOUT, RecordingOptions, RecordingSummary, SUBORDINATE_FIRST_CAPTURE_TIMEOUT,
    SessionEvent, SessionHook, StopReason, TracingHook, do_recording,
};
pub use stop::{FORCE_EXIT_AFTER, StopFlag, StopRequest};
