//! 彩色相机控制下发
//!
//! 控制项下发失败只记录警告，不中断录制。

use k4a_device::CameraDevice;
use k4a_types::{ColorControlCommand, ColorControlMode, ColorSettings};
use tracing::{debug, warn};

/// 一条下发失败的控制命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlFailure {
    pub command: ColorControlCommand,
    pub mode: ColorControlMode,
    pub value: i32,
    pub message: String,
}

impl std::fmt::Display for ControlFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            ColorControlMode::Auto => "auto",
            ColorControlMode::Manual => "manual",
        };
        write!(
            f,
            "Runtime error: k4a_device_set_color_control() for {} {} failed",
            mode,
            self.command.name()
        )
    }
}

/// 按顺序下发所有彩色控制项，返回失败的部分
pub fn apply_color_settings<D>(device: &mut D, settings: &ColorSettings) -> Vec<ControlFailure>
where
    D: CameraDevice + ?Sized,
{
    let mut failures = Vec::new();

    for (command, mode, value) in settings.commands() {
        debug!("set_color_control {:?} {:?} {}", command, mode, value);
        if let Err(e) = device.set_color_control(command, mode, value) {
            let failure = ControlFailure {
                command,
                mode,
                value,
                message: e.to_string(),
            };
            warn!("{}: {}", failure, failure.message);
            failures.push(failure);
        }
    }

    failures
}
