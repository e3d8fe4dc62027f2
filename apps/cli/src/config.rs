//! 配置文件
//!
//! TOML 格式，键名与命令行长选项一致，例如：
//!
//! ```toml
//! color-mode = "720p_NV12"
//! depth-mode = "WFOV_2X2BINNED"
//! rate = "15"
//! imu = "on"
//! brightness = 60
//! ```
//!
//! 默认读取 `<config_dir>/k4arecorder/config.toml`（不存在则忽略）；
//! 命令行显式指定的值覆盖配置文件。

use crate::backend::Backend;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认配置文件路径
pub fn default_config_file() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("k4arecorder");
    path.push("config.toml");
    Some(path)
}

/// 配置文件中的录制默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub backend: Option<Backend>,
    pub device: Option<i64>,
    pub record_length: Option<i64>,
    pub color_mode: Option<String>,
    pub depth_mode: Option<String>,
    pub depth_delay: Option<i32>,
    pub rate: Option<String>,
    pub imu: Option<String>,
    pub external_sync: Option<String>,
    pub sync_delay: Option<i64>,
    pub exposure_control: Option<i64>,
    pub brightness: Option<i64>,
    pub contrast: Option<i64>,
    pub saturation: Option<i64>,
    pub sharpness: Option<i64>,
    pub whitebalance: Option<i64>,
    pub gain: Option<i64>,
}

impl FileConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// 加载配置
    ///
    /// 显式指定的路径必须存在；默认路径不存在时返回空配置。
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_file() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }
}
