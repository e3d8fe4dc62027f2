//! 设备后端选择

use anyhow::Result;
use clap::ValueEnum;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// 编译了硬件后端时使用硬件后端
    #[default]
    Auto,
    /// 厂商 SDK（libk4a / libk4arecord）
    K4a,
    /// 模拟设备
    Mock,
}

/// 模拟设备数量（仅 mock 后端）
#[cfg(feature = "mock")]
pub const MOCK_DEVICES_ENV: &str = "K4ARECORDER_MOCK_DEVICES";

/// 对所选后端的设备提供者执行操作
///
/// `DeviceProvider` 带关联类型，不能做成 trait object，
/// 因此用宏在每个分支里分别实例化。
macro_rules! with_provider {
    ($backend:expr, |$provider:ident| $body:expr) => {{
        match $crate::backend::resolve($backend)? {
            #[cfg(feature = "k4a")]
            $crate::backend::Backend::K4a => {
                let $provider = k4a_device::K4aProvider;
                $body
            },
            #[cfg(feature = "mock")]
            $crate::backend::Backend::Mock => {
                let $provider = $crate::backend::mock_provider()?;
                $body
            },
            other => anyhow::bail!("Backend {:?} is not available in this build", other),
        }
    }};
}

pub(crate) use with_provider;

/// 把 `Auto` 解析为具体后端，并检查所选后端是否已编译
pub fn resolve(backend: Backend) -> Result<Backend> {
    match backend {
        Backend::Auto if cfg!(feature = "k4a") => Ok(Backend::K4a),
        Backend::Auto => anyhow::bail!(
            "No hardware backend compiled in (rebuild with the `k4a` feature, or pass --backend mock)"
        ),
        Backend::K4a if !cfg!(feature = "k4a") => {
            anyhow::bail!("The k4a backend requires the `k4a` feature")
        },
        Backend::Mock if !cfg!(feature = "mock") => {
            anyhow::bail!("The mock backend requires the `mock` feature")
        },
        other => Ok(other),
    }
}

#[cfg(feature = "mock")]
pub fn mock_provider() -> Result<k4a_device::MockProvider> {
    use anyhow::Context;

    let count = match std::env::var(MOCK_DEVICES_ENV) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {}", MOCK_DEVICES_ENV, value))?,
        Err(_) => 1,
    };
    Ok(k4a_device::MockProvider::with_devices(count))
}
