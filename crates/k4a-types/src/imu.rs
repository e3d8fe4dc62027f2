//! IMU 采样

/// 单个 IMU 采样（加速度计 + 陀螺仪）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuSample {
    /// 传感器温度（摄氏度）
    pub temperature: f32,
    /// 加速度（m/s²），XYZ
    pub acc: [f32; 3],
    /// 加速度计设备时间戳（微秒）
    pub acc_timestamp_usec: u64,
    /// 角速度（rad/s），XYZ
    pub gyro: [f32; 3],
    /// 陀螺仪设备时间戳（微秒）
    pub gyro_timestamp_usec: u64,
}
