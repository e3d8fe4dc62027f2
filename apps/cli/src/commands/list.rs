//! 列出已连接的设备

use k4a_device::DeviceProvider;
use k4a_record::list_devices;

/// 每台设备一行，没有设备时打印提示
pub fn execute<P>(provider: &P)
where
    P: DeviceProvider + ?Sized,
{
    let devices = list_devices(provider);
    if devices.is_empty() {
        println!("No devices connected.");
        return;
    }

    for device in devices {
        println!("{}", device);
    }
}
