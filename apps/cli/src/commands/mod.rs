//! 命令实现

pub mod list;
pub mod record;

pub use record::RecordArgs;
