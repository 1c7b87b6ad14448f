// 缓存模块
// 天气快照按键保存为 resp/ 目录下的文件

mod atomic;
pub mod keys;
mod snapshot;

pub use atomic::write_atomic;
pub use snapshot::{CacheError, SnapshotCache};
