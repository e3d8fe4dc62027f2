//! 停止请求
//!
//! 录制循环轮询 [`StopFlag`]，信号处理器调用 [`StopFlag::request_stop`]。
//! 第一次请求进入优雅停止；如果录制端迟迟不退出，超过 [`FORCE_EXIT_AFTER`]
//! 之后的再次请求升级为强制退出，由调用方决定如何退出进程。

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 第一次停止请求之后，再次请求升级为强制退出所需的间隔
pub const FORCE_EXIT_AFTER: Duration = Duration::from_secs(1);

/// 一次停止请求的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// 第一次请求：录制循环会在下一次轮询时退出
    Graceful,
    /// 优雅停止已超时：调用方应立即以失败状态退出
    Force,
    /// 重复请求（仍在等待窗口内，或录制已自行结束）
    Ignored,
}

struct Inner {
    stopping: AtomicBool,
    /// 第一次外部请求的时间；录制自行结束时保持 `None`
    first_request: Mutex<Option<Instant>>,
}

/// 进程内共享的停止标志
///
/// 克隆后指向同一个标志，可以直接移入信号处理闭包。
#[derive(Clone)]
pub struct StopFlag {
    inner: Arc<Inner>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                stopping: AtomicBool::new(false),
                first_request: Mutex::new(None),
            }),
        }
    }

    /// 外部（通常是 Ctrl-C）请求停止
    pub fn request_stop(&self) -> StopRequest {
        self.request_stop_at(Instant::now())
    }

    pub(crate) fn request_stop_at(&self, now: Instant) -> StopRequest {
        let mut first_request = self.inner.first_request.lock();
        match *first_request {
            None => {
                if self.inner.stopping.swap(true, Ordering::SeqCst) {
                    // 录制已经自行结束，只剩保存阶段
                    return StopRequest::Ignored;
                }
                *first_request = Some(now);
                StopRequest::Graceful
            },
            Some(at) if now.saturating_duration_since(at) > FORCE_EXIT_AFTER => StopRequest::Force,
            Some(_) => StopRequest::Ignored,
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    /// 录制循环自行结束时调用
    ///
    /// 返回 `true` 表示此前没有任何停止请求（由调用方补充提示）。
    pub fn mark_stopped(&self) -> bool {
        !self.inner.stopping.swap(true, Ordering::SeqCst)
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopFlag")
            .field("stopping", &self.is_stopping())
            .field("first_request", &*self.inner.first_request.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_is_graceful() {
        let flag = StopFlag::new();
        assert!(!flag.is_stopping());
        assert_eq!(flag.request_stop(), StopRequest::Graceful);
        assert!(flag.is_stopping());
    }

    #[test]
    fn test_repeat_within_window_is_ignored() {
        let flag = StopFlag::new();
        let t0 = Instant::now();
        assert_eq!(flag.request_stop_at(t0), StopRequest::Graceful);
        assert_eq!(
            flag.request_stop_at(t0 + Duration::from_millis(500)),
            StopRequest::Ignored
        );
        assert_eq!(flag.request_stop_at(t0 + FORCE_EXIT_AFTER), StopRequest::Ignored);
    }

    #[test]
    fn test_repeat_after_window_forces() {
        let flag = StopFlag::new();
        let t0 = Instant::now();
        flag.request_stop_at(t0);
        assert_eq!(
            flag.request_stop_at(t0 + Duration::from_millis(1001)),
            StopRequest::Force
        );
        // 升级之后仍然保持 Force
        assert_eq!(
            flag.request_stop_at(t0 + Duration::from_secs(5)),
            StopRequest::Force
        );
    }

    #[test]
    fn test_request_after_self_stop_is_ignored() {
        let flag = StopFlag::new();
        assert!(flag.mark_stopped());
        assert!(!flag.mark_stopped());

        let t0 = Instant::now();
        assert_eq!(flag.request_stop_at(t0), StopRequest::Ignored);
        assert_eq!(flag.request_stop_at(t0 + Duration::from_secs(10)), StopRequest::Ignored);
    }

    #[test]
    fn test_mark_stopped_after_request() {
        let flag = StopFlag::new();
        flag.request_stop();
        assert!(!flag.mark_stopped());
    }

    #[test]
    fn test_clones_share_state() {
        let flag = StopFlag::new();
        let handler_copy = flag.clone();
        std::thread::spawn(move || {
            handler_copy.request_stop();
        })
        .join()
        .unwrap();
        assert!(flag.is_stopping());
    }
}
