//! 构造期配置：本 crate 唯一可配置的表面。
//!
//! # 设计背景（Why）
//! - 流一旦构造完成便不存在运行时可重载的配置层（没有文件、没有热更新），
//!   背压策略本身就是流控配置；这里只保留一个容量提示，避免首次 `yield`
//!   触发缓冲区重新分配。

use alloc::sync::Arc;
use core::fmt;

use crate::diagnostics::{Logger, NoopLogger};

/// 构造 [`crate::make_stream`] 时使用的选项。
#[derive(Clone)]
#[non_exhaustive]
pub struct StreamOptions {
    /// 内部 FIFO 缓冲的初始容量提示；0 表示使用默认分配策略。
    pub initial_buffer_capacity: usize,
    pub(crate) logger: Arc<dyn Logger>,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self {
            initial_buffer_capacity: 0,
            logger: Arc::new(NoopLogger),
        }
    }

    /// 设置初始容量提示。
    pub fn with_initial_buffer_capacity(mut self, capacity: usize) -> Self {
        self.initial_buffer_capacity = capacity;
        self
    }

    /// 注入中止路径使用的日志后端；默认是 [`NoopLogger`]。
    pub fn with_logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("initial_buffer_capacity", &self.initial_buffer_capacity)
            .finish_non_exhaustive()
    }
}
