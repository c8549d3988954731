//! 生产者句柄：生产者线程通过它向流投递元素、通知结束。
//!
//! # 契约说明（What）
//! - [`Source`] 内部只持有一个 `Arc`，可以自由 `Clone` 并在多个生产者线程间共享；
//!   所有方法都通过 [`crate::storage::Storage`] 的锁序列化，调用方不需要自己加锁。

use alloc::sync::Arc;

use crate::delegate::Delegate;
use crate::storage::Storage;
use crate::strategy::BackPressureStrategy;

pub use crate::state::YieldResult;

/// 流的生产者端点。
pub struct Source<E, F, S, D> {
    storage: Arc<Storage<E, F, S, D>>,
}

impl<E, F, S, D> Source<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    pub(crate) fn new(storage: Arc<Storage<E, F, S, D>>) -> Self {
        Self { storage }
    }

    /// 投递单个元素。
    ///
    /// 返回值告知生产者是否应当继续生产；流结束后的投递会被直接丢弃并返回
    /// [`YieldResult::Dropped`]。
    pub fn yield_one(&self, element: E) -> YieldResult {
        self.storage.yield_elements(core::iter::once(element))
    }

    /// 投递一批元素；语义上等价于依次 `yield_one`，但只在锁下做一次临界区。
    pub fn yield_all(&self, elements: impl IntoIterator<Item = E>) -> YieldResult {
        self.storage.yield_elements(elements)
    }

    /// 正常结束流，不携带失败原因。
    pub fn finish(&self) {
        self.storage.finish(None);
    }

    /// 以失败原因结束流；缓冲中尚未被消费的元素仍会先被交付。
    pub fn finish_with(&self, failure: F) {
        self.storage.finish(Some(failure));
    }
}

impl<E, F, S, D> Clone for Source<E, F, S, D> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}
