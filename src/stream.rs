//! 消费者句柄：只负责"生成迭代器"与"在自身析构时上报"。
//!
//! # 设计背景（Why）
//! - 原始设计里序列值可以被多次持有/复制，`sequence_deinitialized` 在最后一份
//!   引用析构时触发；本 crate 的 [`Stream`] 是单一所有者句柄（不可 `Clone`），
//!   所以它自身的 `Drop` 就是那"最后一份引用"的析构时机——调用
//!   [`into_iterator`](Stream::into_iterator) 会立刻消费并析构这个句柄，
//!   而对应的事件在 `iterator_created` 已置位时是无操作的，恰好复现了
//!   "先有迭代器、流句柄再消失"这条路径。

use alloc::sync::Arc;

use crate::delegate::Delegate;
use crate::storage::Storage;
use crate::strategy::BackPressureStrategy;
use crate::stream_iterator::StreamIterator;

/// 流的消费者端点，最多产生一个 [`StreamIterator`]。
pub struct Stream<E, F, S, D> {
    storage: Arc<Storage<E, F, S, D>>,
}

impl<E, F, S, D> Stream<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    pub(crate) fn new(storage: Arc<Storage<E, F, S, D>>) -> Self {
        Self { storage }
    }

    /// 消费该句柄，生成一个迭代器。
    ///
    /// # Panics
    /// 理论上不可达：`Stream` 不可 `Clone`，本方法按值消费 `self`，类型系统已
    /// 保证每个流至多调用一次。保留运行时检查仅作为防御性冗余（详见
    /// [`crate::state`] 中 `iterator_initialized` 的说明）。
    pub fn into_iterator(self) -> StreamIterator<E, F, S, D> {
        self.storage.iterator_initialized();
        StreamIterator::new(Arc::clone(&self.storage))
    }
}

impl<E, F, S, D> Drop for Stream<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    fn drop(&mut self) {
        self.storage.sequence_deinitialized();
    }
}
