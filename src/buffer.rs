//! FIFO 元素缓冲：在生产者与消费者之间保存尚未被拉取的元素。
//!
//! # 契约说明（What）
//! - 仅支持尾部追加与头部弹出；不提供随机访问或重排序能力，
//!   因为乱序/优先级重排被规范显式列为 Non-goal。

use alloc::collections::VecDeque;

/// 底层由 [`VecDeque`] 承载，摊还 O(1) 的入队/出队成本。
pub(crate) struct ElementBuffer<E> {
    inner: VecDeque<E>,
}

impl<E> ElementBuffer<E> {
    pub(crate) fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: VecDeque::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub(crate) fn extend(&mut self, elements: impl IntoIterator<Item = E>) {
        self.inner.extend(elements);
    }

    pub(crate) fn pop_front(&mut self) -> Option<E> {
        self.inner.pop_front()
    }
}
