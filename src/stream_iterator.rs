//! 消费者迭代器：持有 `&mut self` 语义的 `next()`，把挂起/恢复折叠进标准
//! `Future::poll`。
//!
//! # 设计背景（Why）
//! - 原始（基于延续回调）的设计里，"决定挂起"与"登记延续"是锁下两个独立的阶段，
//!   因为延续对象要等调用方后续代码运行到某处才被捕获。Rust 的 `Future::poll`
//!   在被调用的那一刻就同步拿到 `Waker`，两个阶段天然重合为一次 `poll` 调用，
//!   详见 [`crate::state::Inner::poll_next`]。
//! - `next(&mut self)` 的签名本身就保证了"同一时刻至多一个进行中的 next()"：
//!   返回的 [`NextFuture`] 独占借用了 `&mut StreamIterator`，第二次调用
//!   `next()` 在它存活期间根本无法通过借用检查，对应规范里的 P2/I5。
//! - 取消被建模为 `Future::drop`：在 `.await` 处被取消（例如外层 `select!`
//!   或超时）会在挂起期间丢弃 [`NextFuture`]，其 `Drop` 据此上报 `cancelled`,
//!   而不是引入一个显式的取消令牌。

use alloc::sync::Arc;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use crate::delegate::Delegate;
use crate::storage::Storage;
use crate::strategy::BackPressureStrategy;

/// 流的消费者端点，由 [`crate::Stream::into_iterator`] 产生，至多存在一个。
pub struct StreamIterator<E, F, S, D> {
    storage: Arc<Storage<E, F, S, D>>,
}

impl<E, F, S, D> StreamIterator<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    pub(crate) fn new(storage: Arc<Storage<E, F, S, D>>) -> Self {
        Self { storage }
    }

    /// 拉取下一个元素；`Ok(None)` 表示流已正常结束，`Err(_)` 携带失败原因。
    ///
    /// 返回的 future 在被 drop 时，如果仍处于挂起状态，会把整条流终止——
    /// 镜像了只存在一个悬挂点的异步序列里"取消即终止"的语义。
    pub fn next(&mut self) -> NextFuture<'_, E, F, S, D> {
        NextFuture {
            storage: &self.storage,
            parked: false,
        }
    }
}

impl<E, F, S, D> Drop for StreamIterator<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    fn drop(&mut self) {
        self.storage.iterator_deinitialized();
    }
}

/// 由 [`StreamIterator::next`] 返回的一次性 future。
pub struct NextFuture<'a, E, F, S, D> {
    storage: &'a Arc<Storage<E, F, S, D>>,
    /// 本次 poll 是否已经把一个 waker 挂进了共享状态、且尚未被解除。
    parked: bool,
}

impl<'a, E, F, S, D> Future for NextFuture<'a, E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    type Output = Result<Option<E>, F>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // No field here is self-referential or address-sensitive, so moving
        // `Self` around after this point is sound.
        let this = Pin::into_inner(self);
        let result = this.storage.poll_next(cx);
        this.parked = result.is_pending();
        result
    }
}

impl<'a, E, F, S, D> Drop for NextFuture<'a, E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    fn drop(&mut self) {
        if self.parked {
            self.storage.cancelled();
        }
    }
}
