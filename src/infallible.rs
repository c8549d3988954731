//! 非抛出变体：`Failure = core::convert::Infallible` 时的零成本门面。
//!
//! # 设计背景（Why）
//! - 并非所有生产者都会失败；当调用方选择 `Infallible` 作为失败类型时，
//!   `next()` 的 `Result<Option<E>, Infallible>` 里 `Err` 分支静态不可达。
//!   这里不重新实现一套状态机，只是在类型边界上把那个不可能的分支折叠掉，
//!   让调用方可以直接 `.await` 得到 `Option<E>`。

use core::convert::Infallible;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use crate::delegate::Delegate;
use crate::strategy::BackPressureStrategy;
use crate::stream_iterator::{NextFuture, StreamIterator};

/// 为 `Failure = Infallible` 的 [`StreamIterator`] 提供 `next_infallible`。
pub trait InfallibleStreamIteratorExt<E, S, D> {
    /// 等价于 [`StreamIterator::next`]，但直接返回 `Option<E>`。
    fn next_infallible(&mut self) -> InfallibleNext<'_, E, S, D>;
}

impl<E, S, D> InfallibleStreamIteratorExt<E, S, D> for StreamIterator<E, Infallible, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    fn next_infallible(&mut self) -> InfallibleNext<'_, E, S, D> {
        InfallibleNext { inner: self.next() }
    }
}

/// 包裹 [`NextFuture`]，把 `Result<Option<E>, Infallible>` 折叠为 `Option<E>`。
pub struct InfallibleNext<'a, E, S, D> {
    inner: NextFuture<'a, E, Infallible, S, D>,
}

impl<'a, E, S, D> Future for InfallibleNext<'a, E, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    type Output = Option<E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = Pin::into_inner(self);
        match Pin::new(&mut this.inner).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            Poll::Ready(Err(never)) => match never {},
            Poll::Pending => Poll::Pending,
        }
    }
}
