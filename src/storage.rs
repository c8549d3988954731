//! 共享存储：把纯状态机包裹进一把锁，并在锁释放之后执行副作用。
//!
//! # 设计背景（Why）
//! - "在锁内计算、在锁外执行"是这条代码路径唯一被允许的纪律：`spin::Mutex` 的
//!   临界区只做 `state.rs` 里的纯计算，wake/回调一律发生在 guard 被 drop 之后，
//!   避免在持锁状态下调用任意用户代码（唤醒一个立刻重新进入本存储的 waker、
//!   或者一个重新进入的 delegate 回调都会导致死锁）。
//! - 选用 `spin::Mutex` 而不是 `std::sync::Mutex`：临界区只包含指针大小的字段搬移，
//!   不会阻塞、不会进行系统调用，且需要在 `no_std` 下可用。

use alloc::sync::Arc;
use core::task::{Context, Poll};

use crate::config::StreamOptions;
use crate::delegate::Delegate;
use crate::diagnostics::Logger;
use crate::lock::{self, RawMutex};
use crate::source::Source;
use crate::state::{Effects, Inner, PollOutcome, YieldResult};
use crate::strategy::BackPressureStrategy;
use crate::stream::Stream;

pub(crate) struct Storage<E, F, S, D> {
    inner: RawMutex<Inner<E, F, S, D>>,
    logger: Arc<dyn Logger>,
}

impl<E, F, S, D> Storage<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    fn new(strategy: S, delegate: Arc<D>, options: StreamOptions) -> Arc<Self> {
        let logger = Arc::clone(&options.logger);
        Arc::new(Self {
            inner: RawMutex::new(Inner::new(strategy, delegate, options.initial_buffer_capacity)),
            logger,
        })
    }

    pub(crate) fn yield_elements(&self, elements: impl IntoIterator<Item = E>) -> YieldResult {
        let (result, effects) = lock::lock(&self.inner).yield_elements(elements);
        self.run_effects(effects);
        result
    }

    pub(crate) fn finish(&self, failure: Option<F>) {
        let effects = lock::lock(&self.inner).finish(failure);
        self.run_effects(effects);
    }

    pub(crate) fn poll_next(&self, cx: &mut Context<'_>) -> Poll<Result<Option<E>, F>> {
        let (outcome, effects) = {
            let mut guard = lock::lock(&self.inner);
            guard.poll_next(cx.waker(), &*self.logger)
        };
        self.run_effects(effects);
        match outcome {
            PollOutcome::Ready(result) => Poll::Ready(result),
            PollOutcome::Pending => Poll::Pending,
        }
    }

    pub(crate) fn sequence_deinitialized(&self) {
        let effects = lock::lock(&self.inner).sequence_deinitialized();
        self.run_effects(effects);
    }

    pub(crate) fn iterator_initialized(&self) {
        let effects = { lock::lock(&self.inner).iterator_initialized(&*self.logger) };
        self.run_effects(effects);
    }

    pub(crate) fn iterator_deinitialized(&self) {
        let effects = { lock::lock(&self.inner).iterator_deinitialized(&*self.logger) };
        self.run_effects(effects);
    }

    pub(crate) fn cancelled(&self) {
        let effects = lock::lock(&self.inner).cancelled();
        self.run_effects(effects);
    }

    /// 在锁释放之后执行迁移产生的副作用，顺序固定为：唤醒等待者、通知生产者、
    /// 通知终止——与规范里"先解除阻塞的消费者，再通知生产者"的顺序一致。
    fn run_effects(&self, effects: Effects<E, F, D>) {
        if let Some(waker) = effects.wake {
            waker.wake();
        }
        if let Some(delegate) = effects.produce_more {
            delegate.produce_more();
        }
        if let Some(delegate) = effects.did_terminate {
            delegate.did_terminate();
        }
    }
}

/// 构造一对单播流端点：生产者持有 [`Source`]，消费者持有 [`Stream`]。
///
/// # 契约说明（What）
/// - 两端共享同一个 [`Storage`]，彼此之间除了这把锁之外没有任何直接引用；
/// - `delegate` 在流进入终态之前随时可能被调用，调用方必须保证其回调不会
///   重新进入 `source`/`stream` 的任何方法，否则会在 `spin::Mutex` 上死锁。
pub fn make_stream<E, F, S, D>(
    strategy: S,
    delegate: D,
    options: StreamOptions,
) -> (Source<E, F, S, D>, Stream<E, F, S, D>)
where
    S: BackPressureStrategy,
    D: Delegate,
{
    let storage = Storage::new(strategy, Arc::new(delegate), options);
    (Source::new(Arc::clone(&storage)), Stream::new(storage))
}
