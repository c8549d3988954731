//! 核心状态机：纯函数、不加锁、不做 I/O，唯一负责在 `(state, event)` 上
//! 计算 `(state', effects)`。
//!
//! # 设计背景（Why）
//! - 三个独立角色（同步生产者、单个异步消费者、生命周期信号）都要通过同一把锁收敛到
//!   这里；把"做什么"（本模块）与"谁来做、何时做"（`storage` 模块）拆开，
//!   critical section 才能保持极短，且可以在没有 `Waker`/执行器的情况下单元测试。
//! - 迁移输出用 [`Effects`] 这样的数据值表达副作用，而不是直接回调，
//!   这样状态机本身永不调用外部代码、永不加锁、除缓冲区追加外不分配内存。
//!
//! # 不变量
//! - I2：Streaming 中 waiter 存在 ⇒ buffer 为空。
//! - I3/I4：一旦进入 Finished，delegate 被清空，且不再产生任何回调 Effects。
//! - I5：同一时刻只允许一个存活的迭代器；违反时通过 [`crate::diagnostics::programmer_error`] 中止进程。
//! - I6：`outstanding_demand` 始终等于策略最近一次被外部观察到的返回值。
//!
//! 本模块不使用显式的 `Modifying` 哨兵变体：变体间迁移通过
//! `core::mem::replace(&mut self.state, State::Finished)` 把旧变体的字段移出，
//! 在同一个函数调用内计算新变体并写回——因为调用方始终持有独占锁，
//! 这个中间状态永远不会被锁之外的任何观察者看到。

use alloc::sync::Arc;
use core::task::Waker;

use crate::buffer::ElementBuffer;
use crate::delegate::Delegate;
use crate::diagnostics::{self, Logger};
use crate::strategy::BackPressureStrategy;

/// `yield` 的返回结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum YieldResult {
    /// 策略认为缓冲深度仍然健康，生产者可以继续生产。
    ProduceMore,
    /// 策略要求生产者暂停。
    StopProducing,
    /// 流已经结束（`SourceFinished`/`Finished`），元素被直接丢弃。
    Dropped,
}

/// `next()` 的 poll 结果：要么立刻有值，要么需要挂起。
pub(crate) enum PollOutcome<E, F> {
    Ready(Result<Option<E>, F>),
    Pending,
}

/// 一次迁移产生的、需要在锁释放之后执行的副作用。
pub(crate) struct Effects<E, F, D> {
    /// 需要被唤醒的等待者（已经把结果写入它能读到的位置）。
    pub(crate) wake: Option<Waker>,
    /// 需要调用 `produce_more` 的 delegate（`None` 表示本次不触发）。
    pub(crate) produce_more: Option<Arc<D>>,
    /// 需要调用 `did_terminate` 的 delegate。
    pub(crate) did_terminate: Option<Arc<D>>,
    _marker: core::marker::PhantomData<fn() -> (E, F)>,
}

impl<E, F, D> Effects<E, F, D> {
    fn none() -> Self {
        Self {
            wake: None,
            produce_more: None,
            did_terminate: None,
            _marker: core::marker::PhantomData,
        }
    }
}

/// 状态机本体：持有状态标签、delegate 弱引用（以 `Arc` 强引用表达，迁移到
/// Finished 时清空）以及"已交付但尚未被对应 Future 取走"的一次性结果槽。
pub(crate) struct Inner<E, F, S, D> {
    state: State<E, F, S>,
    delegate: Option<Arc<D>>,
    /// 当生产者/finish/cancel 路径在另一个线程上解除了被挂起的 waiter 时，
    /// 结果先被写到这里，再由拥有该 waiter 的那个 Future 在下一次 poll 时取走。
    delivered: Option<Result<Option<E>, F>>,
}

enum State<E, F, S> {
    Initial {
        strategy: S,
        iterator_created: bool,
        initial_buffer_capacity: usize,
    },
    Streaming {
        strategy: S,
        buffer: ElementBuffer<E>,
        waiter: Option<Waker>,
        outstanding_demand: bool,
        iterator_created: bool,
    },
    SourceFinished {
        buffer: ElementBuffer<E>,
        iterator_created: bool,
        failure: Option<F>,
    },
    Finished,
}

impl<E, F, S, D> Inner<E, F, S, D>
where
    S: BackPressureStrategy,
    D: Delegate,
{
    pub(crate) fn new(strategy: S, delegate: Arc<D>, initial_buffer_capacity: usize) -> Self {
        Self {
            state: State::Initial {
                strategy,
                iterator_created: false,
                initial_buffer_capacity,
            },
            delegate: Some(delegate),
            delivered: None,
        }
    }

    fn component() -> &'static str {
        "spark_stream::state"
    }

    // ---- Source::yield --------------------------------------------------

    pub(crate) fn yield_elements(
        &mut self,
        elements: impl IntoIterator<Item = E>,
    ) -> (YieldResult, Effects<E, F, D>) {
        let state = core::mem::replace(&mut self.state, State::Finished);
        match state {
            State::Initial {
                mut strategy,
                iterator_created,
                initial_buffer_capacity,
            } => {
                let mut buffer = ElementBuffer::with_capacity(initial_buffer_capacity);
                buffer.extend(elements);
                let produce_more = strategy.on_yield(buffer.len());
                self.state = State::Streaming {
                    strategy,
                    buffer,
                    waiter: None,
                    outstanding_demand: produce_more,
                    iterator_created,
                };
                (yield_result(produce_more), Effects::none())
            }
            State::Streaming {
                mut strategy,
                mut buffer,
                waiter,
                iterator_created,
                ..
            } => {
                let mut effects = Effects::none();
                let mut elements = elements.into_iter();
                let delivered = match waiter {
                    Some(waker) if buffer.is_empty() => {
                        // I2: waiter present ⇒ buffer empty; the first yielded
                        // element resumes the waiter directly, the rest fill the buffer.
                        let first = elements.next();
                        buffer.extend(elements);
                        effects.wake = Some(waker);
                        first
                    }
                    other => {
                        // No waiter (or, defensively, a waiter that somehow
                        // coexists with a non-empty buffer) — just append.
                        buffer.extend(elements);
                        if let Some(waker) = other {
                            // Unreachable under I2, but don't leak a registered waker.
                            effects.wake = Some(waker);
                        }
                        None
                    }
                };
                if let Some(element) = delivered {
                    self.delivered = Some(Ok(Some(element)));
                }
                let produce_more = strategy.on_yield(buffer.len());
                self.state = State::Streaming {
                    strategy,
                    buffer,
                    waiter: None,
                    outstanding_demand: produce_more,
                    iterator_created,
                };
                (yield_result(produce_more), effects)
            }
            finished @ (State::SourceFinished { .. } | State::Finished) => {
                self.state = finished;
                (YieldResult::Dropped, Effects::none())
            }
        }
    }

    // ---- Source::finish ---------------------------------------------------

    pub(crate) fn finish(&mut self, failure: Option<F>) -> Effects<E, F, D> {
        let state = core::mem::replace(&mut self.state, State::Finished);
        match state {
            State::Initial { iterator_created, .. } => {
                self.state = State::SourceFinished {
                    buffer: ElementBuffer::new(),
                    iterator_created,
                    failure,
                };
                Effects::none()
            }
            State::Streaming {
                waiter: Some(waker),
                buffer,
                ..
            } => {
                debug_assert!(buffer.is_empty(), "I2: waiter present implies empty buffer");
                let result = match failure {
                    Some(f) => Err(f),
                    None => Ok(None),
                };
                self.delivered = Some(result);
                self.state = State::Finished;
                Effects {
                    wake: Some(waker),
                    produce_more: None,
                    did_terminate: self.delegate.take(),
                    _marker: core::marker::PhantomData,
                }
            }
            State::Streaming {
                buffer,
                iterator_created,
                ..
            } => {
                self.state = State::SourceFinished {
                    buffer,
                    iterator_created,
                    failure,
                };
                Effects::none()
            }
            finished @ (State::SourceFinished { .. } | State::Finished) => {
                self.state = finished;
                Effects::none()
            }
        }
    }

    // ---- Iterator::next (step A + step B collapsed into one poll) --------
    //
    // `&mut StreamIterator` on the public `next()` method makes two
    // concurrently in-flight `next()` calls a compile error, not a runtime
    // condition — Rust's aliasing rules subsume the invariant the original
    // design enforced at runtime. The only way `poll_next` ever observes a
    // `Streaming` state with an existing `waiter` is a re-poll of the same
    // still-pending future (ordinary executor behaviour: spurious wakeups,
    // `select!` re-polling unfinished branches, …), so that case just
    // refreshes the stored waker instead of treating it as a violation.

    pub(crate) fn poll_next(
        &mut self,
        waker: &Waker,
        logger: &dyn Logger,
    ) -> (PollOutcome<E, F>, Effects<E, F, D>) {
        if let Some(result) = self.delivered.take() {
            return (PollOutcome::Ready(result), Effects::none());
        }

        let state = core::mem::replace(&mut self.state, State::Finished);
        match state {
            State::Initial {
                strategy,
                iterator_created,
                initial_buffer_capacity,
            } => {
                self.state = State::Streaming {
                    strategy,
                    buffer: ElementBuffer::with_capacity(initial_buffer_capacity),
                    waiter: Some(waker.clone()),
                    outstanding_demand: false,
                    iterator_created,
                };
                // Parking on an empty buffer still counts as a consume event at depth 0.
                let (outstanding_demand, produce_more_effect) =
                    self.register_waiter_consume(logger);
                let _ = outstanding_demand;
                (PollOutcome::Pending, produce_more_effect)
            }
            State::Streaming {
                strategy,
                buffer,
                waiter: Some(existing_waker),
                outstanding_demand,
                iterator_created,
            } => {
                // Re-poll of the still-parked future: only replace the stored
                // waker if it would not wake the same task, per the `Future`
                // contract (`Waker::will_wake`).
                let waiter = if existing_waker.will_wake(waker) {
                    existing_waker
                } else {
                    waker.clone()
                };
                self.state = State::Streaming {
                    strategy,
                    buffer,
                    waiter: Some(waiter),
                    outstanding_demand,
                    iterator_created,
                };
                (PollOutcome::Pending, Effects::none())
            }
            State::Streaming {
                mut strategy,
                mut buffer,
                outstanding_demand,
                iterator_created,
                ..
            } if !buffer.is_empty() => {
                let element = buffer.pop_front().expect("checked non-empty above");
                let new_demand = strategy.on_consume(buffer.len());
                let edge = new_demand && !outstanding_demand;
                let mut effects = Effects::none();
                if edge {
                    effects.produce_more = self.delegate.clone();
                }
                self.state = State::Streaming {
                    strategy,
                    buffer,
                    waiter: None,
                    outstanding_demand: new_demand,
                    iterator_created,
                };
                (PollOutcome::Ready(Ok(Some(element))), effects)
            }
            State::Streaming {
                strategy,
                buffer,
                outstanding_demand,
                iterator_created,
                ..
            } => {
                // Empty buffer, no waiter yet: park.
                self.state = State::Streaming {
                    strategy,
                    buffer,
                    waiter: Some(waker.clone()),
                    outstanding_demand,
                    iterator_created,
                };
                let (_, produce_more_effect) = self.register_waiter_consume(logger);
                (PollOutcome::Pending, produce_more_effect)
            }
            State::SourceFinished {
                mut buffer,
                iterator_created,
                failure,
            } if !buffer.is_empty() => {
                let element = buffer.pop_front().expect("checked non-empty above");
                self.state = State::SourceFinished {
                    buffer,
                    iterator_created,
                    failure,
                };
                (PollOutcome::Ready(Ok(Some(element))), Effects::none())
            }
            State::SourceFinished { failure, .. } => {
                self.state = State::Finished;
                let result = match failure {
                    Some(f) => Err(f),
                    None => Ok(None),
                };
                let effects = Effects {
                    wake: None,
                    produce_more: None,
                    did_terminate: self.delegate.take(),
                    _marker: core::marker::PhantomData,
                };
                (PollOutcome::Ready(result), effects)
            }
            State::Finished => {
                self.state = State::Finished;
                (PollOutcome::Ready(Ok(None)), Effects::none())
            }
        }
    }

    /// Shared tail of the two "park" branches of `poll_next`: run
    /// `on_consume(0)` and report an edge-triggered `produce_more`, mirroring
    /// spec step B. Must be called only while `self.state` is `Streaming`
    /// with a freshly-registered waiter.
    fn register_waiter_consume(&mut self, _logger: &dyn Logger) -> (bool, Effects<E, F, D>) {
        let State::Streaming {
            strategy,
            outstanding_demand,
            ..
        } = &mut self.state
        else {
            unreachable!("register_waiter_consume called outside Streaming");
        };
        let previous = *outstanding_demand;
        let new_demand = strategy.on_consume(0);
        *outstanding_demand = new_demand;
        let mut effects = Effects::none();
        if new_demand && !previous {
            effects.produce_more = self.delegate.clone();
        }
        (new_demand, effects)
    }

    // ---- lifecycle events --------------------------------------------------

    pub(crate) fn sequence_deinitialized(&mut self) -> Effects<E, F, D> {
        let state = core::mem::replace(&mut self.state, State::Finished);
        match state {
            State::Initial { iterator_created, .. }
            | State::Streaming { iterator_created, .. }
            | State::SourceFinished { iterator_created, .. }
                if !iterator_created =>
            {
                self.state = State::Finished;
                self.delivered = None;
                Effects {
                    wake: None,
                    produce_more: None,
                    did_terminate: self.delegate.take(),
                    _marker: core::marker::PhantomData,
                }
            }
            other => {
                self.state = other;
                Effects::none()
            }
        }
    }

    pub(crate) fn iterator_initialized(&mut self, logger: &dyn Logger) -> Effects<E, F, D> {
        match &mut self.state {
            State::Initial { iterator_created, .. }
            | State::Streaming { iterator_created, .. }
            | State::SourceFinished { iterator_created, .. } => {
                if *iterator_created {
                    diagnostics::programmer_error(
                        logger,
                        Self::component(),
                        "a second iterator was created for a unicast stream (I5)",
                    );
                }
                *iterator_created = true;
                Effects::none()
            }
            State::Finished => Effects::none(),
        }
    }

    pub(crate) fn iterator_deinitialized(&mut self, logger: &dyn Logger) -> Effects<E, F, D> {
        let state = core::mem::replace(&mut self.state, State::Finished);
        match state {
            State::Initial { iterator_created, .. }
            | State::Streaming { iterator_created, .. }
            | State::SourceFinished { iterator_created, .. }
                if !iterator_created =>
            {
                diagnostics::programmer_error(
                    logger,
                    Self::component(),
                    "iterator_deinitialized observed before iterator_initialized; impossible by \
                     construction",
                );
            }
            State::Finished => {
                self.state = State::Finished;
                Effects::none()
            }
            _non_finished_with_iterator => {
                self.state = State::Finished;
                self.delivered = None;
                Effects {
                    wake: None,
                    produce_more: None,
                    did_terminate: self.delegate.take(),
                    _marker: core::marker::PhantomData,
                }
            }
        }
    }

    pub(crate) fn cancelled(&mut self) -> Effects<E, F, D> {
        let state = core::mem::replace(&mut self.state, State::Finished);
        match state {
            State::Streaming { waiter, .. } => {
                self.state = State::Finished;
                // A concurrent `yield` may have already resolved `waiter` and
                // stashed its result in `self.delivered` (see `yield_elements`);
                // that result never reaches a consumer now, so drop it rather
                // than let the next `next()` observe a post-cancellation value.
                self.delivered = None;
                Effects {
                    wake: waiter,
                    produce_more: None,
                    did_terminate: self.delegate.take(),
                    _marker: core::marker::PhantomData,
                }
            }
            State::Initial { .. } => {
                self.state = State::Finished;
                self.delivered = None;
                Effects {
                    wake: None,
                    produce_more: None,
                    did_terminate: self.delegate.take(),
                    _marker: core::marker::PhantomData,
                }
            }
            finished @ (State::SourceFinished { .. } | State::Finished) => {
                self.state = finished;
                Effects::none()
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    #[cfg(test)]
    pub(crate) fn buffer_len(&self) -> usize {
        match &self.state {
            State::Streaming { buffer, .. } => buffer.len(),
            State::SourceFinished { buffer, .. } => buffer.len(),
            _ => 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn has_waiter(&self) -> bool {
        matches!(&self.state, State::Streaming { waiter: Some(_), .. })
    }
}

fn yield_result(produce_more: bool) -> YieldResult {
    if produce_more {
        YieldResult::ProduceMore
    } else {
        YieldResult::StopProducing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{LogRecord, NoopLogger};
    use core::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal strategy for tests: always asks the producer to keep going.
    struct AlwaysTrue;

    impl BackPressureStrategy for AlwaysTrue {
        fn on_yield(&mut self, _depth: usize) -> bool {
            true
        }
        fn on_consume(&mut self, _depth: usize) -> bool {
            true
        }
    }

    /// Strategy that demands after the first consume only (used to exercise
    /// the edge-triggered `produce_more` logic).
    struct DemandAfterFirstConsume {
        consumed: usize,
    }

    impl BackPressureStrategy for DemandAfterFirstConsume {
        fn on_yield(&mut self, _depth: usize) -> bool {
            false
        }
        fn on_consume(&mut self, _depth: usize) -> bool {
            self.consumed += 1;
            self.consumed >= 1
        }
    }

    #[derive(Default)]
    struct CountingDelegate {
        produce_more: AtomicUsize,
        did_terminate: AtomicUsize,
    }

    impl Delegate for CountingDelegate {
        fn produce_more(&self) {
            self.produce_more.fetch_add(1, Ordering::SeqCst);
        }
        fn did_terminate(&self) {
            self.did_terminate.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn inner<S: BackPressureStrategy>(
        strategy: S,
        delegate: Arc<CountingDelegate>,
    ) -> Inner<u32, &'static str, S, CountingDelegate> {
        Inner::new(strategy, delegate, 0)
    }

    #[test]
    fn yield_before_any_poll_buffers_the_element() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        let (result, effects) = state.yield_elements([1u32]);
        assert_eq!(result, YieldResult::ProduceMore);
        assert!(effects.wake.is_none());
        assert_eq!(state.buffer_len(), 1);
    }

    #[test]
    fn poll_then_yield_resumes_the_parked_waiter_without_buffering() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        let waker = futures::task::noop_waker();
        let (outcome, _effects) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(outcome, PollOutcome::Pending));
        assert!(state.has_waiter());

        let (result, effects) = state.yield_elements([7u32]);
        assert_eq!(result, YieldResult::ProduceMore);
        assert!(effects.wake.is_some(), "I2: resuming the waiter must wake it");
        assert_eq!(state.buffer_len(), 0, "element handed directly to the waiter, not buffered");
    }

    #[test]
    fn repolling_a_still_parked_future_just_refreshes_the_waker() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        let waker = futures::task::noop_waker();
        let (first, _) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(first, PollOutcome::Pending));
        // A second poll while nothing has been yielded must stay Pending
        // without aborting — this models an executor re-polling spuriously.
        let (second, effects) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(second, PollOutcome::Pending));
        assert!(effects.produce_more.is_none());
        assert!(state.has_waiter());
    }

    #[test]
    fn finish_with_no_pending_elements_resolves_to_none() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, Arc::clone(&delegate));
        let effects = state.finish(None);
        assert!(effects.did_terminate.is_some());
        assert!(state.is_finished());

        let waker = futures::task::noop_waker();
        let (outcome, _) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(outcome, PollOutcome::Ready(Ok(None))));
    }

    #[test]
    fn finish_resolves_a_parked_waiter_immediately() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        let waker = futures::task::noop_waker();
        let (outcome, _) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(outcome, PollOutcome::Pending));

        let effects = state.finish(Some("boom"));
        assert!(effects.wake.is_some());
        assert!(effects.did_terminate.is_some());
        assert!(state.is_finished());
    }

    #[test]
    fn source_finished_drains_buffered_elements_before_terminal_value() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, Arc::clone(&delegate));
        state.yield_elements([1u32, 2u32]);
        state.finish(None);
        assert!(!state.is_finished(), "buffered elements still pending delivery");

        let waker = futures::task::noop_waker();
        let (first, _) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(first, PollOutcome::Ready(Ok(Some(1)))));
        let (second, _) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(second, PollOutcome::Ready(Ok(Some(2)))));
        assert!(!state.is_finished());
        let (third, effects) = state.poll_next(&waker, &NoopLogger);
        assert!(matches!(third, PollOutcome::Ready(Ok(None))));
        assert!(effects.did_terminate.is_some());
        assert!(state.is_finished());
    }

    #[test]
    fn produce_more_fires_only_on_the_false_to_true_edge() {
        let delegate = Arc::new(CountingDelegate::default());
        let strategy = DemandAfterFirstConsume { consumed: 0 };
        let mut state = inner(strategy, Arc::clone(&delegate));
        state.yield_elements([1u32, 2u32]);

        let waker = futures::task::noop_waker();
        let (_, effects_a) = state.poll_next(&waker, &NoopLogger);
        assert!(effects_a.produce_more.is_some(), "false -> true edge must fire");
        let (_, effects_b) = state.poll_next(&waker, &NoopLogger);
        assert!(effects_b.produce_more.is_none(), "true -> true is not an edge");
        assert_eq!(delegate.produce_more.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn yield_after_finish_is_dropped() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        state.finish(None);
        let (result, _) = state.yield_elements([1u32]);
        assert_eq!(result, YieldResult::Dropped);
    }

    #[test]
    fn cancelled_while_parked_terminates_and_resolves_none() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, Arc::clone(&delegate));
        let waker = futures::task::noop_waker();
        state.poll_next(&waker, &NoopLogger);

        let effects = state.cancelled();
        assert!(effects.wake.is_some());
        assert!(effects.did_terminate.is_some());
        assert!(state.is_finished());
        assert_eq!(delegate.did_terminate.load(Ordering::SeqCst), 0, "caller invokes it, not the state machine");
    }

    #[test]
    fn cancelled_after_a_racing_yield_drops_the_stashed_delivery() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, Arc::clone(&delegate));
        let waker = futures::task::noop_waker();
        state.poll_next(&waker, &NoopLogger);

        // A producer resumes the parked waiter before the consumer re-polls;
        // the element lands in `delivered`, not the buffer (I2).
        let (_, yield_effects) = state.yield_elements([1u32]);
        assert!(yield_effects.wake.is_some());
        assert_eq!(state.buffer_len(), 0);

        // The consumer drops the future instead of re-polling it.
        let cancel_effects = state.cancelled();
        assert!(cancel_effects.did_terminate.is_some());
        assert!(state.is_finished());

        // A later `next()` on the surviving iterator must observe
        // end-of-stream, never the element that was in flight (P7).
        let (outcome, _) = state.poll_next(&waker, &NoopLogger);
        assert!(
            matches!(outcome, PollOutcome::Ready(Ok(None))),
            "cancellation must discard any value stashed for the dropped waiter"
        );
    }

    #[test]
    fn sequence_deinitialized_before_iterator_created_terminates() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        let effects = state.sequence_deinitialized();
        assert!(effects.did_terminate.is_some());
        assert!(state.is_finished());
    }

    #[test]
    fn sequence_deinitialized_after_iterator_created_is_a_no_op() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        state.iterator_initialized(&NoopLogger);
        let effects = state.sequence_deinitialized();
        assert!(effects.did_terminate.is_none());
        assert!(!state.is_finished());
    }

    #[test]
    #[should_panic(expected = "a second iterator was created")]
    fn second_iterator_initialized_aborts() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        state.iterator_initialized(&NoopLogger);
        state.iterator_initialized(&NoopLogger);
    }

    #[test]
    fn programmer_error_logs_through_the_injected_logger_before_aborting() {
        use alloc::string::{String, ToString};
        use std::sync::Mutex;

        struct CapturingLogger {
            messages: Mutex<alloc::vec::Vec<String>>,
        }

        impl Logger for CapturingLogger {
            fn log(&self, record: LogRecord<'_>) {
                self.messages.lock().unwrap().push(record.to_string());
            }
        }

        let logger = CapturingLogger {
            messages: Mutex::new(alloc::vec::Vec::new()),
        };
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        state.iterator_initialized(&logger);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            state.iterator_initialized(&logger);
        }));
        assert!(result.is_err(), "second iterator_initialized must panic");

        let messages = logger.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("a second iterator was created"));
    }

    #[test]
    fn iterator_deinitialized_terminates_and_clears_delegate() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        state.iterator_initialized(&NoopLogger);
        let effects = state.iterator_deinitialized(&NoopLogger);
        assert!(effects.did_terminate.is_some());
        assert!(state.is_finished());
    }

    #[test]
    fn iterator_deinitialized_after_finished_is_a_no_op() {
        let delegate = Arc::new(CountingDelegate::default());
        let mut state = inner(AlwaysTrue, delegate);
        state.iterator_initialized(&NoopLogger);
        state.finish(None);
        let waker = futures::task::noop_waker();
        state.poll_next(&waker, &NoopLogger);
        assert!(state.is_finished());
        let effects = state.iterator_deinitialized(&NoopLogger);
        assert!(effects.did_terminate.is_none());
    }
}
