//! 生产者侧回调契约：状态机在释放锁之后，通过 [`Delegate`] 通知生产者。
//!
//! # 契约说明（What）
//! - `produce_more` 仅在需求由 false 跳变为 true、且由消费者侧事件（`next`）触发时调用，
//!   绝不会作为 `yield` 的结果被调用；
//! - `did_terminate` 在整个生命周期内恰好被调用一次，调用发生在触发终态迁移的那个线程上，
//!   且在锁已经释放之后。

/// 生产者侧回调。实现不得在回调内部重新进入同一个流的任何操作，否则会与内部锁死锁。
pub trait Delegate: Send + Sync + 'static {
    /// 需求从“停止生产”跳变为“继续生产”时调用。
    fn produce_more(&self);

    /// 流进入终态时调用，整个生命周期内保证只调用一次。
    fn did_terminate(&self);
}
