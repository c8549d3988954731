//! 背压策略契约：生产者是否应该继续生产，由策略依据缓冲深度决定。
//!
//! # 设计背景（Why）
//! - 具体策略（高低水位、令牌桶等）是外部协作者，本 crate 只定义契约并附带两个
//!   测试用的参考实现，不把任何一种策略固化为默认行为。
//!
//! # 契约说明（What）
//! - `on_yield`/`on_consume` 每个事件最多被调用一次，调用时已持有状态机的锁；
//!   实现必须同步返回，不得阻塞、分配、或回调流对象本身。

/// 背压策略：在追加或弹出之后告知生产者是否应继续生产。
///
/// # 前置/后置条件（Contract）
/// - **前置**：`depth` 为本次追加/弹出之后缓冲区的实际长度；
/// - **后置**：返回值立即成为新的 `outstanding_demand`，由调用方（状态机）比较新旧值以判断是否跳变。
pub trait BackPressureStrategy: Send + 'static {
    /// 在向缓冲追加元素之后调用，`depth` 为追加后的长度。
    fn on_yield(&mut self, depth: usize) -> bool;

    /// 在从缓冲弹出元素之后调用，`depth` 为弹出后的长度；
    /// 若消费者在空缓冲上挂起，`depth` 固定为 0。
    fn on_consume(&mut self, depth: usize) -> bool;
}
