//! 单把锁的后端选择：默认用 `spin::Mutex`（no_std 可用、不阻塞、不做系统调用）；
//! 在 `--cfg loom` 下切换成 `loom::sync::Mutex`，以便 loom 的调度穷举能够
//! 观测到临界区入口/出口，对应 `tests/loom_concurrency.rs` 里的并发模型。
//!
//! 两个后端都只暴露 `new`/`lock`，调用方（`storage.rs`）不关心具体类型。

#[cfg(not(loom))]
pub(crate) type RawMutex<T> = spin::Mutex<T>;

#[cfg(loom)]
pub(crate) type RawMutex<T> = loom::sync::Mutex<T>;

#[cfg(not(loom))]
pub(crate) fn lock<T>(mutex: &RawMutex<T>) -> spin::MutexGuard<'_, T> {
    mutex.lock()
}

#[cfg(loom)]
pub(crate) fn lock<T>(mutex: &RawMutex<T>) -> loom::sync::MutexGuard<'_, T> {
    mutex.lock().expect("spark-stream storage mutex poisoned")
}
