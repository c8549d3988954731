#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "spark-stream: 单播、带背压的异步流桥接核心。"]
#![doc = ""]
#![doc = "== 定位 =="]
#![doc = "本 crate 只实现桥接同步生产者（例如运行在 I/O 线程上的网络管道回调）与单个异步消费者的核心状态机；"]
#![doc = "事件循环接入、具体传输协议、具体背压策略均被视为外部协作者，不在本 crate 之内。"]
#![doc = ""]
#![doc = "== 内存分配依赖 =="]
#![doc = "核心状态机依赖 `alloc` 中的 `VecDeque`/`Arc`/`Box` 来承载缓冲与共享所有权；纯无堆环境不受支持。"]

extern crate alloc;

mod buffer;
mod diagnostics;
mod lock;
mod state;
mod storage;

pub mod config;
pub mod delegate;
pub mod infallible;
pub mod prelude;
pub mod source;
pub mod strategy;
pub mod stream;
pub mod stream_iterator;
pub mod test_stubs;

pub use config::StreamOptions;
pub use delegate::Delegate;
pub use diagnostics::{LogRecord, Logger, NoopLogger};
#[cfg(feature = "std")]
pub use diagnostics::StderrLogger;
pub use source::{Source, YieldResult};
pub use storage::make_stream;
pub use strategy::BackPressureStrategy;
pub use stream::Stream;
pub use stream_iterator::StreamIterator;
