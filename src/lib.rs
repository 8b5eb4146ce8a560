//! # Lock-Free SPSC Handle Ring
//!
//! 无锁 SPSC 句柄环形缓冲区
//!
//! `slotring` is a bounded lock-free Single Producer Single Consumer (SPSC) ring buffer
//! that moves opaque pointer-sized handles between exactly two threads.
//!
//! `slotring` 是一个有界的单生产者单消费者（SPSC）无锁环形缓冲区，
//! 用于在恰好两个线程之间传递不透明的指针大小句柄。
//!
//! ## Features
//!
//! 特性
//!
//! - **Lock-Free** - `offer` and `poll` never block, never spin and never allocate
//! - **Split Handles** - `Producer` can only offer, `Consumer` can only poll
//! - **No False Sharing** - Producer and consumer cursors live on separate cache lines
//! - **Cached Head** - The producer reads the consumer's cursor only when the ring looks full
//! - **Opaque Values** - Handles are carried as words; the ring never dereferences or drops them
//!
//! - **无锁设计** - `offer` 和 `poll` 从不阻塞、自旋或分配内存
//! - **拆分句柄** - `Producer` 只能 offer，`Consumer` 只能 poll
//! - **无伪共享** - 生产者和消费者游标位于不同的缓存行
//! - **缓存 head** - 生产者只在缓冲区看起来已满时才读取消费者游标
//! - **不透明值** - 句柄以机器字传递，缓冲区从不解引用或 drop 它们
//!
//! ## Quick Start
//!
//! 快速开始
//!
//! ```rust
//! use slotring::{OfferError, PollError, spsc};
//!
//! // Capacity must be a power of two
//! // 容量必须是 2 的幂次
//! let (mut producer, mut consumer) = spsc::new::<usize>(2).unwrap();
//!
//! producer.offer(42).unwrap();
//! producer.offer(100).unwrap();
//! assert_eq!(producer.offer(7), Err(OfferError::Full(7)));
//!
//! // `0` is the reserved empty sentinel
//! // `0` 是保留的空哨兵
//! assert_eq!(producer.offer(0), Err(OfferError::InvalidInput));
//!
//! assert_eq!(consumer.poll(), Ok(42));
//! assert_eq!(consumer.poll(), Ok(100));
//! assert_eq!(consumer.poll(), Err(PollError::Empty));
//! ```
//!
//! ## Multi-threaded Usage
//!
//! 多线程使用
//!
//! Raw pointers are valid handles. The ring moves the pointer, ownership of the
//! pointee is up to the caller.
//!
//! 裸指针是合法的句柄。缓冲区只移动指针，被指向对象的所有权由调用者管理。
//!
//! ```rust
//! use slotring::spsc;
//! use std::thread;
//!
//! let (mut producer, mut consumer) = spsc::new::<*mut String>(32).unwrap();
//!
//! let producer_handle = thread::spawn(move || {
//!     for i in 0..100 {
//!         let mut msg = Box::into_raw(Box::new(format!("Message {}", i)));
//!         while let Err(err) = producer.offer(msg) {
//!             msg = err.into_inner().unwrap();
//!             thread::yield_now();
//!         }
//!     }
//! });
//!
//! let consumer_handle = thread::spawn(move || {
//!     let mut received = Vec::new();
//!     while received.len() < 100 {
//!         match consumer.poll() {
//!             Ok(ptr) => received.push(*unsafe { Box::from_raw(ptr) }),
//!             Err(_) => thread::yield_now(),
//!         }
//!     }
//!     received
//! });
//!
//! producer_handle.join().unwrap();
//! let messages = consumer_handle.join().unwrap();
//! assert_eq!(messages.len(), 100);
//! assert_eq!(messages[99], "Message 99");
//! ```
//!
//! ## Notes
//!
//! 注意事项
//!
//! - `spsc::new` rejects capacities that are zero or not a power of two; use
//!   `spsc::with_capacity_rounded` to round up instead
//! - `size()` is a best-effort snapshot, always within `[0, capacity]`
//! - Handles left in the ring when both halves are dropped are not freed
//! - Build with `--features tracing` for diagnostics and `--features loom` for model checking
//!
//! - `spsc::new` 拒绝为零或非 2 的幂次的容量；使用 `spsc::with_capacity_rounded` 可向上取整
//! - `size()` 是尽力而为的快照，始终在 `[0, capacity]` 范围内
//! - 两端都被 drop 时缓冲区中剩余的句柄不会被释放
//! - 使用 `--features tracing` 启用诊断，使用 `--features loom` 进行模型检查

pub mod error;
pub mod handle;
pub mod spsc;
pub mod trace;
mod core;
mod shim;

pub use error::{CapacityError, OfferError, PollError};
pub use handle::Handle;
pub use spsc::{Consumer, Drain, Producer};
pub use trace::init_tracing;
