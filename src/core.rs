//! Core ring buffer storage - slot array, cursors and the size estimator
//!
//! 核心环形缓冲区存储 - 槽位数组、游标和大小估算
//!
//! This module holds everything the producer and consumer handles share:
//! - The slot array, one `AtomicUsize` per slot, `EMPTY` meaning "no value"
//! - Capacity and mask for power-of-two index wrapping
//! - Producer and consumer cursor groups, each on its own cache line
//!
//! 此模块包含生产者和消费者句柄共享的全部内容：
//! - 槽位数组，每个槽位一个 `AtomicUsize`，`EMPTY` 表示"无值"
//! - 用于 2 的幂次索引环绕的容量和掩码
//! - 生产者和消费者游标组，各自位于独立的缓存行

use crate::error::CapacityError;
use crate::handle::EMPTY;
use crate::shim::atomic::{AtomicUsize, Ordering};
use crate::shim::spin_loop;
use crate::trace::debug;
use crossbeam_utils::CachePadded;

/// Cursor group written only by the producer
///
/// 仅由生产者写入的游标组
pub(crate) struct ProducerCursor {
    /// Count of values ever enqueued (monotonically increasing, wrapping)
    ///
    /// 已入队值的总数（单调递增，可回绕）
    pub(crate) tail: AtomicUsize,
}

/// Cursor group written only by the consumer
///
/// 仅由消费者写入的游标组
pub(crate) struct ConsumerCursor {
    /// Count of values ever dequeued (monotonically increasing, wrapping)
    ///
    /// 已出队值的总数（单调递增，可回绕）
    pub(crate) head: AtomicUsize,
}

/// Core ring buffer storage structure
///
/// 核心环形缓冲区存储结构
///
/// The slot array is its own heap allocation, so neither cursor group can share a
/// cache line with the slots either.
///
/// 槽位数组是独立的堆分配，因此两个游标组也不会与槽位共享缓存行。
pub struct RingCore {
    producer: CachePadded<ProducerCursor>,
    consumer: CachePadded<ConsumerCursor>,

    /// Slot storage, `EMPTY` or one handle word per slot
    ///
    /// 槽位存储，每个槽位为 `EMPTY` 或一个句柄字
    slots: Box<[AtomicUsize]>,

    /// Capacity (power of 2)
    ///
    /// 容量（2 的幂次）
    capacity: usize,

    /// Mask for fast modulo operation (capacity - 1)
    ///
    /// 快速取模运算的掩码（capacity - 1）
    mask: usize,
}

impl RingCore {
    /// Create a new core with exactly `capacity` empty slots
    ///
    /// 创建恰好包含 `capacity` 个空槽位的新核心
    ///
    /// # Errors
    /// `CapacityError::Zero` for `0`, `CapacityError::NotPowerOfTwo` for anything the
    /// mask could not index correctly, `CapacityError::Alloc` when the slot array
    /// cannot be allocated.
    ///
    /// # 错误
    /// 容量为 `0` 时返回 `CapacityError::Zero`，非 2 的幂次时返回
    /// `CapacityError::NotPowerOfTwo`，槽位数组无法分配时返回 `CapacityError::Alloc`。
    pub fn new(capacity: usize) -> Result<Self, CapacityError> {
        if capacity == 0 {
            return Err(CapacityError::Zero);
        }
        if !capacity.is_power_of_two() {
            return Err(CapacityError::NotPowerOfTwo(capacity));
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| CapacityError::Alloc(capacity))?;
        slots.extend((0..capacity).map(|_| AtomicUsize::new(EMPTY)));
        let slots = slots.into_boxed_slice();
        debug!(capacity, "ring created");

        Ok(Self {
            producer: CachePadded::new(ProducerCursor {
                tail: AtomicUsize::new(0),
            }),
            consumer: CachePadded::new(ConsumerCursor {
                head: AtomicUsize::new(0),
            }),
            slots,
            capacity,
            mask: capacity - 1,
        })
    }

    /// Get the capacity of the buffer
    ///
    /// 获取缓冲区容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn tail(&self) -> &AtomicUsize {
        &self.producer.tail
    }

    #[inline]
    pub(crate) fn head(&self) -> &AtomicUsize {
        &self.consumer.head
    }

    /// Slot for an unmasked cursor value
    ///
    /// 未掩码游标值对应的槽位
    #[inline]
    pub(crate) fn slot(&self, cursor: usize) -> &AtomicUsize {
        // `mask < slots.len()` so the index is always in bounds.
        &self.slots[cursor & self.mask]
    }

    /// Approximate number of values currently enqueued
    ///
    /// 当前入队值数量的近似值
    ///
    /// `head` and `tail` cannot be read as one atomic pair, so this reads
    /// head, tail, head and retries until both head reads agree. The result is
    /// clamped to `[0, capacity]`.
    ///
    /// `head` 和 `tail` 无法作为一个原子对读取，因此依次读取 head、tail、head，
    /// 直到两次 head 读取一致。结果被限制在 `[0, capacity]` 内。
    pub fn size(&self) -> usize {
        let mut head_after = self.head().load(Ordering::Acquire);
        loop {
            let head_before = head_after;
            let tail = self.tail().load(Ordering::Acquire);
            head_after = self.head().load(Ordering::Acquire);

            if head_after == head_before {
                let size = tail.wrapping_sub(head_after);
                if (size as isize) < 0 {
                    return 0;
                }
                return size.min(self.capacity);
            }
            spin_loop();
        }
    }
}

// Handles still in the slots belong to the caller; only the slot array is freed.
#[cfg(feature = "tracing")]
impl Drop for RingCore {
    fn drop(&mut self) {
        debug!(
            capacity = self.capacity,
            leftover = self.leftover(),
            "ring destroyed"
        );
    }
}

#[cfg(feature = "tracing")]
impl RingCore {
    /// Handles still enqueued, read without synchronization
    ///
    /// 仍在队列中的句柄数量（无同步读取）
    fn leftover(&mut self) -> usize {
        let head = self.consumer.head.load(Ordering::Relaxed);
        let tail = self.producer.tail.load(Ordering::Relaxed);
        tail.wrapping_sub(head)
    }
}
