//! Lock-free SPSC ring of opaque handles
//!
//! 无锁 SPSC 不透明句柄环形缓冲区
//!
//! [`new`] splits a ring into a [`Producer`] that may only `offer` and a [`Consumer`]
//! that may only `poll`. Both handles are `Send` but not `Clone`, and both mutating
//! operations take `&mut self`, so a second producer or consumer cannot be written in
//! safe code.
//!
//! [`new`] 将环形缓冲区拆分为只能 `offer` 的 [`Producer`] 和只能 `poll` 的
//! [`Consumer`]。两个句柄都是 `Send` 但不是 `Clone`，且修改操作都需要 `&mut self`，
//! 因此在安全代码中无法写出第二个生产者或消费者。
//!
//! # Ordering
//!
//! ```text
//! Producer stores slot (Release), then tail (Release)  ->  consumer Acquire-loads slot
//! Consumer clears slot, then Release-stores head       ->  producer Acquire-loads head
//! ```
//!
//! The consumer detects data by inspecting the slot itself and never reads `tail`.
use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;

use super::core::RingCore;
use crate::error::{CapacityError, OfferError, PollError};
use crate::handle::{EMPTY, Handle};
use crate::shim::atomic::Ordering;
use crate::shim::sync::Arc;
use crate::trace::{trace, warn};

/// Producer half of the ring buffer
///
/// 环形缓冲区的生产者端
pub struct Producer<T> {
    /// Shared core
    ///
    /// 共享核心
    core: Arc<RingCore>,

    /// Cached head index for performance (avoid reading the consumer's cursor on every offer)
    ///
    /// 缓存的 head 索引以提升性能（避免每次 offer 都读取消费者游标）
    cached_head: usize,

    // Handles are carried as plain words and never dereferenced, so the halves stay
    // `Send` even for raw pointer handles.
    _marker: PhantomData<fn(T) -> T>,
}

/// Consumer half of the ring buffer
///
/// 环形缓冲区的消费者端
pub struct Consumer<T> {
    core: Arc<RingCore>,
    _marker: PhantomData<fn(T) -> T>,
}

/// Draining iterator for the ring buffer
///
/// 环形缓冲区的消费迭代器
///
/// Polls until the ring reports empty. The drained handles are returned to the
/// caller, who remains responsible for whatever they refer to.
///
/// 持续 poll 直到缓冲区为空。取出的句柄返回给调用者，其引用的资源仍由调用者负责。
pub struct Drain<'a, T: Handle> {
    consumer: &'a mut Consumer<T>,
}

impl<T: Handle> Iterator for Drain<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.consumer.poll().ok()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        // The producer may keep adding while we drain.
        (self.consumer.size(), None)
    }
}

/// Create a new ring buffer with exactly `capacity` slots
///
/// 创建恰好包含 `capacity` 个槽位的新环形缓冲区
///
/// # Errors
/// Returns [`CapacityError`] when `capacity` is zero, not a power of two, or too
/// large to allocate.
///
/// # 错误
/// 当 `capacity` 为零、不是 2 的幂次或无法分配时返回 [`CapacityError`]。
///
/// # Examples
///
/// ```
/// use slotring::spsc;
///
/// let (mut producer, mut consumer) = spsc::new::<usize>(4).unwrap();
/// producer.offer(17).unwrap();
/// assert_eq!(consumer.poll(), Ok(17));
/// assert!(spsc::new::<usize>(6).is_err());
/// ```
pub fn new<T: Handle>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), CapacityError> {
    let core = Arc::new(RingCore::new(capacity)?);

    let producer = Producer {
        core: core.clone(),
        cached_head: 0,
        _marker: PhantomData,
    };

    let consumer = Consumer {
        core,
        _marker: PhantomData,
    };

    Ok((producer, consumer))
}

/// Create a new ring buffer, rounding `capacity` up to the next power of two
///
/// 创建新的环形缓冲区，容量向上取整到下一个 2 的幂次
///
/// # Errors
/// `CapacityError::NotPowerOfTwo` when the rounded capacity would overflow `usize`,
/// `CapacityError::Alloc` when the slot array cannot be allocated.
///
/// # 错误
/// 取整后的容量溢出 `usize` 时返回 `CapacityError::NotPowerOfTwo`，
/// 槽位数组无法分配时返回 `CapacityError::Alloc`。
pub fn with_capacity_rounded<T: Handle>(
    capacity: NonZero<usize>,
) -> Result<(Producer<T>, Consumer<T>), CapacityError> {
    let requested = capacity.get();
    let rounded = requested
        .checked_next_power_of_two()
        .ok_or(CapacityError::NotPowerOfTwo(requested))?;
    new(rounded)
}

impl<T: Handle> Producer<T> {
    /// Get the capacity of the buffer
    ///
    /// 获取缓冲区容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Approximate number of values in the buffer, see [`Consumer::size`]
    ///
    /// 缓冲区中值数量的近似值，参见 [`Consumer::size`]
    #[inline]
    pub fn size(&self) -> usize {
        self.core.size()
    }

    /// Alias for [`Producer::size`]
    ///
    /// [`Producer::size`] 的别名
    #[inline]
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Check if the buffer is empty
    ///
    /// 检查缓冲区是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Check if the buffer is full
    ///
    /// 检查缓冲区是否已满
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() == self.core.capacity()
    }

    /// Get the number of free slots in the buffer
    ///
    /// 获取缓冲区中的空闲空间数量
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.core.capacity() - self.size()
    }

    /// Offer a value to the buffer
    ///
    /// 向缓冲区提供一个值
    ///
    /// Never waits: a full ring is reported immediately and the value handed back.
    ///
    /// 从不等待：缓冲区已满时立即报告并返还该值。
    ///
    /// # Errors
    /// - `OfferError::InvalidInput` if the value maps to the empty sentinel
    /// - `OfferError::Full` if no slot is free given the latest consumer progress
    ///
    /// # 错误
    /// - 如果值映射为空哨兵则返回 `OfferError::InvalidInput`
    /// - 如果根据最新的消费者进度没有空闲槽位则返回 `OfferError::Full`
    #[inline]
    pub fn offer(&mut self, value: T) -> Result<(), OfferError<T>> {
        let raw = value.into_raw();
        if raw == EMPTY {
            warn!("rejected offer of the empty sentinel");
            return Err(OfferError::InvalidInput);
        }

        let capacity = self.core.capacity();
        let tail = self.core.tail().load(Ordering::Relaxed);

        // Check against the cached head first; only touch the consumer's cache line
        // when the ring looks full.
        // 先与缓存的 head 比较；只有缓冲区看起来已满时才访问消费者的缓存行
        if tail.wrapping_sub(self.cached_head) >= capacity {
            let head = self.core.head().load(Ordering::Acquire);
            if tail.wrapping_sub(head) >= capacity {
                trace!(tail, head, "ring full");
                // SAFETY: `raw` came from `into_raw` on `T` and is not `EMPTY`.
                return Err(OfferError::Full(unsafe { T::from_raw(raw) }));
            }
            self.cached_head = head;
        }

        self.core.slot(tail).store(raw, Ordering::Release);
        self.core.tail().store(tail.wrapping_add(1), Ordering::Release);

        Ok(())
    }
}

impl<T: Handle> Consumer<T> {
    /// Poll the oldest value from the buffer
    ///
    /// 从缓冲区取出最早的值
    ///
    /// # Errors
    /// Returns `PollError::Empty` if the buffer is empty
    ///
    /// # 错误
    /// 如果缓冲区空则返回 `PollError::Empty`
    #[inline]
    pub fn poll(&mut self) -> Result<T, PollError> {
        let head = self.core.head().load(Ordering::Relaxed);
        let slot = self.core.slot(head);

        let raw = slot.load(Ordering::Acquire);
        if raw == EMPTY {
            return Err(PollError::Empty);
        }

        // The clear is ordered before the producer's next write to this slot by the
        // Release store of `head` below.
        slot.store(EMPTY, Ordering::Relaxed);
        self.core.head().store(head.wrapping_add(1), Ordering::Release);

        // SAFETY: only `Producer::offer` stores non-`EMPTY` words, each from `into_raw`
        // on `T`.
        Ok(unsafe { T::from_raw(raw) })
    }

    /// Approximate number of values in the buffer
    ///
    /// 缓冲区中值数量的近似值
    ///
    /// Best effort under concurrency, but always within `[0, capacity]` and exact when
    /// neither side is mid-operation.
    ///
    /// 并发下尽力而为，但始终在 `[0, capacity]` 范围内，且在双方都未进行操作时精确。
    #[inline]
    pub fn size(&self) -> usize {
        self.core.size()
    }

    /// Alias for [`Consumer::size`]
    ///
    /// [`Consumer::size`] 的别名
    #[inline]
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Check if the buffer is empty
    ///
    /// 检查缓冲区是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Check if the buffer is full
    ///
    /// 检查缓冲区是否已满
    #[inline]
    pub fn is_full(&self) -> bool {
        self.size() == self.core.capacity()
    }

    /// Get the capacity of the buffer
    ///
    /// 获取缓冲区容量
    #[inline]
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Create a draining iterator
    ///
    /// 创建一个消费迭代器
    ///
    /// # Examples
    ///
    /// ```
    /// use slotring::spsc;
    ///
    /// let (mut producer, mut consumer) = spsc::new::<usize>(8).unwrap();
    /// producer.offer(1).unwrap();
    /// producer.offer(2).unwrap();
    /// producer.offer(3).unwrap();
    ///
    /// let items: Vec<usize> = consumer.drain().collect();
    /// assert_eq!(items, vec![1, 2, 3]);
    /// assert!(consumer.is_empty());
    /// ```
    #[inline]
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain { consumer: self }
    }
}

impl<T: Handle + Copy> Consumer<T> {
    /// Look at the oldest value without removing it
    ///
    /// 查看最早的值但不移除它
    #[inline]
    pub fn peek(&self) -> Option<T> {
        let head = self.core.head().load(Ordering::Relaxed);
        let raw = self.core.slot(head).load(Ordering::Acquire);
        // SAFETY: same provenance argument as `poll`.
        (raw != EMPTY).then(|| unsafe { T::from_raw(raw) })
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.core.capacity())
            .field("cached_head", &self.cached_head)
            .finish()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.core.capacity())
            .finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_basic_offer_poll() {
        let (mut producer, mut consumer) = new::<usize>(4).unwrap();

        assert!(producer.offer(1).is_ok());
        assert!(producer.offer(2).is_ok());
        assert!(producer.offer(3).is_ok());

        assert_eq!(consumer.poll().unwrap(), 1);
        assert_eq!(consumer.poll().unwrap(), 2);
        assert_eq!(consumer.poll().unwrap(), 3);
        assert_eq!(consumer.poll(), Err(PollError::Empty));
    }

    #[test]
    fn test_capacity_rejected() {
        assert_eq!(new::<usize>(0).err(), Some(CapacityError::Zero));
        assert_eq!(new::<usize>(5).err(), Some(CapacityError::NotPowerOfTwo(5)));
        assert_eq!(new::<usize>(8).map(|(p, _)| p.capacity()), Ok(8));
    }

    #[test]
    fn test_capacity_rounding() {
        let (_, consumer) = with_capacity_rounded::<usize>(NonZero::new(5).unwrap()).unwrap();
        assert_eq!(consumer.capacity(), 8);

        let (_, consumer) = with_capacity_rounded::<usize>(NonZero::new(32).unwrap()).unwrap();
        assert_eq!(consumer.capacity(), 32);

        let (_, consumer) = with_capacity_rounded::<usize>(NonZero::new(1).unwrap()).unwrap();
        assert_eq!(consumer.capacity(), 1);

        let overflow = with_capacity_rounded::<usize>(NonZero::new(usize::MAX).unwrap());
        assert_eq!(overflow.err(), Some(CapacityError::NotPowerOfTwo(usize::MAX)));

        let just_over = usize::MAX / 2 + 2;
        let overflow = with_capacity_rounded::<usize>(NonZero::new(just_over).unwrap());
        assert_eq!(overflow.err(), Some(CapacityError::NotPowerOfTwo(just_over)));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_allocation_failure_is_reported() {
        let capacity = 1usize << 61;
        assert_eq!(new::<usize>(capacity).err(), Some(CapacityError::Alloc(capacity)));

        let rounded = with_capacity_rounded::<usize>(NonZero::new(capacity - 1).unwrap());
        assert_eq!(rounded.err(), Some(CapacityError::Alloc(capacity)));
    }

    #[test]
    fn test_buffer_full() {
        let (mut producer, mut consumer) = new::<usize>(4).unwrap();

        for i in 1..=4 {
            assert!(producer.offer(i).is_ok());
        }

        // All four slots are usable; the fifth offer is rejected.
        assert_eq!(producer.offer(5), Err(OfferError::Full(5)));
        assert_eq!(producer.size(), 4);

        assert_eq!(consumer.poll().unwrap(), 1);
        assert!(producer.offer(5).is_ok());
        assert_eq!(producer.offer(6), Err(OfferError::Full(6)));
    }

    #[test]
    fn test_buffer_empty() {
        let (mut producer, mut consumer) = new::<usize>(4).unwrap();

        assert_eq!(consumer.poll(), Err(PollError::Empty));
        assert!(consumer.is_empty());
        assert_eq!(consumer.size(), 0);

        producer.offer(42).unwrap();
        assert!(!consumer.is_empty());

        consumer.poll().unwrap();
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_sentinel_rejected() {
        let (mut producer, mut consumer) = new::<usize>(4).unwrap();

        assert_eq!(producer.offer(0), Err(OfferError::InvalidInput));
        assert_eq!(producer.size(), 0);

        producer.offer(9).unwrap();
        assert_eq!(producer.offer(0), Err(OfferError::InvalidInput));
        assert_eq!(producer.size(), 1);
        assert_eq!(consumer.poll(), Ok(9));
        assert_eq!(consumer.poll(), Err(PollError::Empty));
    }

    #[test]
    fn test_null_pointer_rejected() {
        let (mut producer, _consumer) = new::<*mut u8>(2).unwrap();
        assert_eq!(
            producer.offer(std::ptr::null_mut()),
            Err(OfferError::InvalidInput)
        );
        assert!(producer.is_empty());
    }

    #[test]
    fn test_wrap_around() {
        let (mut producer, mut consumer) = new::<usize>(4).unwrap();

        for round in 0..10 {
            for i in 1..=4 {
                producer.offer(round * 10 + i).unwrap();
            }
            assert!(producer.is_full());

            for i in 1..=4 {
                assert_eq!(consumer.poll().unwrap(), round * 10 + i);
            }
            assert!(consumer.is_empty());
        }
    }

    #[test]
    fn test_capacity_one() {
        let (mut producer, mut consumer) = new::<usize>(1).unwrap();

        for i in 1..20 {
            producer.offer(i).unwrap();
            assert_eq!(producer.offer(i + 100), Err(OfferError::Full(i + 100)));
            assert_eq!(consumer.poll(), Ok(i));
            assert_eq!(consumer.poll(), Err(PollError::Empty));
        }
    }

    #[test]
    fn test_cached_head_refresh() {
        let (mut producer, mut consumer) = new::<usize>(2).unwrap();

        producer.offer(1).unwrap();
        producer.offer(2).unwrap();
        assert_eq!(producer.cached_head, 0);

        // Consumer progress is only picked up once the cached view says full.
        consumer.poll().unwrap();
        consumer.poll().unwrap();
        assert_eq!(producer.cached_head, 0);

        producer.offer(3).unwrap();
        assert_eq!(producer.cached_head, 2);
    }

    #[test]
    fn test_failed_offer_keeps_cached_head() {
        let (mut producer, _consumer) = new::<usize>(2).unwrap();
        producer.offer(1).unwrap();
        producer.offer(2).unwrap();
        assert!(producer.offer(3).is_err());
        assert_eq!(producer.cached_head, 0);
    }

    #[test]
    fn test_size_tracks_operations() {
        let (mut producer, mut consumer) = new::<usize>(8).unwrap();

        for i in 1..=5 {
            producer.offer(i).unwrap();
            assert_eq!(producer.size(), i);
            assert_eq!(consumer.len(), i);
        }
        assert_eq!(producer.free_slots(), 3);

        consumer.poll().unwrap();
        consumer.poll().unwrap();
        assert_eq!(consumer.size(), 3);
        assert_eq!(producer.free_slots(), 5);
    }

    #[test]
    fn test_peek() {
        let (mut producer, mut consumer) = new::<usize>(4).unwrap();

        assert_eq!(consumer.peek(), None);

        producer.offer(42).unwrap();
        producer.offer(100).unwrap();

        assert_eq!(consumer.peek(), Some(42));
        assert_eq!(consumer.size(), 2);

        assert_eq!(consumer.poll(), Ok(42));
        assert_eq!(consumer.peek(), Some(100));
    }

    #[test]
    fn test_drain_size_hint() {
        let (mut producer, mut consumer) = new::<usize>(8).unwrap();
        for i in 1..=3 {
            producer.offer(i).unwrap();
        }

        let drain = consumer.drain();
        assert_eq!(drain.size_hint(), (3, None));
        assert_eq!(drain.collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(consumer.drain().next(), None);
    }

    #[test]
    fn test_values_are_not_dropped() {
        // The ring carries raw handles; the referents stay alive until the caller
        // reclaims them.
        let boxed: Vec<*mut String> = (0..3)
            .map(|i| Box::into_raw(Box::new(format!("item-{i}"))))
            .collect();

        {
            let (mut producer, _consumer) = new::<*mut String>(4).unwrap();
            for &ptr in &boxed {
                producer.offer(ptr).unwrap();
            }
        }

        for (i, ptr) in boxed.into_iter().enumerate() {
            let value = unsafe { Box::from_raw(ptr) };
            assert_eq!(*value, format!("item-{i}"));
        }
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let (mut producer, mut consumer) = new::<NonZero<usize>>(8).unwrap();

        let producer_handle = thread::spawn(move || {
            for i in 0..1000usize {
                let mut value = NonZero::new(i + 1).unwrap();
                loop {
                    match producer.offer(value) {
                        Ok(()) => break,
                        Err(OfferError::Full(v)) => {
                            value = v;
                            thread::yield_now();
                        }
                        Err(OfferError::InvalidInput) => unreachable!(),
                    }
                }
            }
        });

        let consumer_handle = thread::spawn(move || {
            let mut received = Vec::with_capacity(1000);
            while received.len() < 1000 {
                match consumer.poll() {
                    Ok(v) => received.push(v.get() - 1),
                    Err(PollError::Empty) => thread::yield_now(),
                }
            }
            received
        });

        producer_handle.join().unwrap();
        let received = consumer_handle.join().unwrap();
        assert_eq!(received, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_debug_output() {
        let (producer, consumer) = new::<usize>(4).unwrap();
        assert_eq!(
            format!("{producer:?}"),
            "Producer { capacity: 4, cached_head: 0 }"
        );
        assert_eq!(format!("{consumer:?}"), "Consumer { capacity: 4 }");
    }
}
