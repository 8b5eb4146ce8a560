//! Error types for ring construction and the producer/consumer paths
//!
//! 环形缓冲区构造以及生产者/消费者路径的错误类型

use thiserror::Error;

/// Ring buffer error for offer operations
///
/// offer 操作的环形缓冲区错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OfferError<T> {
    /// The value maps to the reserved empty sentinel; nothing was enqueued
    ///
    /// 该值映射为保留的空哨兵；未入队任何内容
    #[error("cannot offer the empty sentinel")]
    InvalidInput,

    /// Buffer is full; the rejected value is handed back
    ///
    /// 缓冲区已满；被拒绝的值将返还给调用者
    #[error("ring is full")]
    Full(T),
}

impl<T> OfferError<T> {
    /// Recover the rejected value, if the ring was full
    ///
    /// 如果因缓冲区已满而失败，取回被拒绝的值
    #[inline]
    pub fn into_inner(self) -> Option<T> {
        match self {
            OfferError::Full(value) => Some(value),
            OfferError::InvalidInput => None,
        }
    }
}

/// Ring buffer error for poll operations
///
/// poll 操作的环形缓冲区错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PollError {
    /// Buffer is empty
    ///
    /// 缓冲区为空
    #[error("ring is empty")]
    Empty,
}

/// Rejected capacity passed to [`crate::spsc::new`]
///
/// 传给 [`crate::spsc::new`] 的容量被拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// Capacity is zero
    ///
    /// 容量为零
    #[error("capacity must be non-zero")]
    Zero,

    /// Capacity is not a power of two, so the index mask cannot be used
    ///
    /// 容量不是 2 的幂次，无法使用索引掩码
    #[error("capacity {0} is not a power of two")]
    NotPowerOfTwo(usize),

    /// The slot array for this capacity could not be allocated
    ///
    /// 无法为该容量分配槽位数组
    #[error("cannot allocate {0} slots")]
    Alloc(usize),
}
