//! Opaque pointer-sized handles carried by the ring
//!
//! 环形缓冲区传递的不透明指针大小句柄
//!
//! Every slot is a single `AtomicUsize`. A value travels through the ring as the
//! machine word returned by [`Handle::into_raw`] and is rebuilt on the consumer side
//! with [`Handle::from_raw`]. The word `0` is reserved as the empty sentinel, so a
//! handle whose word is `0` can never be stored.
//!
//! 每个槽位是一个 `AtomicUsize`。值以 [`Handle::into_raw`] 返回的机器字形式通过
//! 环形缓冲区，并在消费者端通过 [`Handle::from_raw`] 重建。字 `0` 被保留为空哨兵，
//! 因此映射为 `0` 的句柄永远不能被存储。
//!
//! The ring never dereferences, drops or frees a handle. Ownership of whatever the
//! handle points at stays with the caller.

use std::num::NonZeroUsize;
use std::ptr::NonNull;

/// The reserved "slot is empty" word
///
/// 保留的"槽位为空"字
pub const EMPTY: usize = 0;

/// Trait for values that can travel through the ring as a single word
///
/// 可以作为单个机器字通过环形缓冲区的值的 trait
pub trait Handle: Sized {
    /// Convert the value into its word representation
    ///
    /// 将值转换为其机器字表示
    fn into_raw(self) -> usize;

    /// Rebuild a value from a word previously produced by `into_raw`
    ///
    /// 从先前由 `into_raw` 生成的机器字重建值
    ///
    /// # Safety
    /// `raw` must have been returned by `into_raw` on this same type and must not be
    /// [`EMPTY`].
    ///
    /// # 安全性
    /// `raw` 必须是同一类型的 `into_raw` 返回的值，并且不能是 [`EMPTY`]。
    unsafe fn from_raw(raw: usize) -> Self;
}

impl Handle for usize {
    #[inline]
    fn into_raw(self) -> usize {
        self
    }

    #[inline]
    unsafe fn from_raw(raw: usize) -> Self {
        raw
    }
}

impl Handle for NonZeroUsize {
    #[inline]
    fn into_raw(self) -> usize {
        self.get()
    }

    #[inline]
    unsafe fn from_raw(raw: usize) -> Self {
        // SAFETY: the caller guarantees `raw != EMPTY`.
        unsafe { NonZeroUsize::new_unchecked(raw) }
    }
}

// Raw pointers go through `expose_provenance`/`with_exposed_provenance` so the
// word round trip keeps a valid provenance for the referent.
impl<T> Handle for *mut T {
    #[inline]
    fn into_raw(self) -> usize {
        self.expose_provenance()
    }

    #[inline]
    unsafe fn from_raw(raw: usize) -> Self {
        std::ptr::with_exposed_provenance_mut(raw)
    }
}

impl<T> Handle for *const T {
    #[inline]
    fn into_raw(self) -> usize {
        self.expose_provenance()
    }

    #[inline]
    unsafe fn from_raw(raw: usize) -> Self {
        std::ptr::with_exposed_provenance(raw)
    }
}

impl<T> Handle for NonNull<T> {
    #[inline]
    fn into_raw(self) -> usize {
        self.as_ptr().expose_provenance()
    }

    #[inline]
    unsafe fn from_raw(raw: usize) -> Self {
        // SAFETY: the caller guarantees `raw != EMPTY`, so the pointer is non-null.
        unsafe { NonNull::new_unchecked(std::ptr::with_exposed_provenance_mut(raw)) }
    }
}
