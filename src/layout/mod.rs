//! Layout planning for packed sequences.
//!
//! A list of `(size, align, count)` descriptors is laid out left to right in
//! one byte range: each sequence starts at the first offset that satisfies its
//! alignment, and the grand total is padded to the [`StorageUnit`] so the
//! region can be requested as a whole number of units.

use core::alloc::Layout;
use core::mem;

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;


/// Distance from `position` to the next multiple of `alignment`.
///
/// A `position` of zero means "nothing placed yet" and always yields zero.
/// `alignment` must be a power of two.
#[inline]
pub const fn distance_to_next_aligned(position: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    if position == 0 {
        0
    } else {
        (position.wrapping_sub(1).wrapping_add(alignment) & alignment.wrapping_neg())
            .wrapping_sub(position)
    }
}

/// Size, alignment and element count of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceDescriptor {
    /// `size_of` the element type.
    pub size: usize,
    /// `align_of` the element type.
    pub align: usize,
    /// Number of elements (not bytes).
    pub count: usize,
}

impl SequenceDescriptor {
    /// Describes `count` elements of `T`.
    pub const fn of<T>(count: usize) -> Self {
        Self {
            size: mem::size_of::<T>(),
            align: mem::align_of::<T>(),
            count,
        }
    }

    /// Bytes occupied by the elements, without padding.
    pub fn byte_len(&self) -> Option<usize> {
        self.size.checked_mul(self.count)
    }
}

/// The coarse unit the single allocation request is expressed in.
///
/// `size == align`, and `align` is the largest alignment of any sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageUnit {
    size: usize,
    align: usize,
}

impl StorageUnit {
    /// A unit one `align`-quantum wide.
    ///
    /// # Errors
    /// Returns `LayoutError::InvalidAlignment` unless `align` is a power of two.
    pub const fn with_align(align: usize) -> Result<Self, LayoutError> {
        if align.is_power_of_two() {
            Ok(Self { size: align, align })
        } else {
            Err(LayoutError::InvalidAlignment(align))
        }
    }

    /// The unit satisfying every descriptor's alignment.
    ///
    /// # Errors
    /// Returns `LayoutError::InvalidAlignment` for a non-power-of-two alignment.
    pub fn covering(descriptors: &[SequenceDescriptor]) -> Result<Self, LayoutError> {
        let mut align = 1;
        for d in descriptors {
            if !d.align.is_power_of_two() {
                return Err(LayoutError::InvalidAlignment(d.align));
            }
            align = align.max(d.align);
        }
        Self::with_align(align)
    }

    /// Size of one unit in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Alignment of one unit in bytes.
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Layout of `count` contiguous units, or `None` on overflow.
    pub fn layout_for(&self, count: usize) -> Option<Layout> {
        let bytes = self.size.checked_mul(count)?;
        Layout::from_size_align(bytes, self.align).ok()
    }
}

/// Byte range of one sequence inside the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SequenceRange {
    /// Offset of the first element.
    pub start: usize,
    /// Offset one past the last element.
    pub end: usize,
    /// Number of elements.
    pub count: usize,
}

impl SequenceRange {
    /// Length in bytes.
    pub fn byte_len(&self) -> usize {
        self.end - self.start
    }
}

/// Result of planning: where every sequence lives and how much to request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutPlan {
    unit: StorageUnit,
    ranges: Vec<SequenceRange>,
    total_bytes: usize,
}

impl LayoutPlan {
    /// The storage unit of the request.
    pub fn unit(&self) -> StorageUnit {
        self.unit
    }

    /// Per-sequence byte ranges, in declared order.
    pub fn ranges(&self) -> &[SequenceRange] {
        &self.ranges
    }

    /// Total bytes, a multiple of the unit size.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Number of storage units to request.
    pub fn units(&self) -> usize {
        self.total_bytes / self.unit.size
    }

    /// Padding inserted in front of sequence `index`.
    pub fn padding_before(&self, index: usize) -> usize {
        let prev_end = match index {
            0 => 0,
            i => self.ranges[i - 1].end,
        };
        self.ranges[index].start - prev_end
    }
}

/// Lays out `descriptors` in order within one region.
///
/// # Errors
/// Fails on an empty list, a non-power-of-two alignment, arithmetic overflow,
/// or a total exceeding `isize::MAX`.
pub fn plan_layout(descriptors: &[SequenceDescriptor]) -> Result<LayoutPlan, LayoutError> {
    if descriptors.is_empty() {
        return Err(LayoutError::Empty);
    }
    let unit = StorageUnit::covering(descriptors)?;

    let mut position = 0usize;
    let mut ranges = Vec::with_capacity(descriptors.len());
    for d in descriptors {
        let start = position
            .checked_add(distance_to_next_aligned(position, d.align))
            .ok_or(LayoutError::Overflow)?;
        let end = d
            .byte_len()
            .and_then(|len| start.checked_add(len))
            .ok_or(LayoutError::Overflow)?;
        ranges.push(SequenceRange {
            start,
            end,
            count: d.count,
        });
        position = end;
    }

    let total_bytes = position
        .checked_add(distance_to_next_aligned(position, unit.align))
        .ok_or(LayoutError::Overflow)?;
    if total_bytes > isize::MAX as usize {
        return Err(LayoutError::TooLarge(total_bytes));
    }

    Ok(LayoutPlan {
        unit,
        ranges,
        total_bytes,
    })
}
