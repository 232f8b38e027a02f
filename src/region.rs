//! Strided views of 8-bit rasters.
//!
//! A region holds a buffer of rows together with the image-space rectangle
//! the buffer covers. Kernels address pixels in image coordinates, so
//! an input region may extend beyond the output rectangle on any side
//! (that margin is what the tap offsets reach into).
use std::borrow::Cow;

use crate::RegionError;

/// Integer pixel-space window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right border.
    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Exclusive bottom border.
    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline(always)]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Returns the rect shrunk by given margins on each side.
    /// Sizes are saturated at zero.
    pub fn shrink(&self, horizontal: u32, vertical: u32) -> Rect {
        Rect {
            left: self.left + horizontal as i32,
            top: self.top + vertical as i32,
            width: self.width.saturating_sub(2 * horizontal),
            height: self.height.saturating_sub(2 * vertical),
        }
    }
}

/// Geometry shared by [Region] and [RegionMut].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    valid: Rect,
    bands: usize,
    stride: usize,
}

impl Layout {
    pub fn new(valid: Rect, bands: usize, stride: usize) -> Result<Self, RegionError> {
        if bands == 0 {
            return Err(RegionError::ZeroBands);
        }
        if stride < valid.width as usize * bands {
            return Err(RegionError::InvalidStride);
        }
        Ok(Self {
            valid,
            bands,
            stride,
        })
    }

    /// Rows of this layout are packed without padding.
    pub fn packed(valid: Rect, bands: usize) -> Result<Self, RegionError> {
        Self::new(valid, bands, valid.width as usize * bands)
    }

    /// Image-space rectangle covered by the buffer.
    #[inline(always)]
    pub fn valid(&self) -> Rect {
        self.valid
    }

    /// Bytes per pixel.
    #[inline(always)]
    pub fn bands(&self) -> usize {
        self.bands
    }

    /// Bytes per row.
    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes in one row of pixels, without padding.
    #[inline(always)]
    pub fn row_size(&self) -> usize {
        self.valid.width as usize * self.bands
    }

    /// Minimal size of buffer that can hold all rows.
    pub fn required_len(&self) -> usize {
        if self.valid.is_empty() {
            0
        } else {
            (self.valid.height as usize - 1) * self.stride + self.row_size()
        }
    }

    /// Byte index of the pixel `(x, y)` in the buffer.
    ///
    /// The pixel must lie inside of [Layout::valid]. It is checked
    /// in debug builds only.
    #[inline(always)]
    pub fn address(&self, x: i32, y: i32) -> usize {
        debug_assert!(
            self.valid.contains(x, y),
            "({x}, {y}) is outside of {:?}",
            self.valid
        );
        (y - self.valid.top) as usize * self.stride + (x - self.valid.left) as usize * self.bands
    }

    /// Checked version of [Layout::address].
    #[inline]
    pub fn try_address(&self, x: i32, y: i32) -> Option<usize> {
        if self.valid.contains(x, y) {
            Some(self.address(x, y))
        } else {
            None
        }
    }

    fn check_buffer(&self, len: usize) -> Result<(), RegionError> {
        if len < self.required_len() {
            return Err(RegionError::InvalidBufferSize);
        }
        Ok(())
    }
}

#[derive(Debug)]
enum BufferContainer<'a> {
    Borrowed(&'a mut [u8]),
    Owned(Vec<u8>),
}

impl<'a> BufferContainer<'a> {
    fn borrow(&self) -> &[u8] {
        match self {
            Self::Borrowed(p_ref) => p_ref,
            Self::Owned(vec) => vec,
        }
    }

    fn borrow_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Borrowed(p_ref) => p_ref,
            Self::Owned(vec) => vec,
        }
    }
}

/// Read-only strided view of an 8-bit raster, used as the source of kernels.
#[derive(Debug, Clone)]
pub struct Region<'a> {
    layout: Layout,
    buffer: Cow<'a, [u8]>,
}

impl<'a> Region<'a> {
    pub fn new(layout: Layout, buffer: &'a [u8]) -> Result<Self, RegionError> {
        layout.check_buffer(buffer.len())?;
        Ok(Self {
            layout,
            buffer: Cow::Borrowed(buffer),
        })
    }

    /// Creates region with packed rows (`stride == width * bands`).
    pub fn from_slice(valid: Rect, bands: usize, buffer: &'a [u8]) -> Result<Self, RegionError> {
        Self::new(Layout::packed(valid, bands)?, buffer)
    }
}

impl Region<'static> {
    pub fn from_vec(layout: Layout, buffer: Vec<u8>) -> Result<Self, RegionError> {
        layout.check_buffer(buffer.len())?;
        Ok(Self {
            layout,
            buffer: Cow::Owned(buffer),
        })
    }
}

impl<'a> Region<'a> {
    #[inline(always)]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline(always)]
    pub fn valid(&self) -> Rect {
        self.layout.valid
    }

    #[inline(always)]
    pub fn bands(&self) -> usize {
        self.layout.bands
    }

    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    #[inline(always)]
    pub fn address(&self, x: i32, y: i32) -> usize {
        self.layout.address(x, y)
    }

    #[inline(always)]
    pub fn try_address(&self, x: i32, y: i32) -> Option<usize> {
        self.layout.try_address(x, y)
    }

    #[inline(always)]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Bytes of the row `y`, without padding.
    pub fn row(&self, y: i32) -> Option<&[u8]> {
        let start = self.try_address(self.layout.valid.left, y)?;
        self.buffer.get(start..start + self.layout.row_size())
    }
}

/// Mutable strided view of an 8-bit raster, used as the destination of kernels.
#[derive(Debug)]
pub struct RegionMut<'a> {
    layout: Layout,
    buffer: BufferContainer<'a>,
}

impl RegionMut<'static> {
    /// Creates zeroed region with packed rows.
    pub fn new(valid: Rect, bands: usize) -> Result<Self, RegionError> {
        let layout = Layout::packed(valid, bands)?;
        Ok(Self {
            layout,
            buffer: BufferContainer::Owned(vec![0; layout.required_len()]),
        })
    }

    pub fn from_vec(layout: Layout, buffer: Vec<u8>) -> Result<Self, RegionError> {
        layout.check_buffer(buffer.len())?;
        Ok(Self {
            layout,
            buffer: BufferContainer::Owned(buffer),
        })
    }
}

impl<'a> RegionMut<'a> {
    pub fn from_slice(layout: Layout, buffer: &'a mut [u8]) -> Result<Self, RegionError> {
        layout.check_buffer(buffer.len())?;
        Ok(Self {
            layout,
            buffer: BufferContainer::Borrowed(buffer),
        })
    }

    #[inline(always)]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline(always)]
    pub fn valid(&self) -> Rect {
        self.layout.valid
    }

    #[inline(always)]
    pub fn bands(&self) -> usize {
        self.layout.bands
    }

    #[inline(always)]
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    #[inline(always)]
    pub fn address(&self, x: i32, y: i32) -> usize {
        self.layout.address(x, y)
    }

    #[inline(always)]
    pub fn try_address(&self, x: i32, y: i32) -> Option<usize> {
        self.layout.try_address(x, y)
    }

    #[inline(always)]
    pub fn buffer(&self) -> &[u8] {
        self.buffer.borrow()
    }

    #[inline(always)]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.buffer.borrow_mut()
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buffer.borrow_mut().as_mut_ptr()
    }

    pub fn row(&self, y: i32) -> Option<&[u8]> {
        let start = self.try_address(self.layout.valid.left, y)?;
        self.buffer().get(start..start + self.layout.row_size())
    }

    pub fn row_mut(&mut self, y: i32) -> Option<&mut [u8]> {
        let start = self.try_address(self.layout.valid.left, y)?;
        let row_size = self.layout.row_size();
        self.buffer_mut().get_mut(start..start + row_size)
    }

    /// Read-only view of the same pixels, e.g. to use
    /// the result of one kernel as the source of another one.
    pub fn as_region(&self) -> Region<'_> {
        Region {
            layout: self.layout,
            buffer: Cow::Borrowed(self.buffer()),
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self.buffer {
            BufferContainer::Borrowed(slice) => slice.to_vec(),
            BufferContainer::Owned(vec) => vec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_with_origin_and_stride() {
        let layout = Layout::new(Rect::new(-2, -1, 4, 3), 3, 16).unwrap();
        assert_eq!(layout.required_len(), 2 * 16 + 12);
        assert_eq!(layout.address(-2, -1), 0);
        assert_eq!(layout.address(-1, -1), 3);
        assert_eq!(layout.address(0, 1), 2 * 16 + 6);
        assert_eq!(layout.try_address(2, 0), None);
        assert_eq!(layout.try_address(-2, 2), None);
    }

    #[test]
    fn invalid_layouts() {
        let rect = Rect::new(0, 0, 4, 4);
        assert_eq!(Layout::new(rect, 0, 4), Err(RegionError::ZeroBands));
        assert_eq!(Layout::new(rect, 2, 7), Err(RegionError::InvalidStride));
        let layout = Layout::packed(rect, 1).unwrap();
        assert_eq!(
            Region::new(layout, &[0; 15]).err(),
            Some(RegionError::InvalidBufferSize)
        );
    }

    #[test]
    fn rows_skip_padding() {
        let buffer: Vec<u8> = (0..20).collect();
        let layout = Layout::new(Rect::new(0, 0, 3, 2), 2, 10).unwrap();
        let region = Region::new(layout, &buffer).unwrap();
        assert_eq!(region.row(1), Some(&buffer[10..16]));
        assert_eq!(region.row(2), None);
    }

    #[test]
    fn write_rows_and_read_them_back() {
        let mut region = RegionMut::new(Rect::new(-1, 0, 2, 2), 2).unwrap();
        region.row_mut(1).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        assert!(region.row_mut(2).is_none());

        let view = region.as_region();
        assert_eq!(view.row(0), Some(&[0u8; 4][..]));
        assert_eq!(view.row(1), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(view.address(0, 1), 6);
    }

    #[test]
    fn shrink_rect() {
        let rect = Rect::new(0, 0, 10, 3).shrink(1, 2);
        assert_eq!(rect, Rect::new(1, 2, 8, 0));
        assert!(rect.is_empty());
    }
}
