/// Smallest allocation made for a growable buffer.
const MIN_CAPACITY: u64 = 4096;

/// Rounds `value` up to the next multiple of `align` (`align` 0 or 1 is a no-op).
#[inline]
pub fn align_to(value: u64, align: u64) -> u64 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

/// Capacity a buffer grows to when `required` bytes no longer fit.
fn grown_capacity(required: u64) -> u64 {
    required.next_power_of_two().max(MIN_CAPACITY)
}

/// Growable GPU buffer with a write cursor.
///
/// Two usage patterns:
/// - [`upload`](Self::upload): replace the whole content once per frame
/// - [`append`](Self::append): sub-allocate consecutive ranges within a frame,
///   then [`rewind`](Self::rewind) at the start of the next one
///
/// Growing replaces the underlying `wgpu::Buffer` and bumps `generation`, so
/// callers can tell when bind groups referencing the old buffer are stale.
/// The old buffer stays alive for commands that already reference it.
#[derive(Debug)]
pub struct GpuBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    cursor: u64,
    generation: u64,
}

impl GpuBuffer {
    pub fn new(label: &'static str, usage: wgpu::BufferUsages) -> Self {
        Self {
            label,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            buffer: None,
            capacity: 0,
            cursor: 0,
            generation: 0,
        }
    }

    /// Writes `bytes` at offset 0, growing if needed.
    ///
    /// Returns `false` for empty input (nothing written).
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return false;
        }
        let size = align_to(bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);
        self.ensure_capacity(device, size);
        self.cursor = size;
        self.write(queue, 0, bytes);
        true
    }

    /// Writes `bytes` at the next `align`ed position and returns that offset.
    ///
    /// When the buffer must grow the new buffer starts empty, so the returned
    /// offset is 0 and earlier ranges remain in the previous buffer.
    pub fn append(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        align: u64,
    ) -> u64 {
        let align = align.max(wgpu::COPY_BUFFER_ALIGNMENT);
        let len = align_to(bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);

        let mut offset = align_to(self.cursor, align);
        if self.buffer.is_none() || offset + len > self.capacity {
            self.grow(device, offset + len);
            offset = 0;
        }

        self.write(queue, offset, bytes);
        self.cursor = offset + len;
        offset
    }

    /// Resets the write cursor; the allocation is kept.
    #[inline]
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    #[inline]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Incremented every time the underlying buffer is replaced.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drops the GPU allocation.
    pub fn release(&mut self) {
        self.buffer = None;
        self.capacity = 0;
        self.cursor = 0;
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, required: u64) {
        if self.buffer.is_none() || required > self.capacity {
            self.grow(device, required);
        }
    }

    fn grow(&mut self, device: &wgpu::Device, required: u64) {
        let capacity = grown_capacity(required);
        log::debug!("{}: growing to {capacity} bytes", self.label);

        self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(self.label),
            size: capacity,
            usage: self.usage,
            mapped_at_creation: false,
        }));
        self.capacity = capacity;
        self.cursor = 0;
        self.generation += 1;
    }

    fn write(&self, queue: &wgpu::Queue, offset: u64, bytes: &[u8]) {
        let Some(buffer) = self.buffer.as_ref() else { return };
        if bytes.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT == 0 {
            queue.write_buffer(buffer, offset, bytes);
        } else {
            // write_buffer needs a multiple of four bytes.
            let mut padded = bytes.to_vec();
            padded.resize(align_to(bytes.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT) as usize, 0);
            queue.write_buffer(buffer, offset, &padded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_to_rounds_up() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(13, 1), 13);
        assert_eq!(align_to(13, 0), 13);
    }

    #[test]
    fn growth_is_power_of_two_with_floor() {
        assert_eq!(grown_capacity(1), MIN_CAPACITY);
        assert_eq!(grown_capacity(MIN_CAPACITY), MIN_CAPACITY);
        assert_eq!(grown_capacity(MIN_CAPACITY + 1), MIN_CAPACITY * 2);
        assert_eq!(grown_capacity(100_000), 131_072);
    }

    #[test]
    fn new_buffer_is_empty() {
        let buf = GpuBuffer::new("test", wgpu::BufferUsages::VERTEX);
        assert!(buf.buffer().is_none());
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.generation(), 0);
    }
}
