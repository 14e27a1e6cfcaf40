use async_trait::async_trait;
use std::io;
use std::sync::Arc;

use super::ReadAt;

/// A bounded window `[base, base + len)` over another source.
///
/// Offsets passed to [`ReadAt::read_at`] are relative to `base`; reads that
/// run past the window are cut short.
#[derive(Debug)]
pub struct SectionReader<R: ReadAt + ?Sized> {
    inner: Arc<R>,
    base: u64,
    len: u64,
}

impl<R: ReadAt + ?Sized> SectionReader<R> {
    /// Create a view of `len` bytes starting at `base`.
    ///
    /// The window is clipped to the inner source.
    pub fn new(inner: Arc<R>, base: u64, len: u64) -> Self {
        let base = base.min(inner.size());
        let len = len.min(inner.size() - base);
        Self { inner, base, len }
    }

    /// Offset of the window inside the inner source.
    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn inner(&self) -> &Arc<R> {
        &self.inner
    }
}

#[async_trait]
impl<R: ReadAt + ?Sized> ReadAt for SectionReader<R> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.len {
            return Ok(0);
        }
        let max = usize::try_from(self.len - offset).unwrap_or(usize::MAX);
        let n = buf.len().min(max);
        self.inner.read_at(self.base + offset, &mut buf[..n]).await
    }

    fn size(&self) -> u64 {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_are_relative_and_bounded() {
        let host = Arc::new(b"0123456789".to_vec());
        let section = SectionReader::new(host, 6, 4);
        assert_eq!(section.size(), 4);
        assert_eq!(section.base(), 6);

        let mut buf = [0u8; 8];
        let n = section.read_at(1, &mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"789");
        assert_eq!(section.read_at(4, &mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn window_is_clipped_to_source() {
        let host = Arc::new(vec![0u8; 10]);
        let section = SectionReader::new(host, 8, 100);
        assert_eq!(section.size(), 2);
    }
}
