//! Scoped file handles.
//!
//! A handle buffers the file's bytes. `close()` writes dirty bytes back to
//! the owning store. Dropping a handle on any other path releases it and
//! throws the unsaved writes away, so an early `?` return never leaves a
//! half-written file behind.

use std::io::{self, Cursor, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite, ReadBuf};

use crate::error::VfsResult;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    /// Truncate, then write.
    Write,
    /// Keep the existing bytes and write after them.
    Append,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

/// Destination for a handle's bytes when it is closed.
#[async_trait]
pub trait WriteBack: Send + Sync {
    async fn write_back(&self, path: &Path, data: &[u8]) -> VfsResult<()>;
}

/// An open file.
pub struct FileHandle<'a> {
    path: PathBuf,
    mode: OpenMode,
    buf: Cursor<Vec<u8>>,
    dirty: bool,
    sink: Option<Box<dyn WriteBack + 'a>>,
}

impl FileHandle<'static> {
    /// A read-only handle over `data`.
    pub fn reader(path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            mode: OpenMode::Read,
            buf: Cursor::new(data),
            dirty: false,
            sink: None,
        }
    }
}

impl<'a> FileHandle<'a> {
    /// A writable handle that flushes to `sink` on close.
    pub fn writer(
        path: impl Into<PathBuf>,
        mode: OpenMode,
        initial: Vec<u8>,
        sink: Box<dyn WriteBack + 'a>,
    ) -> Self {
        let mut buf = Cursor::new(initial);
        if mode == OpenMode::Append {
            buf.set_position(buf.get_ref().len() as u64);
        }
        Self {
            path: path.into(),
            mode,
            buf,
            // Truncation alone is a change worth persisting.
            dirty: mode == OpenMode::Write,
            sink: Some(sink),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Bytes currently held by the handle.
    pub fn contents(&self) -> &[u8] {
        self.buf.get_ref()
    }

    /// Persist any writes and release the handle.
    pub async fn close(mut self) -> VfsResult<()> {
        if self.dirty {
            if let Some(sink) = self.sink.as_ref() {
                sink.write_back(&self.path, self.buf.get_ref()).await?;
            }
        }
        self.dirty = false;
        Ok(())
    }
}

impl std::fmt::Debug for FileHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.buf.get_ref().len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Drop for FileHandle<'_> {
    fn drop(&mut self) {
        if self.dirty {
            tracing::warn!(
                path = %self.path.display(),
                "file handle dropped without close; discarding writes"
            );
        }
    }
}

impl AsyncRead for FileHandle<'_> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.buf).poll_read(cx, buf)
    }
}

impl AsyncWrite for FileHandle<'_> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        if !self.mode.is_writable() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("opened read-only: {}", self.path.display()),
            )));
        }
        self.dirty = true;
        Pin::new(&mut self.buf).poll_write(cx, data)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for FileHandle<'_> {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        Pin::new(&mut self.buf).start_seek(position)
    }

    fn poll_complete(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.buf).poll_complete(cx)
    }
}
