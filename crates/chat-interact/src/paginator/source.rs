//! Where pages come from.

use std::fmt;
use std::future::Future;

use futures::stream::{BoxStream, Stream, StreamExt};

use crate::error::{InteractError, Result};

/// Random access to the pages of a paginator.
///
/// Pages are looked up by zero-based index. A source returns `Ok(None)` for an index past its
/// end; lazy sources discover their end that way.
pub trait PageSource: Send {
    /// One page, before formatting.
    type Page: Send;

    /// Fetch the page at `index`.
    fn get_page(&mut self, index: usize) -> impl Future<Output = Result<Option<&Self::Page>>> + Send;

    /// Total number of pages, once known.
    fn known_len(&self) -> Option<usize> {
        None
    }
}

impl<T: Send + Sync> PageSource for Vec<T> {
    type Page = T;

    async fn get_page(&mut self, index: usize) -> Result<Option<&T>> {
        Ok(self.get(index))
    }

    fn known_len(&self) -> Option<usize> {
        Some(self.len())
    }
}

fn check_chunk_size(size: usize) -> Result<()> {
    if size == 0 {
        return Err(InteractError::invalid_argument("chunk size must be at least 1"));
    }
    Ok(())
}

/// Pages pulled from an iterator on demand.
///
/// Every page pulled is kept, so going back never re-runs the iterator.
pub struct IterSource<T> {
    iter: Box<dyn Iterator<Item = T> + Send>,
    buffer: Vec<T>,
    exhausted: bool,
}

impl<T: Send> IterSource<T> {
    /// One page per item.
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self {
            iter: Box::new(items.into_iter()),
            buffer: Vec::new(),
            exhausted: false,
        }
    }

    /// Number of pages pulled so far.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<T: Send + 'static> IterSource<Vec<T>> {
    /// `size` items per page. The last page may be shorter.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidArgument`] if `size` is zero.
    pub fn chunked<I>(items: I, size: usize) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        check_chunk_size(size)?;
        let mut items = items.into_iter();
        Ok(Self::new(std::iter::from_fn(move || {
            let chunk: Vec<T> = items.by_ref().take(size).collect();
            (!chunk.is_empty()).then_some(chunk)
        })))
    }
}

impl<T: Send> PageSource for IterSource<T> {
    type Page = T;

    async fn get_page(&mut self, index: usize) -> Result<Option<&T>> {
        while self.buffer.len() <= index && !self.exhausted {
            match self.iter.next() {
                Some(page) => self.buffer.push(page),
                None => self.exhausted = true,
            }
        }
        Ok(self.buffer.get(index))
    }

    fn known_len(&self) -> Option<usize> {
        self.exhausted.then_some(self.buffer.len())
    }
}

impl<T> fmt::Debug for IterSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterSource")
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// Pages pulled from an async stream on demand.
pub struct StreamSource<T> {
    stream: BoxStream<'static, T>,
    buffer: Vec<T>,
    exhausted: bool,
}

impl<T: Send + 'static> StreamSource<T> {
    /// One page per item.
    pub fn new(stream: impl Stream<Item = T> + Send + 'static) -> Self {
        Self {
            stream: stream.boxed(),
            buffer: Vec::new(),
            exhausted: false,
        }
    }

    /// Number of pages pulled so far.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<T: Send + 'static> StreamSource<Vec<T>> {
    /// `size` items per page. The last page may be shorter.
    ///
    /// # Errors
    ///
    /// Returns [`InteractError::InvalidArgument`] if `size` is zero.
    pub fn chunked(stream: impl Stream<Item = T> + Send + 'static, size: usize) -> Result<Self> {
        check_chunk_size(size)?;
        Ok(Self::new(stream.chunks(size)))
    }
}

impl<T: Send> PageSource for StreamSource<T> {
    type Page = T;

    async fn get_page(&mut self, index: usize) -> Result<Option<&T>> {
        while self.buffer.len() <= index && !self.exhausted {
            match self.stream.next().await {
                Some(page) => self.buffer.push(page),
                None => self.exhausted = true,
            }
        }
        Ok(self.buffer.get(index))
    }

    fn known_len(&self) -> Option<usize> {
        self.exhausted.then_some(self.buffer.len())
    }
}

impl<T> fmt::Debug for StreamSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource")
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
