use futures_util::io::{empty, AsyncBufRead, AsyncRead, AsyncReadExt, Cursor};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::Error;

pin_project_lite::pin_project! {
    /// A streaming body for use with requests and responses.
    ///
    /// Error pages render into an in-memory buffer, so responses coming out of this crate always
    /// carry a fixed-length body. Requests may carry any reader.
    pub struct Body {
        #[pin]
        pub(crate) reader: Box<dyn AsyncBufRead + Unpin + Send + Sync + 'static>,
        pub(crate) length: Option<usize>,
    }
}

impl Body {
    /// Create an empty Body
    pub fn empty() -> Self {
        Self {
            reader: Box::new(empty()),
            length: Some(0),
        }
    }

    /// Create a Body from a type implementing AsyncBufRead
    ///
    /// if len: None, the length is unknown until the reader is drained
    pub fn from_reader(
        reader: impl AsyncBufRead + Unpin + Send + Sync + 'static,
        len: Option<usize>,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            length: len,
        }
    }

    /// Create a Body from bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            length: Some(bytes.len()),
            reader: Box::new(Cursor::new(bytes)),
        }
    }

    /// Length of the body, if known.
    pub fn len(&self) -> Option<usize> {
        self.length
    }

    /// True only when the body is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.length == Some(0)
    }

    /// Read a Body into bytes. Consumes Body.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::with_capacity(self.length.unwrap_or(1024));
        self.read_to_end(&mut buf).await.map_err(Error::BodyConversion)?;
        Ok(buf)
    }

    /// Read a Body into a String. Consumes Body.
    pub async fn into_string(mut self) -> Result<String, Error> {
        let mut buf = String::with_capacity(self.length.unwrap_or(0));
        self.read_to_string(&mut buf).await.map_err(Error::BodyConversion)?;
        Ok(buf)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from_bytes(s.into_bytes())
    }
}

impl<'a> From<&'a str> for Body {
    fn from(s: &'a str) -> Self {
        Self::from_bytes(s.to_owned().into_bytes())
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body").field("length", &self.length).finish()
    }
}

impl AsyncRead for Body {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl AsyncBufRead for Body {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>,) -> Poll<io::Result<&'_ [u8]>> {
        let this = self.project();
        this.reader.poll_fill_buf(cx)
    }

    fn consume(mut self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.reader).consume(amt)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_body_from_str() {
        let body = Body::from("not found /error");
        assert_eq!(body.len(), Some(16));

        let s = smol::block_on(body.into_string()).unwrap();
        assert_eq!(s, "not found /error");
    }

    #[test]
    fn test_body_empty() {
        let body = Body::empty();
        assert!(body.is_empty());
        assert!(smol::block_on(body.into_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_body_from_reader_unknown_length() {
        let reader = futures_util::io::BufReader::new(Cursor::new(b"error/500".to_vec()));
        let body = Body::from_reader(reader, None);
        assert_eq!(body.len(), None);
        assert!(!body.is_empty());

        let s = smol::block_on(body.into_string()).unwrap();
        assert_eq!(s, "error/500");
    }
}
