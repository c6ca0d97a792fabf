//! In-memory response state.
//!
//! Endpoints write into a `BufferedResponse`. Output is held in a buffer until the buffer fills
//! up or is flushed, at which point the response is committed: the bytes count as sent, and status
//! and headers are fixed. Error page dispatch depends on that distinction (forward before commit,
//! include after).

use http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    status::StatusCode,
    version::Version,
};
use std::time::SystemTime;

use crate::body::Body;
use crate::server::{Fault, Result};

/// Currently, Response is not generic over Body type
pub type Response = http::Response<Body>;

/// Default size of the response buffer, 1 MiB
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Output side of a response.
///
/// While suspended, writes are refused with `WouldBlock` until the flag is cleared.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputStream {
    suspended: bool,
    closed: bool,
}

impl OutputStream {
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    fn check_writable(&self) -> Result<()> {
        if self.closed {
            return Err(Fault::IllegalState("output stream closed"));
        }
        if self.suspended {
            return Err(std::io::Error::new(std::io::ErrorKind::WouldBlock, "output stream suspended").into());
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BufferedResponse {
    status: StatusCode,
    message: Option<String>,
    headers: HeaderMap,
    version: Version,
    content_length: Option<u64>,
    buffer: Vec<u8>,
    buffer_size: usize,
    // bytes already handed off to the client
    sent: Vec<u8>,
    committed: bool,
    including: bool,
    output: OutputStream,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            status: StatusCode::OK,
            message: None,
            headers: HeaderMap::new(),
            version: Version::HTTP_11,
            content_length: None,
            buffer: Vec::new(),
            buffer_size,
            sent: Vec::new(),
            committed: false,
            including: false,
            output: OutputStream::default(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Ignored once committed, or while running an included endpoint.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        if self.is_locked() {
            tracing::debug!(%status, "status change ignored, response committed or included");
            return self;
        }
        self.status = status;
        self
    }

    /// Status message, set along with an error status.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> &mut Self {
        if !self.is_locked() {
            self.message = Some(message.into());
        }
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn insert_header(&mut self, header_name: HeaderName, header_value: HeaderValue) -> &mut Self {
        if !self.is_locked() {
            self.headers.insert(header_name, header_value);
        }
        self
    }

    pub fn append_header(&mut self, header_name: HeaderName, header_value: HeaderValue) -> &mut Self {
        if !self.is_locked() {
            self.headers.append(header_name, header_value);
        }
        self
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// `None` means unspecified: the length is taken from whatever ends up written.
    pub fn set_content_length(&mut self, len: Option<u64>) -> &mut Self {
        if !self.is_locked() {
            self.content_length = len;
        }
        self
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn output_stream(&self) -> &OutputStream {
        &self.output
    }

    pub fn output_stream_mut(&mut self) -> &mut OutputStream {
        &mut self.output
    }

    /// Write to the buffer. A full buffer commits the response.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.output.check_writable()?;
        self.buffer.extend_from_slice(bytes);
        if self.buffer.len() > self.buffer_size {
            self.flush_buffer();
        }
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write(s.as_bytes())
    }

    /// Hand buffered bytes off to the client, committing the response.
    pub fn flush_buffer(&mut self) {
        self.committed = true;
        self.sent.append(&mut self.buffer);
    }

    /// Drop buffered output that hasn't been sent. Sent bytes are unaffected.
    pub fn reset_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Drop buffered output and return the output stream to its initial state.
    pub fn reset_buffer_and_streams(&mut self) {
        self.reset_buffer();
        self.output = OutputStream::default();
    }

    /// Set an error status along with its canonical reason as the message.
    ///
    /// Buffered output is kept, so a body written just before is sent along with the error.
    pub fn send_error(&mut self, status: StatusCode) -> Result<()> {
        if self.committed {
            return Err(Fault::IllegalState("cannot send error after response has been committed"));
        }
        self.status = status;
        self.message = status.canonical_reason().map(str::to_owned);
        Ok(())
    }

    /// Buffered bytes, not yet sent.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Bytes sent so far.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Everything written, sent first then buffered.
    pub fn written(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.sent.len() + self.buffer.len());
        out.extend_from_slice(&self.sent);
        out.extend_from_slice(&self.buffer);
        out
    }

    /// Finish the response, for handing to the transport.
    pub fn into_response(self) -> Response {
        let mut bytes = self.sent;
        bytes.extend_from_slice(&self.buffer);

        // the body is complete here, so its length wins over a declared one
        let len = bytes.len() as u64;
        if self.content_length.map_or(false, |declared| declared != len) {
            tracing::debug!(declared = ?self.content_length, len, "content length replaced by body length");
        }

        let mut resp = Response::new(Body::from_bytes(bytes));
        *resp.status_mut() = self.status;
        *resp.version_mut() = self.version;
        *resp.headers_mut() = self.headers;

        let headers = resp.headers_mut();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        if let Ok(date) = HeaderValue::from_str(&httpdate::fmt_http_date(SystemTime::now())) {
            headers.insert(header::DATE, date);
        }

        resp
    }

    pub(crate) fn set_including(&mut self, including: bool) {
        self.including = including;
    }

    fn is_locked(&self) -> bool {
        self.committed || self.including
    }
}
