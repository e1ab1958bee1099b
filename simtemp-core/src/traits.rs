//! Stream Processing Traits
//!
//! Pull-based access to samples using the `nb` crate, so a consumer can poll
//! without an async runtime and still tell "nothing yet" apart from a real
//! failure.
//!
//! ```rust
//! use simtemp_core::traits::Stream;
//!
//! fn drain<S: Stream>(stream: &mut S) -> Result<usize, S::Error> {
//!     let mut count = 0;
//!     loop {
//!         match stream.poll_next() {
//!             Ok(_) => count += 1,
//!             Err(nb::Error::WouldBlock) => return Ok(count),
//!             Err(nb::Error::Other(e)) => return Err(e),
//!         }
//!     }
//! }
//! ```

/// Core stream trait for sample sources
///
/// ## Error Handling
///
/// - `nb::Error::WouldBlock` - no data right now, poll again later
/// - `nb::Error::Other(E)` - the source failed or was interrupted
pub trait Stream {
    /// Type of items produced by the stream
    type Item;

    /// Type of errors that can occur
    type Error;

    /// Attempt to pull the next item without blocking
    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error>;

    /// Returns bounds on items available right now
    ///
    /// Default implementation returns `(0, None)` indicating unknown size.
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
