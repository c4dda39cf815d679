use crate::error::MeterResult;

/// One read of mono 16-bit PCM. Its length is the number of samples actually
/// read, which may be anything from zero up to the requested block size.
pub type SampleBlock = Vec<i16>;

/// A live input stream that hands out blocks of samples.
pub trait SampleSource {
    /// Blocks until the next block is available.
    ///
    /// An empty block is a transient read of zero samples, not the end of the
    /// stream. Once the stream can deliver nothing more this returns
    /// [`MeterError::StreamEnded`](crate::error::MeterError::StreamEnded).
    fn read_block(&mut self) -> MeterResult<SampleBlock>;

    /// Releases the underlying device. Calling it again does nothing.
    fn close(&mut self);
}
