pub mod audio_stream;
pub mod estimator;
pub mod source;

pub use estimator::estimate;
pub use source::SampleSource;
