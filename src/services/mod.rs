pub mod extractor;
pub mod formatter;
pub mod metrics;
pub mod upstream;
