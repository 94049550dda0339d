//! Reader and dataset tests over in-memory TIFF fixtures

mod dataset_tests;
mod reader_tests;
