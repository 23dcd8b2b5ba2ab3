// datalink-store - Storage-facing collaborators for the export pipeline
//
// Everything that touches bytes lives here: the OpenDAL operator, the
// JSONL table source, and the partitioned Parquet sink. The pipeline
// driver only sees the RecordSource and PartitionSink traits.

pub mod batch;
pub mod encoding;
mod error;
pub mod partition;
pub mod source;
pub mod storage;
pub mod writer;

pub use encoding::Compression;
pub use error::StoreError;
pub use source::JsonlTableSource;
pub use storage::build_operator;
pub use writer::ParquetPartitionWriter;
