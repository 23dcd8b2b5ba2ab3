// Parquet encoding with per-job compression
//
// Uses dictionary encoding and page statistics to keep files small and
// query-friendly. Compression is part of the job description, so the
// properties are built per call instead of cached globally.

use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression as ParquetCompression, GzipLevel, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;

use crate::error::{Result, StoreError};

/// Output compression codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Gzip,
    Snappy,
    Zstd,
    None,
}

impl std::str::FromStr for Compression {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gzip" => Ok(Compression::Gzip),
            "snappy" => Ok(Compression::Snappy),
            "zstd" => Ok(Compression::Zstd),
            "none" | "uncompressed" => Ok(Compression::None),
            _ => Err(StoreError::InvalidConfig(format!(
                "unsupported compression: {}. Supported: gzip, snappy, zstd, none",
                s
            ))),
        }
    }
}

impl Compression {
    fn parquet_setting(self) -> ParquetCompression {
        match self {
            Compression::Gzip => ParquetCompression::GZIP(GzipLevel::default()),
            Compression::Snappy => ParquetCompression::SNAPPY,
            Compression::Zstd => {
                ParquetCompression::ZSTD(ZstdLevel::try_new(2).unwrap_or_default())
            }
            Compression::None => ParquetCompression::UNCOMPRESSED,
        }
    }
}

fn writer_properties(compression: Compression) -> WriterProperties {
    // Embed the writer version so downstream readers can trace a file back
    // to the release that produced it.
    let metadata = vec![KeyValue {
        key: "datalink.version".to_string(),
        value: Some(env!("CARGO_PKG_VERSION").to_string()),
    }];

    WriterProperties::builder()
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Page)
        .set_compression(compression.parquet_setting())
        .set_max_row_group_size(32 * 1024)
        .set_key_value_metadata(Some(metadata))
        .build()
}

/// Encode one RecordBatch into Parquet bytes.
pub fn write_parquet(batch: &RecordBatch, compression: Compression) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let props = writer_properties(compression);
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props))?;

    writer.write(batch)?;
    writer.close()?;

    Ok(buffer)
}
