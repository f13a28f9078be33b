//! Dataset creation options mapped onto HDF5 storage filters.

use serde_json::Value;
use spectree_core::{DatasetOptions, Error};

/// Gzip level used when `compression` is given without `compression_opts`.
const DEFAULT_DEFLATE_LEVEL: u8 = 4;

/// Storage settings for one chunked dataset.
///
/// Recognized options, with the value forms h5py accepts:
///
/// | key | value |
/// |-----|-------|
/// | `compression` | `"gzip"`, a gzip level `0..=9`, or `null` |
/// | `compression_opts` | gzip level `0..=9` |
/// | `shuffle` | `true` / `false` |
/// | `fletcher32` | `true` / `false` |
/// | `chunks` | `true` for one chunk per dataset, or a list of positive sizes |
///
/// Any other key is a configuration error.
///
/// ```rust
/// use spectree_core::DatasetOptions;
/// use spectree_h5::Filters;
///
/// let options = DatasetOptions::new()
///     .with("compression", "gzip")
///     .with("shuffle", true);
/// let filters = Filters::from_options(Some(&options)).unwrap();
/// assert_eq!(filters.deflate, Some(4));
/// assert_eq!(filters.chunk_for(&[2, 1024]).unwrap(), Some(vec![2, 1024]));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filters {
    pub deflate: Option<u8>,
    pub shuffle: bool,
    pub fletcher32: bool,
    /// Explicit chunk shape.
    pub chunks: Option<Vec<usize>>,
    /// Chunked layout was asked for without a shape.
    pub auto_chunk: bool,
}

impl Filters {
    /// Validate `options` and turn them into filters.
    pub fn from_options(options: Option<&DatasetOptions>) -> Result<Self, Error> {
        let mut filters = Filters::default();
        let Some(options) = options else {
            return Ok(filters);
        };

        let mut gzip = false;
        let mut level = None;
        for (key, value) in options.iter() {
            match key.as_str() {
                "compression" => match value {
                    Value::Null => {}
                    Value::String(name) if name == "gzip" => gzip = true,
                    Value::Number(_) => {
                        gzip = true;
                        level = Some(deflate_level(key, value)?);
                    }
                    other => {
                        return Err(Error::config(format!(
                            "unsupported compression {}, expected \"gzip\" or a level 0-9",
                            other
                        )))
                    }
                },
                "compression_opts" => level = Some(deflate_level(key, value)?),
                "shuffle" => filters.shuffle = flag(key, value)?,
                "fletcher32" => filters.fletcher32 = flag(key, value)?,
                "chunks" => match value {
                    Value::Null | Value::Bool(false) => {}
                    Value::Bool(true) => filters.auto_chunk = true,
                    Value::Array(sizes) => filters.chunks = Some(chunk_shape(sizes)?),
                    other => {
                        return Err(Error::config(format!(
                            "invalid chunks {}, expected true or a list of sizes",
                            other
                        )))
                    }
                },
                other => {
                    return Err(Error::config(format!(
                        "unsupported dataset option {:?}",
                        other
                    )))
                }
            }
        }

        if gzip {
            filters.deflate = Some(level.unwrap_or(DEFAULT_DEFLATE_LEVEL));
        } else if level.is_some() {
            return Err(Error::config(
                "compression_opts given without compression",
            ));
        }
        Ok(filters)
    }

    /// No filter and no chunked layout.
    pub fn is_empty(&self) -> bool {
        *self == Filters::default()
    }

    /// Chunk shape for a dataset of `shape`, or `None` for contiguous
    /// storage.
    ///
    /// Filters need a chunked layout, so any filter without an explicit chunk
    /// shape gets a single chunk covering the dataset.
    pub fn chunk_for(&self, shape: &[usize]) -> Result<Option<Vec<usize>>, Error> {
        if let Some(chunks) = &self.chunks {
            if chunks.len() != shape.len() {
                return Err(Error::config(format!(
                    "chunk shape {:?} does not match dataset shape {:?}",
                    chunks, shape
                )));
            }
            return Ok(Some(chunks.clone()));
        }
        let needs_chunks =
            self.auto_chunk || self.deflate.is_some() || self.shuffle || self.fletcher32;
        if !needs_chunks || shape.is_empty() {
            return Ok(None);
        }
        Ok(Some(shape.iter().map(|&n| n.max(1)).collect()))
    }
}

fn deflate_level(key: &str, value: &Value) -> Result<u8, Error> {
    match value.as_u64() {
        Some(level) if level <= 9 => Ok(level as u8),
        _ => Err(Error::config(format!(
            "invalid {} {}, expected a gzip level 0-9",
            key, value
        ))),
    }
}

fn flag(key: &str, value: &Value) -> Result<bool, Error> {
    value
        .as_bool()
        .ok_or_else(|| Error::config(format!("invalid {} {}, expected true or false", key, value)))
}

fn chunk_shape(sizes: &[Value]) -> Result<Vec<usize>, Error> {
    sizes
        .iter()
        .map(|size| match size.as_u64() {
            Some(n) if n > 0 => Ok(n as usize),
            _ => Err(Error::config(format!(
                "invalid chunk size {}, expected a positive integer",
                size
            ))),
        })
        .collect()
}
