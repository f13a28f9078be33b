//! Dataset values: a shape plus a flat, row-major element buffer.

use std::fmt;

use crate::Error;

/// Identity of a stored object inside a container.
///
/// Hard links bind to an `ObjectId`; two paths holding the same id are the
/// same object.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element type of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DType {
    Float64,
    Int64,
    Text,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Float64 => "float64",
            DType::Int64 => "int64",
            DType::Text => "text",
        };
        f.write_str(name)
    }
}

/// Flat element buffer of a dataset, in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Float(Vec<f64>),
    Integer(Vec<i64>),
    Text(Vec<String>),
}

impl Data {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Data::Float(v) => v.len(),
            Data::Integer(v) => v.len(),
            Data::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            Data::Float(_) => DType::Float64,
            Data::Integer(_) => DType::Int64,
            Data::Text(_) => DType::Text,
        }
    }
}

/// An n-dimensional array with a fixed element type.
///
/// An empty `shape` is a scalar holding exactly one element. The element
/// count always equals the product of the shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    shape: Vec<usize>,
    data: Data,
}

impl Dataset {
    /// Create a dataset, checking that `data` fills `shape` exactly.
    ///
    /// # Example
    ///
    /// ```rust
    /// use spectree_core::{Data, Dataset};
    ///
    /// let ds = Dataset::new(vec![2, 3], Data::Float(vec![0.0; 6])).unwrap();
    /// assert_eq!(ds.shape(), &[2, 3]);
    ///
    /// assert!(Dataset::new(vec![2, 3], Data::Float(vec![0.0; 5])).is_err());
    /// ```
    pub fn new(shape: Vec<usize>, data: Data) -> Result<Self, Error> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::InvalidDataset {
                message: format!(
                    "shape {:?} holds {} elements but {} were given",
                    shape,
                    expected,
                    data.len()
                ),
            });
        }
        Ok(Dataset { shape, data })
    }

    /// A two-dimensional float dataset built from equally long rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Error> {
        let columns = rows.first().map_or(0, Vec::len);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(Error::InvalidDataset {
                message: format!(
                    "row {} has {} elements, expected {}",
                    i,
                    row.len(),
                    columns
                ),
            });
        }
        let values = rows.iter().flatten().copied().collect();
        Dataset::new(vec![rows.len(), columns], Data::Float(values))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Scalars have an empty shape.
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<f64> for Dataset {
    fn from(v: f64) -> Self {
        Dataset {
            shape: Vec::new(),
            data: Data::Float(vec![v]),
        }
    }
}

impl From<i64> for Dataset {
    fn from(v: i64) -> Self {
        Dataset {
            shape: Vec::new(),
            data: Data::Integer(vec![v]),
        }
    }
}

impl From<&str> for Dataset {
    fn from(v: &str) -> Self {
        Dataset::from(v.to_string())
    }
}

impl From<String> for Dataset {
    fn from(v: String) -> Self {
        Dataset {
            shape: Vec::new(),
            data: Data::Text(vec![v]),
        }
    }
}

impl From<Vec<f64>> for Dataset {
    fn from(v: Vec<f64>) -> Self {
        Dataset {
            shape: vec![v.len()],
            data: Data::Float(v),
        }
    }
}

impl From<Vec<i64>> for Dataset {
    fn from(v: Vec<i64>) -> Self {
        Dataset {
            shape: vec![v.len()],
            data: Data::Integer(v),
        }
    }
}

impl From<Vec<String>> for Dataset {
    fn from(v: Vec<String>) -> Self {
        Dataset {
            shape: vec![v.len()],
            data: Data::Text(v),
        }
    }
}
