//! Reading and writing NumPy `.npy` arrays.
//!
//! Supports format versions 1 to 3, C order, little-endian floats (`f4`, `f8`), signed and
//! unsigned integers, booleans and fixed-width unicode strings (`<U{n}`).
//!
//! Reference: <https://numpy.org/devdocs/reference/generated/numpy.lib.format.html>
use nalgebra::{DMatrix, DVector};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::PipelineError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Headers are padded so that the data starts on a multiple of this alignment.
const HEADER_ALIGNMENT: usize = 64;

/// The element type of an array, as encoded in the `descr` field of the header.
#[derive(Debug, PartialEq, Clone, Copy)]
enum Dtype {
    Float(usize),
    Int(usize),
    UInt(usize),
    Bool,
    Unicode(usize),
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self, PipelineError> {
        let malformed = || PipelineError::MalformedArray(format!("unsupported dtype '{}'", descr));

        let mut chars = descr.chars();
        let byte_order = chars.next().ok_or_else(malformed)?;
        let kind = chars.next().ok_or_else(malformed)?;
        let size: usize = chars.as_str().parse().map_err(|_| malformed())?;

        let dtype = match (kind, size) {
            ('f', 4) | ('f', 8) => Dtype::Float(size),
            ('i', 1) | ('i', 2) | ('i', 4) | ('i', 8) => Dtype::Int(size),
            ('u', 1) | ('u', 2) | ('u', 4) | ('u', 8) => Dtype::UInt(size),
            ('b', 1) => Dtype::Bool,
            ('U', n) => Dtype::Unicode(n),
            _ => return Err(malformed()),
        };

        match byte_order {
            '<' | '=' | '|' => Ok(dtype),
            '>' if dtype.item_size() == 1 => Ok(dtype),
            _ => Err(malformed()),
        }
    }

    fn item_size(&self) -> usize {
        match self {
            Dtype::Float(size) | Dtype::Int(size) | Dtype::UInt(size) => *size,
            Dtype::Bool => 1,
            Dtype::Unicode(n) => 4 * n,
        }
    }
}

/// The content of an array, flattened in C order.
#[derive(Debug, PartialEq, Clone)]
pub enum NpyData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Str(Vec<String>),
}

impl NpyData {
    fn len(&self) -> usize {
        match self {
            NpyData::Float(data) => data.len(),
            NpyData::Int(data) => data.len(),
            NpyData::Str(data) => data.len(),
        }
    }
}

/// An n-dimensional array as stored in a `.npy` file.
#[derive(Debug, PartialEq, Clone)]
pub struct NpyArray {
    shape: Vec<usize>,
    data: NpyData,
}

impl NpyArray {
    /// Create an array with the given shape and (C order) data.
    /// The function returns an error if the shape does not match the number of elements.
    pub fn build(shape: Vec<usize>, data: NpyData) -> Result<Self, PipelineError> {
        let expected = checked_num_items(&shape).ok_or_else(|| {
            PipelineError::ShapeMismatch(format!("shape {:?} is too large", shape))
        })?;
        if expected != data.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "shape {:?} holds {} elements but {} were provided",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(NpyArray { shape, data })
    }

    /// A one-dimensional array of floats.
    pub fn from_floats(data: Vec<f64>) -> Self {
        NpyArray {
            shape: vec![data.len()],
            data: NpyData::Float(data),
        }
    }

    /// A one-dimensional array of strings.
    pub fn from_strings(data: Vec<String>) -> Self {
        NpyArray {
            shape: vec![data.len()],
            data: NpyData::Str(data),
        }
    }

    /// A two-dimensional array of floats with the same layout as the matrix.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let data = matrix.transpose().as_slice().to_vec();
        NpyArray {
            shape: vec![matrix.nrows(), matrix.ncols()],
            data: NpyData::Float(data),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &NpyData {
        &self.data
    }

    /// The elements converted to floats.
    pub fn to_floats(&self) -> Result<Vec<f64>, PipelineError> {
        match &self.data {
            NpyData::Float(data) => Ok(data.clone()),
            NpyData::Int(data) => Ok(data.iter().map(|&x| x as f64).collect()),
            NpyData::Str(_) => Err(PipelineError::MalformedArray(
                "expected a numeric array, found strings".to_string(),
            )),
        }
    }

    /// The elements as strings, numbers are not converted.
    pub fn to_strings(&self) -> Result<Vec<String>, PipelineError> {
        match &self.data {
            NpyData::Str(data) => Ok(data.clone()),
            _ => Err(PipelineError::MalformedArray(
                "expected a string array, found numbers".to_string(),
            )),
        }
    }

    /// Interpret a one-dimensional array as a vector.
    pub fn to_vector(&self) -> Result<DVector<f64>, PipelineError> {
        if self.shape.len() != 1 {
            return Err(PipelineError::ShapeMismatch(format!(
                "expected a one-dimensional array, found shape {:?}",
                self.shape
            )));
        }
        Ok(DVector::from_vec(self.to_floats()?))
    }

    /// Interpret a two-dimensional array as a matrix.
    pub fn to_matrix(&self) -> Result<DMatrix<f64>, PipelineError> {
        match self.shape[..] {
            [nrows, ncols] => Ok(DMatrix::from_row_slice(nrows, ncols, &self.to_floats()?)),
            _ => Err(PipelineError::ShapeMismatch(format!(
                "expected a two-dimensional array, found shape {:?}",
                self.shape
            ))),
        }
    }

    /// Read an array from a reader positioned at the magic string.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, PipelineError> {
        let mut magic = [0u8; 6];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(PipelineError::MalformedArray(
                "not a .npy file (bad magic string)".to_string(),
            ));
        }

        let mut version = [0u8; 2];
        reader.read_exact(&mut version)?;
        let header_len = match version[0] {
            1 => {
                let mut buf = [0u8; 2];
                reader.read_exact(&mut buf)?;
                u16::from_le_bytes(buf) as usize
            }
            2 | 3 => {
                let mut buf = [0u8; 4];
                reader.read_exact(&mut buf)?;
                u32::from_le_bytes(buf) as usize
            }
            major => {
                return Err(PipelineError::MalformedArray(format!(
                    "unsupported format version {}.{}",
                    major, version[1]
                )))
            }
        };

        let mut header = vec![0u8; header_len];
        reader.read_exact(&mut header)?;
        let header = String::from_utf8(header)
            .map_err(|e| PipelineError::MalformedArray(format!("invalid header: {}", e)))?;
        let (dtype, fortran_order, shape) = parse_header(&header)?;
        if fortran_order && shape.len() > 1 {
            return Err(PipelineError::MalformedArray(
                "Fortran-ordered arrays are not supported".to_string(),
            ));
        }

        let num_items = checked_num_items(&shape).ok_or_else(|| {
            PipelineError::MalformedArray(format!("shape {:?} is too large", shape))
        })?;
        let num_bytes = num_items.checked_mul(dtype.item_size()).ok_or_else(|| {
            PipelineError::MalformedArray(format!("shape {:?} is too large", shape))
        })?;
        let mut bytes = vec![];
        reader.take((num_bytes as u64).saturating_add(1)).read_to_end(&mut bytes)?;
        if bytes.len() != num_bytes {
            return Err(PipelineError::MalformedArray(format!(
                "expected {} bytes of data, found {}{}",
                num_bytes,
                bytes.len(),
                if bytes.len() > num_bytes { " or more" } else { "" }
            )));
        }

        let data = decode(dtype, &bytes, num_items)?;
        NpyArray::build(shape, data)
    }

    /// Write the array (format version 1.0).
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), PipelineError> {
        let (descr, bytes) = encode(&self.data);
        let shape = match self.shape.as_slice() {
            [n] => format!("({},)", n),
            dims => format!(
                "({})",
                dims.iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        let mut header = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
            descr, shape
        );
        let preamble = MAGIC.len() + 2 + 2;
        let padding = (HEADER_ALIGNMENT - (preamble + header.len() + 1) % HEADER_ALIGNMENT)
            % HEADER_ALIGNMENT;
        header.push_str(&" ".repeat(padding));
        header.push('\n');
        let header_len = u16::try_from(header.len()).map_err(|_| {
            PipelineError::MalformedArray("header too long for format version 1.0".to_string())
        })?;

        writer.write_all(MAGIC)?;
        writer.write_all(&[1, 0])?;
        writer.write_all(&header_len.to_le_bytes())?;
        writer.write_all(header.as_bytes())?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Load an array from a `.npy` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PipelineError::IOError(format!("cannot open {}: {}", path.display(), e))
        })?;
        let mut reader = BufReader::new(file);
        NpyArray::read(&mut reader)
    }

    /// Save the array to a `.npy` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// The number of elements of an array, `None` on overflow.
fn checked_num_items(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |n, &dim| n.checked_mul(dim))
}

/// Extract the raw text of the value associated with a key of the header dictionary.
fn header_value<'a>(header: &'a str, key: &str) -> Result<&'a str, PipelineError> {
    let quoted = format!("'{}'", key);
    let start = header.find(&quoted).ok_or_else(|| {
        PipelineError::MalformedArray(format!("header has no '{}' entry", key))
    })?;
    let rest = header[start + quoted.len()..].trim_start();
    rest.strip_prefix(':')
        .map(str::trim_start)
        .ok_or_else(|| PipelineError::MalformedArray(format!("malformed '{}' entry", key)))
}

fn parse_header(header: &str) -> Result<(Dtype, bool, Vec<usize>), PipelineError> {
    let descr = header_value(header, "descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|s| s.split('\'').next())
        .ok_or_else(|| PipelineError::MalformedArray("malformed 'descr' entry".to_string()))?;
    let dtype = Dtype::parse(descr)?;

    let fortran_order = header_value(header, "fortran_order")?;
    let fortran_order = if fortran_order.starts_with("True") {
        true
    } else if fortran_order.starts_with("False") {
        false
    } else {
        return Err(PipelineError::MalformedArray(
            "malformed 'fortran_order' entry".to_string(),
        ));
    };

    let shape = header_value(header, "shape")?;
    let shape = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or_else(|| PipelineError::MalformedArray("malformed 'shape' entry".to_string()))?;
    let shape = shape
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>().map_err(|_| {
                PipelineError::MalformedArray(format!("invalid dimension '{}'", dim))
            })
        })
        .collect::<Result<Vec<usize>, _>>()?;

    Ok((dtype, fortran_order, shape))
}

fn decode(dtype: Dtype, bytes: &[u8], num_items: usize) -> Result<NpyData, PipelineError> {
    let chunks = bytes.chunks_exact(dtype.item_size().max(1));
    let data = match dtype {
        Dtype::Float(4) => NpyData::Float(
            chunks
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
                .collect(),
        ),
        Dtype::Float(_) => NpyData::Float(
            chunks
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect(),
        ),
        Dtype::Int(size) => NpyData::Int(
            chunks
                .map(|c| {
                    // sign-extend from the most significant byte
                    let fill = if c[size - 1] & 0x80 != 0 { 0xff } else { 0x00 };
                    let mut buf = [fill; 8];
                    buf[..size].copy_from_slice(c);
                    i64::from_le_bytes(buf)
                })
                .collect(),
        ),
        Dtype::UInt(size) => NpyData::Int(
            chunks
                .map(|c| {
                    let mut buf = [0u8; 8];
                    buf[..size].copy_from_slice(c);
                    i64::try_from(u64::from_le_bytes(buf)).map_err(|_| {
                        PipelineError::MalformedArray("unsigned value overflows i64".to_string())
                    })
                })
                .collect::<Result<Vec<i64>, _>>()?,
        ),
        Dtype::Bool => NpyData::Int(chunks.map(|c| i64::from(c[0] != 0)).collect()),
        Dtype::Unicode(0) => NpyData::Str(vec![String::new(); num_items]),
        Dtype::Unicode(_) => NpyData::Str(
            chunks
                .map(|c| {
                    c.chunks_exact(4)
                        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                        .take_while(|&code| code != 0)
                        .map(|code| {
                            char::from_u32(code).ok_or_else(|| {
                                PipelineError::MalformedArray(format!(
                                    "invalid code point {:#x}",
                                    code
                                ))
                            })
                        })
                        .collect::<Result<String, _>>()
                })
                .collect::<Result<Vec<String>, _>>()?,
        ),
    };
    Ok(data)
}

fn encode(data: &NpyData) -> (String, Vec<u8>) {
    match data {
        NpyData::Float(data) => (
            "<f8".to_string(),
            data.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ),
        NpyData::Int(data) => (
            "<i8".to_string(),
            data.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ),
        NpyData::Str(data) => {
            let width = data.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(1);
            let bytes = data
                .iter()
                .flat_map(|s| {
                    s.chars()
                        .map(|c| c as u32)
                        .chain(std::iter::repeat(0))
                        .take(width)
                        .flat_map(|code| code.to_le_bytes())
                        .collect::<Vec<u8>>()
                })
                .collect();
            (format!("<U{}", width), bytes)
        }
    }
}
