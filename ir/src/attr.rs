//! Typed node attributes.
//!
//! Attribute equality used by the matcher is byte-exact: values are compared
//! through [`AttrValue::canonical_bytes`], so `-0.0 != 0.0` and `NaN == NaN`
//! when the bit patterns agree.

use derive_more::{Display, From};
use smallvec::SmallVec;

use crate::types::DataType;

/// Constant tensor payload.
#[derive(Debug, Clone, PartialEq, Display)]
#[display("tensor<{dtype}, {shape:?}, {} bytes>", data.len())]
pub struct TensorValue {
    pub dtype: DataType,
    pub shape: SmallVec<[i64; 4]>,
    pub data: Vec<u8>,
}

impl TensorValue {
    pub fn new(dtype: DataType, shape: impl IntoIterator<Item = i64>, data: Vec<u8>) -> Self {
        Self { dtype, shape: shape.into_iter().collect(), data }
    }

    /// Rank-0 `float32` tensor.
    pub fn scalar_f32(value: f32) -> Self {
        Self::new(DataType::Float32, [], value.to_le_bytes().to_vec())
    }

    /// Rank-0 `int64` tensor.
    pub fn scalar_i64(value: i64) -> Self {
        Self::new(DataType::Int64, [], value.to_le_bytes().to_vec())
    }

    /// One-dimensional `float32` tensor.
    pub fn from_f32s(values: &[f32]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(DataType::Float32, [values.len() as i64], data)
    }
}

/// Attribute value attached to a node.
#[derive(Debug, Clone, PartialEq, From)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    #[from(ignore)]
    Str(String),
    ListInt(Vec<i64>),
    ListFloat(Vec<f64>),
    ListBool(Vec<bool>),
    ListStr(Vec<String>),
    Tensor(TensorValue),
    #[from(ignore)]
    Shape(Vec<i64>),
}

impl AttrValue {
    /// Stable tag per variant, the first byte of the canonical encoding.
    fn tag(&self) -> u8 {
        match self {
            Self::Int(_) => 0,
            Self::Float(_) => 1,
            Self::Bool(_) => 2,
            Self::Str(_) => 3,
            Self::ListInt(_) => 4,
            Self::ListFloat(_) => 5,
            Self::ListBool(_) => 6,
            Self::ListStr(_) => 7,
            Self::Tensor(_) => 8,
            Self::Shape(_) => 9,
        }
    }

    /// Canonical little-endian encoding of the value.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = vec![self.tag()];
        match self {
            Self::Int(v) => out.extend(v.to_le_bytes()),
            Self::Float(v) => out.extend(v.to_bits().to_le_bytes()),
            Self::Bool(v) => out.push(*v as u8),
            Self::Str(s) => encode_str(&mut out, s),
            Self::ListInt(vs) | Self::Shape(vs) => {
                encode_len(&mut out, vs.len());
                vs.iter().for_each(|v| out.extend(v.to_le_bytes()));
            }
            Self::ListFloat(vs) => {
                encode_len(&mut out, vs.len());
                vs.iter().for_each(|v| out.extend(v.to_bits().to_le_bytes()));
            }
            Self::ListBool(vs) => {
                encode_len(&mut out, vs.len());
                out.extend(vs.iter().map(|&v| v as u8));
            }
            Self::ListStr(vs) => {
                encode_len(&mut out, vs.len());
                vs.iter().for_each(|s| encode_str(&mut out, s));
            }
            Self::Tensor(t) => {
                out.push(t.dtype as u8);
                encode_len(&mut out, t.shape.len());
                t.shape.iter().for_each(|d| out.extend(d.to_le_bytes()));
                encode_len(&mut out, t.data.len());
                out.extend_from_slice(&t.data);
            }
        }
        out
    }

    /// Byte-exact comparison.
    pub fn bytes_eq(&self, other: &AttrValue) -> bool {
        self.tag() == other.tag() && self.canonical_bytes() == other.canonical_bytes()
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::ListStr(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

fn encode_len(out: &mut Vec<u8>, len: usize) {
    out.extend((len as u64).to_le_bytes());
}

fn encode_str(out: &mut Vec<u8>, s: &str) {
    encode_len(out, s.len());
    out.extend_from_slice(s.as_bytes());
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::ListInt(v) => write!(f, "{v:?}"),
            Self::ListFloat(v) => write!(f, "{v:?}"),
            Self::ListBool(v) => write!(f, "{v:?}"),
            Self::ListStr(v) => write!(f, "{v:?}"),
            Self::Tensor(t) => write!(f, "{t}"),
            Self::Shape(v) => write!(f, "shape{v:?}"),
        }
    }
}
