use crate::res::bounded::BoundedReader;
use crate::res::error::AxmlResult;
use crate::res::string_pool::StringRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

pub const TYPE_NULL: u8 = 0x00;
pub const TYPE_REFERENCE: u8 = 0x01;
pub const TYPE_ATTRIBUTE: u8 = 0x02;
pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_FLOAT: u8 = 0x04;
pub const TYPE_DIMENSION: u8 = 0x05;
pub const TYPE_FRACTION: u8 = 0x06;
pub const TYPE_DYNAMIC_REFERENCE: u8 = 0x07;
pub const TYPE_DYNAMIC_ATTRIBUTE: u8 = 0x08;
pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_INT_HEX: u8 = 0x11;
pub const TYPE_INT_BOOLEAN: u8 = 0x12;
pub const TYPE_INT_COLOR_ARGB8: u8 = 0x1c;
pub const TYPE_INT_COLOR_RGB8: u8 = 0x1d;
pub const TYPE_INT_COLOR_ARGB4: u8 = 0x1e;
pub const TYPE_INT_COLOR_RGB4: u8 = 0x1f;

/// Size of a serialized `Res_value`.
pub const RES_VALUE_SIZE: u16 = 8;

const COMPLEX_UNIT_MASK: u32 = 0xf;
const COMPLEX_RADIX_SHIFT: u32 = 4;
const COMPLEX_RADIX_MASK: u32 = 0x3;
const COMPLEX_MANTISSA_SHIFT: u32 = 8;
const COMPLEX_MANTISSA_MASK: u32 = 0x00ff_ffff;

const RADIX_MULTS: [f32; 4] = [
    1.0 / 256.0,
    1.0 / 32_768.0,
    1.0 / 8_388_608.0,
    1.0 / 2_147_483_648.0,
];

/// The type tag of a `Res_value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Reference,
    Attribute,
    String,
    Float,
    Dimension,
    Fraction,
    DynamicReference,
    DynamicAttribute,
    IntDec,
    IntHex,
    IntBoolean,
    IntColorArgb8,
    IntColorRgb8,
    IntColorArgb4,
    IntColorRgb4,
    Unknown(u8),
}

impl DataType {
    pub fn from_code(code: u8) -> Self {
        match code {
            TYPE_NULL => DataType::Null,
            TYPE_REFERENCE => DataType::Reference,
            TYPE_ATTRIBUTE => DataType::Attribute,
            TYPE_STRING => DataType::String,
            TYPE_FLOAT => DataType::Float,
            TYPE_DIMENSION => DataType::Dimension,
            TYPE_FRACTION => DataType::Fraction,
            TYPE_DYNAMIC_REFERENCE => DataType::DynamicReference,
            TYPE_DYNAMIC_ATTRIBUTE => DataType::DynamicAttribute,
            TYPE_INT_DEC => DataType::IntDec,
            TYPE_INT_HEX => DataType::IntHex,
            TYPE_INT_BOOLEAN => DataType::IntBoolean,
            TYPE_INT_COLOR_ARGB8 => DataType::IntColorArgb8,
            TYPE_INT_COLOR_RGB8 => DataType::IntColorRgb8,
            TYPE_INT_COLOR_ARGB4 => DataType::IntColorArgb4,
            TYPE_INT_COLOR_RGB4 => DataType::IntColorRgb4,
            other => DataType::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            DataType::Null => TYPE_NULL,
            DataType::Reference => TYPE_REFERENCE,
            DataType::Attribute => TYPE_ATTRIBUTE,
            DataType::String => TYPE_STRING,
            DataType::Float => TYPE_FLOAT,
            DataType::Dimension => TYPE_DIMENSION,
            DataType::Fraction => TYPE_FRACTION,
            DataType::DynamicReference => TYPE_DYNAMIC_REFERENCE,
            DataType::DynamicAttribute => TYPE_DYNAMIC_ATTRIBUTE,
            DataType::IntDec => TYPE_INT_DEC,
            DataType::IntHex => TYPE_INT_HEX,
            DataType::IntBoolean => TYPE_INT_BOOLEAN,
            DataType::IntColorArgb8 => TYPE_INT_COLOR_ARGB8,
            DataType::IntColorRgb8 => TYPE_INT_COLOR_RGB8,
            DataType::IntColorArgb4 => TYPE_INT_COLOR_ARGB4,
            DataType::IntColorRgb4 => TYPE_INT_COLOR_RGB4,
            DataType::Unknown(code) => code,
        }
    }
}

/// Unit of a complex (dimension or fraction) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexUnit {
    Px,
    Dip,
    Sp,
    Pt,
    In,
    Mm,
    Fraction,
    FractionParent,
    Unknown(u8),
}

impl ComplexUnit {
    fn dimension(code: u8) -> Self {
        match code {
            0 => ComplexUnit::Px,
            1 => ComplexUnit::Dip,
            2 => ComplexUnit::Sp,
            3 => ComplexUnit::Pt,
            4 => ComplexUnit::In,
            5 => ComplexUnit::Mm,
            other => ComplexUnit::Unknown(other),
        }
    }

    fn fraction(code: u8) -> Self {
        match code {
            0 => ComplexUnit::Fraction,
            1 => ComplexUnit::FractionParent,
            other => ComplexUnit::Unknown(other),
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ComplexUnit::Px => "px",
            ComplexUnit::Dip => "dip",
            ComplexUnit::Sp => "sp",
            ComplexUnit::Pt => "pt",
            ComplexUnit::In => "in",
            ComplexUnit::Mm => "mm",
            ComplexUnit::Fraction => "%",
            ComplexUnit::FractionParent => "%p",
            ComplexUnit::Unknown(_) => "",
        }
    }
}

/// A raw `Res_value`: type tag plus 32-bit payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResValue {
    pub size: u16,
    pub data_type: DataType,
    pub data: u32,
}

impl ResValue {
    pub fn new(data_type: DataType, data: u32) -> Self {
        ResValue {
            size: RES_VALUE_SIZE,
            data_type,
            data,
        }
    }

    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>) -> AxmlResult<Self> {
        let size = body.read_u16()?;
        body.read_u8()?; // res0
        let data_type = DataType::from_code(body.read_u8()?);
        let data = body.read_u32()?;
        Ok(ResValue {
            size,
            data_type,
            data,
        })
    }

    /// Interpret the payload according to the type tag.
    pub fn decode(&self) -> Value {
        let data = self.data;
        match self.data_type {
            DataType::Null => Value::Null,
            DataType::Reference => Value::Reference(data),
            DataType::Attribute => Value::Attribute(data),
            DataType::String => Value::String(StringRef::from_raw(data)),
            DataType::Float => Value::Float(f32::from_bits(data)),
            DataType::Dimension => Value::Dimension {
                value: complex_to_float(data),
                unit: ComplexUnit::dimension((data & COMPLEX_UNIT_MASK) as u8),
            },
            DataType::Fraction => Value::Fraction {
                value: complex_to_float(data),
                unit: ComplexUnit::fraction((data & COMPLEX_UNIT_MASK) as u8),
            },
            DataType::DynamicReference => Value::DynamicReference(data),
            DataType::DynamicAttribute => Value::DynamicAttribute(data),
            DataType::IntDec => Value::Int(data as i32),
            DataType::IntHex => Value::Hex(data),
            DataType::IntBoolean => Value::Bool(data != 0),
            DataType::IntColorArgb8
            | DataType::IntColorRgb8
            | DataType::IntColorArgb4
            | DataType::IntColorRgb4 => Value::Color(data),
            DataType::Unknown(code) => Value::Unknown { data_type: code, data },
        }
    }
}

/// An interpreted `Res_value`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Reference(u32),
    Attribute(u32),
    String(StringRef),
    Float(f32),
    Dimension { value: f32, unit: ComplexUnit },
    /// `value` is the raw ratio; `0.5` is rendered as `50.0%`.
    Fraction { value: f32, unit: ComplexUnit },
    DynamicReference(u32),
    DynamicAttribute(u32),
    Int(i32),
    Hex(u32),
    Bool(bool),
    /// Always expanded to `0xAARRGGBB`.
    Color(u32),
    Unknown { data_type: u8, data: u32 },
}

impl Value {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(value) => Some(*value),
            Value::Hex(value) => Some(*value as i32),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_reference_id(&self) -> Option<u32> {
        match self {
            Value::Reference(id) | Value::DynamicReference(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Reference(id) | Value::DynamicReference(id) => write!(f, "@0x{id:08x}"),
            Value::Attribute(id) | Value::DynamicAttribute(id) => write!(f, "?0x{id:08x}"),
            Value::String(reference) => match reference.index() {
                Some(index) => write!(f, "@string#{index}"),
                None => Ok(()),
            },
            Value::Float(value) => write_float(f, *value),
            Value::Dimension { value, unit } => {
                write_float(f, *value)?;
                f.write_str(unit.suffix())
            }
            Value::Fraction { value, unit } => {
                write_float(f, *value * 100.0)?;
                f.write_str(unit.suffix())
            }
            Value::Int(value) => write!(f, "{value}"),
            Value::Hex(value) => write!(f, "0x{value:x}"),
            Value::Bool(flag) => f.write_str(if *flag { "true" } else { "false" }),
            Value::Color(argb) => write!(f, "#{argb:08x}"),
            Value::Unknown { data_type, data } => write!(f, "<0x{data_type:02x}>0x{data:08x}"),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f32) -> fmt::Result {
    if value.fract() == 0.0 && value.is_finite() {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

/// Decode the mantissa/radix encoding shared by dimensions and fractions.
pub fn complex_to_float(data: u32) -> f32 {
    let mantissa = (data & (COMPLEX_MANTISSA_MASK << COMPLEX_MANTISSA_SHIFT)) as i32;
    let radix = ((data >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK) as usize;
    mantissa as f32 * RADIX_MULTS[radix]
}
