//! Wire-level structures of Android's resource chunk format, as used by binary XML.

#[macro_use]
pub mod error;

pub(crate) mod bounded;
pub mod chunk;
pub mod resource_map;
pub mod string_pool;
pub mod tree;
pub mod value;

pub use chunk::{ChunkHeader, ChunkType};
pub use error::{AxmlError, AxmlResult};
pub use resource_map::ResourceMap;
pub use string_pool::{StringPool, StringPoolFlags, StringPoolHeader, StringRef, StyleSpan, Styles};
pub use tree::{Attribute, CdataExt, EndElementExt, NamespaceExt, NodeExtension, StartElementExt, XmlNode};
pub use value::{ComplexUnit, DataType, ResValue, Value};
