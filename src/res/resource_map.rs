use crate::res::bounded::{BoundedReader, PREALLOC_LIMIT};
use crate::res::chunk::ChunkHeader;
use crate::res::error::AxmlResult;
use std::io::Read;

/// Resource IDs aligned with the string pool: entry `i` belongs to string `i`.
///
/// The map is usually shorter than the pool since only attribute names carry IDs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceMap {
    ids: Vec<u32>,
}

impl ResourceMap {
    pub(crate) fn read<R: Read>(body: &mut BoundedReader<R>, chunk: &ChunkHeader) -> AxmlResult<Self> {
        body.skip(chunk.extended_header_size())?;
        let count = body.remaining() / 4;
        let mut ids = Vec::with_capacity(count.min(PREALLOC_LIMIT / 4) as usize);
        for _ in 0..count {
            ids.push(body.read_u32()?);
        }
        Ok(ResourceMap { ids })
    }

    /// Resource ID of the string at `string_index`, if the map covers it.
    pub fn get(&self, string_index: u32) -> Option<u32> {
        self.ids.get(string_index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }
}
