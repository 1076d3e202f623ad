//! @ai:module:intent Order-preserving partition of requests into batch-sized chunks
//! @ai:module:layer domain
//! @ai:module:public_api Chunk, chunk_requests, MAX_BATCH_SIZE
//! @ai:module:stateless true

use crate::request::RequestItem;

/// Largest number of sub-requests a batch endpoint accepts in one envelope.
pub const MAX_BATCH_SIZE: usize = 20;

/// @ai:intent A contiguous slice of the input submitted as one batch
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// floor(position / batch_size) of every item in the chunk
    pub index: usize,
    pub items: Vec<RequestItem>,
}

impl Chunk {
    /// @ai:effects pure
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// @ai:intent Split requests into chunks of at most batch_size, in input order
/// @ai:pre batch_size > 0
/// @ai:post chunk count == ceil(len / batch_size); every item appears exactly once
/// @ai:effects pure
pub fn chunk_requests(requests: &[RequestItem], batch_size: usize) -> Vec<Chunk> {
    let size = batch_size.max(1);

    requests
        .chunks(size)
        .enumerate()
        .map(|(index, items)| Chunk {
            index,
            items: items.to_vec(),
        })
        .collect()
}
