// the simulated data area a program's pointers point into
//
// every buffer, string and pointed-to struct built for a call
// gets its own region, handed out by a bump allocator that
// only ever moves forward within one program
//
pub const WORD_SIZE: usize = 8;

use crate::auxiliary::constants::memory::{DATA_BASE_ADDRESS, DATA_GRANULE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryModel {
    pub base_address: u64,
    pub granule: u64,
}

impl Default for MemoryModel {
    fn default() -> Self {
        MemoryModel {
            base_address: DATA_BASE_ADDRESS,
            granule: DATA_GRANULE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryRegion {
    pub base_address: u64,
    pub length: u64,
    pub contents: Vec<u8>,
}

impl MemoryRegion {
    pub fn end(&self) -> u64 {
        self.base_address + self.length
    }

    pub fn overlaps(&self, other: &MemoryRegion) -> bool {
        self.base_address < other.end() && other.base_address < self.end()
    }
}

#[derive(Debug)]
pub struct MemoryAllocator {
    model: MemoryModel,
    next_address: u64,
}

impl MemoryAllocator {
    pub fn new(model: MemoryModel) -> Self {
        MemoryAllocator {
            model,
            next_address: model.base_address,
        }
    }

    pub fn next_address(&self) -> u64 {
        self.next_address
    }

    pub fn allocate(&mut self, contents: Vec<u8>) -> MemoryRegion {
        let length = contents.len() as u64;
        let base_address = self.next_address;
        // an empty region still takes a granule so the next one lands above it
        let granule = self.model.granule.max(1);
        let footprint = length.max(1).div_ceil(granule) * granule;
        self.next_address = base_address.saturating_add(footprint);
        MemoryRegion {
            base_address,
            length,
            contents,
        }
    }
}

// writes `bytes` at `offset`, growing the buffer with zeroes when needed
pub fn poke(buffer: &mut Vec<u8>, offset: usize, bytes: &[u8]) {
    let end = offset + bytes.len();
    if buffer.len() < end {
        buffer.resize(end, 0);
    }
    buffer[offset..end].copy_from_slice(bytes);
}

pub fn word_bytes(value: u64) -> [u8; WORD_SIZE] {
    value.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_start_at_the_data_area_and_round_to_the_granule() {
        let mut allocator = MemoryAllocator::new(MemoryModel::default());
        let first = allocator.allocate(b"file\0".to_vec());
        let second = allocator.allocate(vec![0; 65]);
        let third = allocator.allocate(vec![1]);

        assert_eq!(first.base_address, 0x7f00_0000_0000);
        assert_eq!(first.length, 5);
        assert_eq!(second.base_address, 0x7f00_0000_0040);
        assert_eq!(third.base_address, 0x7f00_0000_00c0);
    }

    #[test]
    fn empty_regions_still_advance() {
        let mut allocator = MemoryAllocator::new(MemoryModel::default());
        let empty = allocator.allocate(Vec::new());
        let next = allocator.allocate(vec![7]);
        assert_eq!(empty.length, 0);
        assert!(next.base_address > empty.base_address);
    }

    #[test]
    fn zero_granule_behaves_like_byte_granularity() {
        let mut allocator = MemoryAllocator::new(MemoryModel {
            base_address: 0x1000,
            granule: 0,
        });
        allocator.allocate(vec![0; 3]);
        assert_eq!(allocator.next_address(), 0x1003);
    }

    #[test]
    fn poke_grows_and_overwrites() {
        let mut buffer = vec![0xaa; 2];
        poke(&mut buffer, 1, &[1, 2, 3]);
        assert_eq!(buffer, vec![0xaa, 1, 2, 3]);

        let region = MemoryAllocator::new(MemoryModel::default()).allocate(buffer);
        assert_eq!(region.length, 4);
        assert_eq!(region.contents[1..3], [1, 2]);
    }
}
