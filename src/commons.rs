use std::fmt;

use crate::error::SimError;

// system specs

/// Width of every address in bits.
pub const ADDRESS_BITS: u32 = 32;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Protocol {
    #[default]
    Msi,
    Mesi,
}

impl Protocol {
    /// Whether lines may enter the Exclusive state.
    pub fn allow_exclusive(&self) -> bool {
        matches!(self, Protocol::Mesi)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SystemSpec {         // unit         reasonable defaults
    pub protocol: Protocol,     // -            MSI
    pub cache_size: u32,        // lines        512
    pub line_size: u32,         // bytes        4
    pub num_caches: usize,      // caches       4
}

impl Default for SystemSpec {
    fn default() -> Self {
        SystemSpec {
            protocol: Protocol::Msi,
            cache_size: 512,
            line_size: 4,
            num_caches: 4,
        }
    }
}

impl SystemSpec {
    /// Checks the configuration and derives the address layout all caches share.
    pub fn validate(&self) -> Result<AddressLayout, SimError> {
        if self.num_caches == 0 {
            return Err(SimError::NoCaches);
        }
        AddressLayout::new(self.cache_size, self.line_size)
    }
}

// latency table, in clock cycles

pub mod latency {
    pub const CACHE_PROBE: u64 = 1;
    pub const CACHE_ACCESS: u64 = 1;
    pub const SRAM_ACCESS: u64 = 1;
    pub const DIRECTORY_ACCESS: u64 = 1;
    pub const PROCESSOR_HOP: u64 = 3;
    pub const DIRECTORY_HOP: u64 = 5;
    pub const MEMORY_ACCESS: u64 = 15;
}

// addresses

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Addr(pub u32);

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits addresses into `tag | index | offset`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AddressLayout {
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
}

impl AddressLayout {
    pub fn new(cache_size: u32, line_size: u32) -> Result<Self, SimError> {
        let offset_bits = log2("line size", line_size)?;
        let index_bits = log2("cache size", cache_size)?;
        if offset_bits + index_bits > ADDRESS_BITS {
            return Err(SimError::AddressWidth { index_bits, offset_bits });
        }
        Ok(AddressLayout {
            offset_bits,
            index_bits,
            tag_bits: ADDRESS_BITS - index_bits - offset_bits,
        })
    }

    /// get tag, index and offset of an address
    pub fn decode(&self, addr: Addr) -> (u32, usize, u32) {
        let tag = shr(addr.0, self.offset_bits + self.index_bits);
        let index = shr(addr.0, self.offset_bits) & mask(self.index_bits);
        let offset = addr.0 & mask(self.offset_bits);
        (tag, index as usize, offset)
    }

    /// the address of the first byte of the block held at `index` under `tag`
    pub fn stored_address(&self, tag: u32, index: usize) -> Addr {
        let tag_part = shl(tag, self.offset_bits + self.index_bits);
        let index_part = shl(index as u32, self.offset_bits);
        Addr(tag_part | index_part)
    }

    pub fn num_lines(&self) -> usize {
        1usize << self.index_bits
    }
}

fn log2(what: &'static str, value: u32) -> Result<u32, SimError> {
    if !value.is_power_of_two() {
        return Err(SimError::NotPowerOfTwo { what, value });
    }
    Ok(value.trailing_zeros())
}

// shifts by the full address width yield zero instead of overflowing
fn shr(value: u32, bits: u32) -> u32 {
    value.checked_shr(bits).unwrap_or(0)
}

fn shl(value: u32, bits: u32) -> u32 {
    value.checked_shl(bits).unwrap_or(0)
}

fn mask(bits: u32) -> u32 {
    shl(1, bits).wrapping_sub(1)
}

// caches and instructions

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CacheId(pub usize);

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instr {
    Read(Addr),
    Write(Addr),
}
