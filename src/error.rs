use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    NotPowerOfTwo { what: &'static str, value: u32 },
    AddressWidth { index_bits: u32, offset_bits: u32 },
    NoCaches,
    UnknownCore { core: usize, num_caches: usize },
    DuplicateCache { core: usize },
    /// an instruction finished without recording a private, remote or off-chip access
    UnclassifiedInstruction { instruction: u64 },
    Trace { line: usize, reason: String },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::NotPowerOfTwo { what, value } => {
                write!(f, "{what} must be a power of two, got {value}")
            }
            SimError::AddressWidth { index_bits, offset_bits } => write!(
                f,
                "{index_bits} index bits and {offset_bits} offset bits do not fit a 32 bit address"
            ),
            SimError::NoCaches => write!(f, "at least one cache is required"),
            SimError::UnknownCore { core, num_caches } => {
                write!(f, "core {core} does not exist, only {num_caches} caches configured")
            }
            SimError::DuplicateCache { core } => {
                write!(f, "cache {core} is already registered with the directory")
            }
            SimError::UnclassifiedInstruction { instruction } => write!(
                f,
                "instruction {instruction} did not perform a private, remote or off-chip access"
            ),
            SimError::Trace { line, reason } => write!(f, "trace line {line}: {reason}"),
        }
    }
}

impl Error for SimError {}
