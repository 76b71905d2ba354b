/// Everything that can stop the machine.
///
/// None of these are recoverable: the run loop returns as soon as one is raised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VmError {
    #[error("unsupported opcode {opcode:#06X} at {address:#05X}")]
    UnsupportedOpcode { opcode: u16, address: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("stack overflow: call nested deeper than {depth} frames")]
    StackOverflow { depth: usize },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("ROM of {len} bytes does not fit at {address:#05X} in {capacity} bytes of memory")]
    InvalidLoad {
        address: u16,
        len: usize,
        capacity: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, VmError>;
