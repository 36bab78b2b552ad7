mod model;

pub use model::{Error, ErrorCode, ExitCode, MachineError, Result, ERROR_CODES};
