//! Exit code constants for statesmith.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 10 | `TIMEOUT` | Oracle call timed out |
//! | 70 | `ORACLE_FAILURE` | Oracle transport or provider failure |
//! | 75 | `SYNTHESIS_FAILURE` | Syntax, referential or structural failure |
//! | 76 | `INVALID_TRANSITION` | No valid transition after repair |

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Oracle call exceeded its timeout
    pub const TIMEOUT: ExitCode = ExitCode(10);

    /// Oracle transport, auth, quota or budget failure
    pub const ORACLE_FAILURE: ExitCode = ExitCode(70);

    /// Synthesis gave up after its bounded repairs
    pub const SYNTHESIS_FAILURE: ExitCode = ExitCode(75);

    /// Transition selection gave up after its repair
    pub const INVALID_TRANSITION: ExitCode = ExitCode(76);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
