#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The run finished, but the delayed or total budget was exceeded.
    ToleranceExceeded = 11,

    /// Invalid CLI/config (bad flags, missing API key, invalid limits, bad base url).
    InvalidInput = 30,

    /// Internal/runtime error (hostname lookup, worker panic, output failure).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_tolerance(within_tolerance: bool) -> Self {
        if within_tolerance {
            Self::Success
        } else {
            Self::ToleranceExceeded
        }
    }
}
