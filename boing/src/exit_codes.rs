#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Invalid CLI/config input (bad flags, unknown scenarios, malformed URLs, etc.).
    InvalidInput = 30,

    /// Runtime error (backend unreachable, live stream failed, every ingest rejected).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
