use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::RuntimeError(e) => e,
        }
    }

    pub fn invalid(err: impl Into<anyhow::Error>) -> Self {
        Self::InvalidInput(err.into())
    }

    pub fn runtime(err: impl Into<anyhow::Error>) -> Self {
        Self::RuntimeError(err.into())
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn maps_to_exit_codes_and_keeps_context() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused")).context("connect");
        let err = match err {
            Err(e) => RunError::runtime(e),
            Ok(()) => panic!("expected error"),
        };
        assert_eq!(err.exit_code(), ExitCode::RuntimeError);
        assert_eq!(err.to_string(), "connect: connection refused");

        let err = RunError::invalid(anyhow::anyhow!("bad"));
        assert_eq!(err.exit_code().as_i32(), 30);
    }
}
