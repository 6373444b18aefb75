pub type FbResult<T> = Result<T, FbError>;

#[derive(thiserror::Error, Debug)]
pub enum FbError {
    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("gpu error: {0}")]
    Gpu(String),

    #[error("io error: {0}")]
    Io(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FbError {
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    pub fn gpu(msg: impl Into<String>) -> Self {
        Self::Gpu(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            FbError::geometry("x")
                .to_string()
                .contains("geometry error:")
        );
        assert!(FbError::gpu("x").to_string().contains("gpu error:"));
        assert!(FbError::io("x").to_string().contains("io error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = FbError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
