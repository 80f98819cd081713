/// The Error type for the zshape-json crate.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A core error: an unresolved reference, a cycle, a failed scalar conversion, ...
    Core(zshape_core::Error),
    /// Error serializing or deserializing to/from JSON.
    Json(serde_json::Error),
    /// The JSON is valid but not a node of the expected kind.
    Malformed(String),
}

/// The Result type for the zshape-json crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Error::Malformed(what.into())
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Core(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Malformed(_) => None,
        }
    }
}

impl From<zshape_core::Error> for Error {
    fn from(e: zshape_core::Error) -> Self {
        Error::Core(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Core(e) => write!(f, "{e}"),
            Error::Json(e) => write!(f, "Error serializing or deserializing to/from JSON: {e}"),
            Error::Malformed(e) => write!(f, "Malformed node: {e}"),
        }
    }
}
