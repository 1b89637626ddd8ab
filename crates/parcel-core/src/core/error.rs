use thiserror::Error;

pub type ParcelResult<T> = Result<T, ParcelError>;

#[derive(Error, Debug)]
pub enum ParcelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Path error: {0}")]
    Path(String),

    /// Caller misuse: nothing to execute, malformed identity, invalid package name.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The manifest promised a media file that the package archive does not contain.
    #[error("No media file found in package archive for path {entry_path}")]
    MissingMediaFile { entry_path: String },

    /// The manifest itself is structurally invalid (bad key, duplicate key, wrong root).
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Re-invoking a single-use executor and similar defects in calling code.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A unique natural key collides with an existing entity.
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Timed out waiting for the migration lock on '{package}' (held by {holder})")]
    LockTimeout { package: String, holder: String },
}

/// Coarse classification used by hosts to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    DataIntegrity,
    Io,
    State,
    DuplicateName,
    NotFound,
}

impl ParcelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParcelError::Config(_) | ParcelError::Version(_) => ErrorKind::Configuration,
            ParcelError::MissingMediaFile { .. } | ParcelError::Manifest(_) => {
                ErrorKind::DataIntegrity
            }
            ParcelError::InvalidState(_) => ErrorKind::State,
            ParcelError::DuplicateName(_) => ErrorKind::DuplicateName,
            ParcelError::NotFound(_) => ErrorKind::NotFound,
            ParcelError::Io(_)
            | ParcelError::Yaml(_)
            | ParcelError::Database(_)
            | ParcelError::Archive(_)
            | ParcelError::Xml(_)
            | ParcelError::WalkDir(_)
            | ParcelError::Path(_)
            | ParcelError::LockTimeout { .. } => ErrorKind::Io,
        }
    }

    /// Whether a later attempt (typically the next process start) may succeed.
    ///
    /// Authoring defects and caller bugs are never retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Io
    }
}
