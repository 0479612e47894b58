use std::fmt;
use std::io::ErrorKind;

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    AddrParse(std::net::AddrParseError),
    DirectoryNotFound(String),
    Forbidden,
    NotFound,
    BadRequest,
    MethodNotAllowed,
    /// Requested range lies outside the file; carries the total size for the
    /// `Content-Range: bytes */<total>` header on the 416 response.
    UnsatisfiableRange(u64),
    InternalServerError(String),
}

impl AppError {
    /// Maps a filesystem error to the matching request-level error.
    pub fn from_fs(err: std::io::Error) -> Self {
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound,
            ErrorKind::PermissionDenied => AppError::Forbidden,
            _ => AppError::Io(err),
        }
    }

    /// HTTP status code and reason phrase for this error. The dispatcher is
    /// the only caller; all status mapping lives here.
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            AppError::NotFound | AppError::DirectoryNotFound(_) => (404, "Not Found"),
            AppError::Forbidden => (403, "Forbidden"),
            AppError::BadRequest => (400, "Bad Request"),
            AppError::MethodNotAllowed => (405, "Method Not Allowed"),
            AppError::UnsatisfiableRange(_) => (416, "Range Not Satisfiable"),
            AppError::Io(_) | AppError::AddrParse(_) | AppError::InternalServerError(_) => {
                (500, "Internal Server Error")
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "IO error: {err}"),
            AppError::AddrParse(err) => write!(f, "Address parse error: {err}"),
            AppError::DirectoryNotFound(path) => write!(f, "Directory not found: {path}"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::NotFound => write!(f, "Not Found"),
            AppError::BadRequest => write!(f, "Bad request"),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::UnsatisfiableRange(total) => {
                write!(f, "Requested range not satisfiable (size {total})")
            }
            AppError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<std::net::AddrParseError> for AppError {
    fn from(err: std::net::AddrParseError) -> Self {
        AppError::AddrParse(err)
    }
}

impl std::error::Error for AppError {}
