use thiserror::Error;

/// Every failure the service can produce.
///
/// The web layer turns each of these into a flash message, so the `Display`
/// text is what end users read.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Underlying store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// No classroom for the given year or id
    #[error("Classroom not found: {key}")]
    ClassroomNotFound {
        /// Year label or id that was looked up
        key: String,
    },

    /// No student for the given id or roll number
    #[error("Student not found: {key}")]
    StudentNotFound {
        /// Id or roll number that was looked up
        key: String,
    },

    /// No subject for the given id
    #[error("Subject not found: {key}")]
    SubjectNotFound {
        /// Id that was looked up
        key: String,
    },

    /// No user for the given id
    #[error("User not found: {key}")]
    UserNotFound {
        /// Id or username that was looked up
        key: String,
    },

    /// Blank or otherwise unusable input
    #[error("Invalid input: {message}")]
    Validation {
        /// Which field was rejected and why
        message: String,
    },

    /// A classroom with this year label already exists
    #[error("Classroom '{year}' already exists")]
    DuplicateClassroom {
        /// The conflicting year label
        year: String,
    },

    /// Roll numbers are unique within a classroom year
    #[error("Roll number {roll_number} already exists in {year}")]
    DuplicateRollNumber {
        /// The conflicting roll number
        roll_number: String,
        /// Classroom year it conflicts in
        year: String,
    },

    /// Usernames are unique
    #[error("Username already exists: {username}")]
    DuplicateUsername {
        /// The conflicting username
        username: String,
    },

    /// Refused to remove the only remaining administrator
    #[error("Cannot delete the last admin user.")]
    LastAdmin,

    /// A year-wide bulk operation found nothing to act on
    #[error("No students found in {year}.")]
    NoStudents {
        /// The empty classroom year
        year: String,
    },

    /// Unknown user or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Uploaded spreadsheet could not be read
    #[error("Import failed: {message}")]
    Import {
        /// Parser diagnostic
        message: String,
    },

    /// Spreadsheet rendering failure
    #[error("Export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// Password hashing or verification failure
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
