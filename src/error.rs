use thiserror::Error;

/// Errors that this crate throws.
#[derive(Error, Debug)]
pub enum Error {
    /// Vendor id or product id was missing, null, zero or empty
    #[error("vendor_id and product_id are required")]
    MissingIdentifiers,
    /// An identifier could not be parsed as a 16 bit usb id
    #[error("invalid usb id {0:?}: expected a decimal number or a 0x-prefixed hexadecimal number between 0 and 65535")]
    InvalidIdentifier(String),
    /// The json object did not have the shape of a print request
    #[error("invalid print request: {0}")]
    InvalidRequest(String),
    /// Neither stdin nor the positional arguments contained a usable request
    #[error("Invalid input format")]
    InvalidInput,
    /// Stdin held json, but not a json object
    #[error("expected a json object on stdin, found {0}")]
    UnexpectedInput(String),
    /// Error related to rusb
    #[error("rusb error: {0}")]
    Usb(#[from] rusb::Error),
    /// No attached device matches the vendor and product id
    #[error("USB device not found (vendor 0x{vendor_id:04x}, product 0x{product_id:04x})")]
    DeviceNotFound {
        vendor_id: u16,
        product_id: u16
    },
    /// The active configuration does not expose the requested interface
    #[error("interface {0} does not exist in the active configuration")]
    NoInterface(u8),
    /// This means no bulk endpoint could be found
    #[error("No bulk endpoint could be found")]
    NoBulkEndpoint,
    #[error("An error occured while printing, {0}")]
    PrinterError(String),
    /// Every device initialization attempt failed
    #[error("Failed to initialize printer: {}", join_attempts(.0))]
    Initialization(Vec<AttemptFailure>),
    /// The device opened, but the text could not be written
    #[error("Failed to write text to printer: {0}")]
    Write(#[source] Box<Error>),
    /// The text was written, but the cut command failed
    #[error("Failed to cut paper: {0}")]
    Cut(#[source] Box<Error>),
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    /// A panic reached the outermost handler
    #[error("unexpected failure: {0}")]
    Unexpected(String)
}

impl Error {
    /// Returns true if this error means the request itself could not be interpreted
    ///
    /// Only these errors end the process with a non-zero exit code, every other failure is reported in the json result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvalidInput | Error::UnexpectedInput(_) | Error::Io(_) | Error::Unexpected(_))
    }
}

/// Diagnostic of a single failed attempt to open the printer
#[derive(Debug)]
pub struct AttemptFailure {
    /// Description of the arguments used for the attempt
    pub attempt: String,
    /// What went wrong
    pub error: Error
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "[{}] {}", self.attempt, self.error)
    }
}

fn join_attempts(attempts: &[AttemptFailure]) -> String {
    attempts.iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
