use crate::{
    Error, AttemptFailure,
    Printer, PrinterProfile, PrintRequest, PrintJob,
    printer::{Connector, DEFAULT_TIMEOUT}
};

use log::{debug, info};
use serde::{Serialize, Deserialize};
use std::time::Duration;

/// Bulk (in, out) endpoints tried last, they match most Epson compatible printers
pub const FALLBACK_ENDPOINTS: (u8, u8) = (0x82, 0x01);

/// Message reported on success
pub const SUCCESS_MESSAGE: &str = "Print successful";

/// Outcome of a print request, as reported to the caller
///
/// Exactly one of `message` and `error` is present.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PrintResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

impl PrintResult {
    pub fn success() -> PrintResult {
        PrintResult {
            success: true,
            message: Some(SUCCESS_MESSAGE.to_string()),
            error: None
        }
    }

    pub fn failure<E: std::fmt::Display>(error: E) -> PrintResult {
        PrintResult {
            success: false,
            message: None,
            error: Some(error.to_string())
        }
    }

    /// Single line json representation
    ///
    /// ```rust
    /// use escpos_usb_print::PrintResult;
    /// assert_eq!(PrintResult::success().to_json_line(), r#"{"success":true,"message":"Print successful"}"#);
    /// ```
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"success\":false,\"error\":{:?}}}", e.to_string())
        })
    }
}

impl From<Result<(), Error>> for PrintResult {
    fn from(result: Result<(), Error>) -> PrintResult {
        match result {
            Ok(()) => PrintResult::success(),
            Err(e) => PrintResult::failure(e)
        }
    }
}

/// Turns print requests into print results
///
/// The dispatcher validates the request, opens the printer through a chain of fallback profiles, writes the text and cuts the paper. It never fails, every error ends up in the returned [PrintResult](crate::PrintResult).
/// ```rust,no_run
/// use escpos_usb_print::{Dispatcher, PrintRequest, UsbConnector};
///
/// let dispatcher = Dispatcher::new(UsbConnector);
/// let request = PrintRequest::from_args("0x04b8", "0x0202", "Hello!\n", None);
/// let result = dispatcher.dispatch(&request);
/// println!("{}", result.to_json_line());
/// ```
pub struct Dispatcher<K: Connector> {
    connector: K,
    /// Bulk write timeout handed to every profile
    timeout: Duration
}

impl<K: Connector> Dispatcher<K> {
    pub fn new(connector: K) -> Dispatcher<K> {
        Dispatcher {
            connector,
            timeout: DEFAULT_TIMEOUT
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Dispatcher<K> {
        self.timeout = timeout;
        self
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    /// Handles one print request from start to end
    pub fn dispatch(&self, request: &PrintRequest) -> PrintResult {
        request.validate()
            .and_then(|job| self.print(&job))
            .into()
    }

    /// Prints a validated job
    ///
    /// The device is released when this function returns, whatever the outcome.
    pub fn print(&self, job: &PrintJob) -> Result<(), Error> {
        let mut printer = self.open(job)?;
        printer.print(&job.text).map_err(|e| Error::Write(Box::new(e)))?;
        if job.cut {
            printer.cut().map_err(|e| Error::Cut(Box::new(e)))?;
        }
        info!("Printed {} characters on {:04x}:{:04x}", job.text.chars().count(), job.vendor_id, job.product_id);
        Ok(())
    }

    /// Opens the printer, trying every profile of [fallback_profiles](Dispatcher::fallback_profiles) in order
    ///
    /// If all of them fail, the returned error carries the diagnostic of each attempt.
    pub fn open(&self, job: &PrintJob) -> Result<Printer<K::Connection>, Error> {
        let mut failures = Vec::new();
        for (index, printer_profile) in self.fallback_profiles(job).iter().enumerate() {
            let attempt = format!("attempt {}, {}", index + 1, printer_profile.describe());
            match Printer::open(&self.connector, printer_profile) {
                Ok(printer) => {
                    debug!("Printer opened on {}", attempt);
                    return Ok(printer);
                },
                Err(error) => {
                    debug!("Could not open printer on {}: {}", attempt, error);
                    failures.push(AttemptFailure {
                        attempt,
                        error
                    });
                }
            }
        }
        Err(Error::Initialization(failures))
    }

    /// Profiles tried when opening the printer of a job
    ///
    /// 1. the requested interface, endpoints detected inside it
    /// 2. interface and endpoints auto-detected
    /// 3. the requested interface with the [FALLBACK_ENDPOINTS](crate::FALLBACK_ENDPOINTS)
    pub fn fallback_profiles(&self, job: &PrintJob) -> Vec<PrinterProfile> {
        let builder = || PrinterProfile::usb_builder(job.vendor_id, job.product_id).with_timeout(self.timeout);
        let (in_endpoint, out_endpoint) = FALLBACK_ENDPOINTS;
        vec![
            builder().with_interface(job.interface).build(),
            builder().build(),
            builder().with_interface(job.interface).with_endpoints(in_endpoint, out_endpoint).build()
        ]
    }
}
