//! Library for sending text to usb esc/pos printers, with json reporting
//!
//! The crate backs the `escpos-usb-print` command, but every piece can be used on its own. For printing, a [Connector](crate::Connector) is required; [UsbConnector](crate::UsbConnector) talks to real devices through libusb.
//!
//! ```rust,no_run
//! use escpos_usb_print::{Dispatcher, PrintRequest, UsbConnector};
//!
//! let dispatcher = Dispatcher::new(UsbConnector);
//! // Ids can be given as numbers, decimal strings or hexadecimal strings
//! let request: PrintRequest = serde_json::from_str(r#"{
//!     "vendor_id": "0x04b8",
//!     "product_id": "0x0202",
//!     "text": "Hello, world!\n"
//! }"#).unwrap();
//! // The result is never an error, failures are described inside it
//! let result = dispatcher.dispatch(&request);
//! println!("{}", result.to_json_line());
//! ```
//!
//! ## Printer Details
//!
//! The strict minimum information needed to print, are the vendor id and the product id. Both should be found in the maker's website, or sometimes they get printed in test prints (which usually occur if you hold the feed button on the printer).
//!
//! If you are running linux, then one way to get these values is by executing the `lsusb` command.
//!
//! ### Opening the device
//!
//! Not every printer exposes its bulk endpoints the same way, so the [Dispatcher](crate::Dispatcher) tries three [PrinterProfile](crate::PrinterProfile)s in order, and keeps the first one that opens:
//!
//!  1. the requested interface (0 by default), with the endpoints found inside it
//!  2. no interface at all, letting the connector find the first interface with a bulk out endpoint
//!  3. the requested interface, with the in endpoint `0x82` and the out endpoint `0x01`
//!
//! When the three of them fail, the error lists what went wrong on each attempt.

pub use printer::{Printer, PrinterProfile, PrinterProfileBuilder, Connection, Connector, UsbConnector, UsbConnection, encode_text};
pub use request::{PrintRequest, PrintJob, UsbId};
pub use dispatcher::{Dispatcher, PrintResult, FALLBACK_ENDPOINTS, SUCCESS_MESSAGE};
pub use error::{Error, AttemptFailure};

/// Contains raw esc/pos commands
pub mod command;
pub mod cli;

mod printer;
mod request;
mod dispatcher;
mod error;
