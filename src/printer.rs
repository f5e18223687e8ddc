pub use self::printer_profile::{PrinterProfile, PrinterProfileBuilder, DEFAULT_TIMEOUT};
pub use self::usb_printer::{UsbConnector, UsbConnection};

mod printer_profile;
mod usb_printer;

use crate::{
    Error,
    command::Command
};

use codepage_437::CP437_CONTROL;

/// A living, exclusively owned connection to a printer
///
/// Implementors release the device when dropped, so every exit path gives the device back.
pub trait Connection {
    /// Writes every byte to the printer
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;
}

/// Opens connections to printers described by a [PrinterProfile](crate::PrinterProfile)
pub trait Connector {
    type Connection: Connection;

    /// Opens the device with exactly the settings of the profile
    fn connect(&self, printer_profile: &PrinterProfile) -> Result<Self::Connection, Error>;
}

/// Main escpos structure
///
/// The printer represents the thermal printer connected to the computer, through any [Connection](crate::Connection).
/// ```rust,no_run
/// use escpos_usb_print::{Printer, PrinterProfile, UsbConnector};
///
/// let printer_profile = PrinterProfile::usb_builder(0x04b8, 0x0202).build();
/// let mut printer = Printer::open(&UsbConnector, &printer_profile)?;
/// printer.print("Hello, world!\n")?;
/// printer.cut()?;
/// # Ok::<(), escpos_usb_print::Error>(())
/// ```
pub struct Printer<C: Connection> {
    /// Actual connection to the printer
    connection: C
}

impl<C: Connection> Printer<C> {
    /// Wraps an already opened connection
    pub fn new(connection: C) -> Printer<C> {
        Printer {
            connection
        }
    }

    /// Opens the printer described by the profile
    pub fn open<K: Connector<Connection = C>>(connector: &K, printer_profile: &PrinterProfile) -> Result<Printer<C>, Error> {
        Ok(Printer::new(connector.connect(printer_profile)?))
    }

    /// Print some text.
    ///
    /// The whole content is sent in a single write. No newline is added at the end.
    pub fn print<T: AsRef<str>>(&mut self, content: T) -> Result<(), Error> {
        let feed = encode_text(content.as_ref());
        self.raw(&feed)
    }

    /// Cuts the paper, in case the instruction is supported by the printer
    pub fn cut(&mut self) -> Result<(), Error> {
        self.raw(&Command::Cut.as_bytes())
    }

    /// Sends raw information to the printer
    pub fn raw<A: AsRef<[u8]>>(&mut self, bytes: A) -> Result<(), Error> {
        self.connection.write(bytes.as_ref())
    }
}

/// Encodes text with code page 437, the default table of esc/pos printers
///
/// Characters that do not exist in the code page are replaced by `?`.
/// ```rust
/// use escpos_usb_print::encode_text;
/// assert_eq!(encode_text("Añ€\n"), vec![b'A', 0xa4, b'?', b'\n']);
/// ```
pub fn encode_text(content: &str) -> Vec<u8> {
    content.chars()
        .map(|c| CP437_CONTROL.encode(c).unwrap_or(b'?'))
        .collect()
}
