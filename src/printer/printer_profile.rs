use std::time::Duration;

/// Bulk write timeout used when none is given
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Details required to connect and print
///
/// Describes one way of reaching a usb printer. The bare minimum information needed is the vendor id and the product id, the interface and the endpoints get auto-detected when they are left out.
#[derive(Clone, Debug, PartialEq)]
pub struct PrinterProfile {
    /// Vendor id for the printer
    pub (crate) vendor_id: u16,
    /// Product id for the printer
    pub (crate) product_id: u16,
    /// Interface to claim. `None` picks the first interface with a bulk out endpoint
    pub (crate) interface: Option<u8>,
    /// Bulk (in, out) endpoint addresses. Only the out endpoint is written to, the in endpoint names the pair in logs and errors
    pub (crate) endpoints: Option<(u8, u8)>,
    /// Timeout for bulk write operations
    pub (crate) timeout: Duration
}

impl PrinterProfile {
    /// Creates a [PrinterProfileBuilder](crate::PrinterProfileBuilder) for the given usb ids.
    ///
    /// ```rust
    /// use escpos_usb_print::PrinterProfile;
    /// let printer_profile = PrinterProfile::usb_builder(0x04b8, 0x0202).build();
    /// assert_eq!(printer_profile.vendor_id(), 0x04b8);
    /// assert_eq!(printer_profile.interface(), None);
    /// ```
    pub fn usb_builder(vendor_id: u16, product_id: u16) -> PrinterProfileBuilder {
        PrinterProfileBuilder::new_usb(vendor_id, product_id)
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    pub fn interface(&self) -> Option<u8> {
        self.interface
    }

    /// Bulk (in, out) endpoint addresses, if they were fixed
    pub fn endpoints(&self) -> Option<(u8, u8)> {
        self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Short human readable description of how this profile reaches the device
    ///
    /// ```rust
    /// use escpos_usb_print::PrinterProfile;
    /// let printer_profile = PrinterProfile::usb_builder(0x04b8, 0x0202)
    ///     .with_interface(0)
    ///     .with_endpoints(0x82, 0x01)
    ///     .build();
    /// assert_eq!(printer_profile.describe(), "interface 0, endpoints in 0x82/out 0x01");
    /// ```
    pub fn describe(&self) -> String {
        match (self.interface, self.endpoints) {
            (Some(interface), Some((in_ep, out_ep))) => format!("interface {}, endpoints in 0x{:02x}/out 0x{:02x}", interface, in_ep, out_ep),
            (Some(interface), None) => format!("interface {}", interface),
            (None, Some((in_ep, out_ep))) => format!("auto-detected interface, endpoints in 0x{:02x}/out 0x{:02x}", in_ep, out_ep),
            (None, None) => "auto-detected interface and endpoints".to_string()
        }
    }
}

/// Helper structure to create a [PrinterProfile](crate::PrinterProfile)
///
/// Builder pattern for the [PrinterProfile](crate::PrinterProfile) structure.
pub struct PrinterProfileBuilder {
    vendor_id: u16,
    product_id: u16,
    interface: Option<u8>,
    endpoints: Option<(u8, u8)>,
    timeout: Duration
}

impl PrinterProfileBuilder {
    /// Creates a new [PrinterProfileBuilder](crate::PrinterProfileBuilder) set for usb printing
    ///
    /// The profile will be properly built just with the vendor id and the product id. The connector will then try to locate an interface with a bulk write endpoint, but it might fail to do so. See [with_interface](PrinterProfileBuilder::with_interface) and [with_endpoints](PrinterProfileBuilder::with_endpoints) for manual setup.
    pub fn new_usb(vendor_id: u16, product_id: u16) -> PrinterProfileBuilder {
        PrinterProfileBuilder {
            vendor_id,
            product_id,
            interface: None,
            endpoints: None,
            timeout: DEFAULT_TIMEOUT
        }
    }

    /// Sets the usb interface that will be claimed.
    pub fn with_interface(mut self, interface: u8) -> PrinterProfileBuilder {
        self.interface = Some(interface);
        self
    }

    /// Sets the bulk endpoints, skipping endpoint detection.
    ///
    /// Addresses include the direction bit, so an in endpoint usually looks like `0x82` and an out endpoint like `0x01`.
    pub fn with_endpoints(mut self, in_endpoint: u8, out_endpoint: u8) -> PrinterProfileBuilder {
        self.endpoints = Some((in_endpoint, out_endpoint));
        self
    }

    /// Adds a bulk write timeout
    ///
    /// USB devices might fail to write to the bulk endpoint. In such a case, a timeout must be provided to know when to stop waiting for the buffer to flush to the printer. The default value is 2 seconds.
    /// ```rust
    /// use escpos_usb_print::PrinterProfileBuilder;
    /// let printer_profile = PrinterProfileBuilder::new_usb(0x0001, 0x0001)
    ///     .with_timeout(std::time::Duration::from_secs(3))
    ///     .build();
    /// assert_eq!(printer_profile.timeout().as_secs(), 3);
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> PrinterProfileBuilder {
        self.timeout = timeout;
        self
    }

    /// Build the `PrinterProfile` that lies beneath the builder
    pub fn build(self) -> PrinterProfile {
        PrinterProfile {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            interface: self.interface,
            endpoints: self.endpoints,
            timeout: self.timeout
        }
    }
}
