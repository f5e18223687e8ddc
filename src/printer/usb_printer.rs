use crate::{
    Error,
    printer::{Connection, Connector, PrinterProfile}
};

use log::{debug, warn};
use rusb::{UsbContext, Context, ConfigDescriptor, Device, DeviceHandle, TransferType, Direction};
use std::time::Duration;

/// Opens usb printers through libusb
///
/// Every call to [connect](Connector::connect) creates its own libusb context, the resulting connection owns it until dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct UsbConnector;

/// Claimed usb interface of an open printer
///
/// Dropping the connection releases the interface, and gives it back to the kernel driver if it had to be detached.
pub struct UsbConnection {
    /// Device handle
    dh: DeviceHandle<Context>,
    /// Claimed interface
    interface: u8,
    /// Bulk write endpoint
    endpoint: u8,
    /// Time to wait before giving up writing to the bulk endpoint
    timeout: Duration,
    /// Whether the kernel driver was detached while opening
    reattach_kernel_driver: bool
}

/// Bulk endpoints found in one interface of the active configuration
#[derive(Clone, Debug, PartialEq)]
struct InterfaceSummary {
    number: u8,
    bulk_out: Option<u8>
}

/// Where data is going to be written
#[derive(Clone, Debug, PartialEq)]
struct Target {
    interface: u8,
    out_endpoint: u8
}

impl Connector for UsbConnector {
    type Connection = UsbConnection;

    fn connect(&self, printer_profile: &PrinterProfile) -> Result<UsbConnection, Error> {
        let context = Context::new()?;
        let device = find_device(&context, printer_profile.vendor_id, printer_profile.product_id)?;

        // Before opening the device, we must find the bulk endpoint
        let config_descriptor = device.active_config_descriptor()?;
        let target = select_target(
            &summarize(&config_descriptor),
            printer_profile.interface,
            printer_profile.endpoints
        )?;
        debug!("Using interface {} with out endpoint 0x{:02x}", target.interface, target.out_endpoint);

        let dh = device.open()?;
        let reattach_kernel_driver = match dh.kernel_driver_active(target.interface) {
            Ok(true) => {
                // The kernel is active, we have to detach it
                dh.detach_kernel_driver(target.interface)?;
                true
            },
            Ok(false) => false,
            Err(e) => {
                warn!("Could not find out if kernel driver is active ({}), might encounter a problem soon.", e);
                false
            }
        };
        if let Err(e) = dh.claim_interface(target.interface) {
            if reattach_kernel_driver {
                if let Err(attach_error) = dh.attach_kernel_driver(target.interface) {
                    warn!("Could not reattach kernel driver to interface {}: {}", target.interface, attach_error);
                }
            }
            return Err(Error::Usb(e));
        }

        Ok(UsbConnection {
            dh,
            interface: target.interface,
            endpoint: target.out_endpoint,
            timeout: printer_profile.timeout,
            reattach_kernel_driver
        })
    }
}

impl Connection for UsbConnection {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut offset = 0;
        while offset < bytes.len() {
            let written = self.dh.write_bulk(self.endpoint, &bytes[offset..], self.timeout)?;
            if written == 0 {
                return Err(Error::PrinterError(format!("endpoint 0x{:02x} accepted no data", self.endpoint)));
            }
            offset += written;
        }
        debug!("Wrote {} bytes to endpoint 0x{:02x}", bytes.len(), self.endpoint);
        Ok(())
    }
}

impl Drop for UsbConnection {
    fn drop(&mut self) {
        if let Err(e) = self.dh.release_interface(self.interface) {
            warn!("Could not release interface {}: {}", self.interface, e);
        }
        if self.reattach_kernel_driver {
            if let Err(e) = self.dh.attach_kernel_driver(self.interface) {
                warn!("Could not reattach kernel driver to interface {}: {}", self.interface, e);
            }
        }
        debug!("Released interface {}", self.interface);
    }
}

fn find_device(context: &Context, vendor_id: u16, product_id: u16) -> Result<Device<Context>, Error> {
    for device in context.devices()?.iter() {
        let s = match device.device_descriptor() {
            Ok(s) => s,
            Err(e) => {
                debug!("Skipping device on bus {} address {}: {}", device.bus_number(), device.address(), e);
                continue;
            }
        };
        if s.vendor_id() == vendor_id && s.product_id() == product_id {
            return Ok(device);
        }
    }
    // No printer was found with such vid and pid
    Err(Error::DeviceNotFound {
        vendor_id,
        product_id
    })
}

fn summarize(config_descriptor: &ConfigDescriptor) -> Vec<InterfaceSummary> {
    config_descriptor.interfaces().map(|interface| {
        let mut summary = InterfaceSummary {
            number: interface.number(),
            bulk_out: None
        };
        for descriptor in interface.descriptors() {
            for endpoint in descriptor.endpoint_descriptors() {
                if summary.bulk_out.is_none() && endpoint.transfer_type() == TransferType::Bulk && endpoint.direction() == Direction::Out {
                    summary.bulk_out = Some(endpoint.address());
                }
            }
        }
        summary
    }).collect()
}

/// Decides the interface and out endpoint to use, given what the profile fixes
///
/// A fixed out endpoint is trusted as is, only the interface has to exist.
fn select_target(interfaces: &[InterfaceSummary], interface: Option<u8>, endpoints: Option<(u8, u8)>) -> Result<Target, Error> {
    let summary = match interface {
        Some(number) => interfaces.iter()
            .find(|summary| summary.number == number)
            .ok_or(Error::NoInterface(number))?,
        None => interfaces.iter()
            .find(|summary| summary.bulk_out.is_some())
            .ok_or(Error::NoBulkEndpoint)?
    };
    let out_endpoint = match endpoints {
        Some((_, out_endpoint)) => out_endpoint,
        None => summary.bulk_out.ok_or(Error::NoBulkEndpoint)?
    };
    Ok(Target {
        interface: summary.number,
        out_endpoint
    })
}
