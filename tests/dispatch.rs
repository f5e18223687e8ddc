use escpos_usb_print::{
    Connection, Connector, Dispatcher, Error, PrintRequest, PrintResult, PrinterProfile,
    cli,
    command::Command
};

use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared view of what happened to the fake device
#[derive(Clone, Default)]
struct DeviceLog {
    open_handles: Rc<Cell<usize>>,
    attempts: Rc<RefCell<Vec<PrinterProfile>>>,
    writes: Rc<RefCell<Vec<Vec<u8>>>>
}

struct MockConnector {
    log: DeviceLog,
    /// Decides which profiles manage to open the device
    accepts: fn(&PrinterProfile) -> bool,
    /// Index of the write that fails, counted per connection
    failing_write: Option<usize>
}

impl MockConnector {
    fn healthy() -> MockConnector {
        MockConnector {
            log: DeviceLog::default(),
            accepts: |_| true,
            failing_write: None
        }
    }
}

struct MockConnection {
    log: DeviceLog,
    writes: usize,
    failing_write: Option<usize>
}

impl Connector for MockConnector {
    type Connection = MockConnection;

    fn connect(&self, printer_profile: &PrinterProfile) -> Result<MockConnection, Error> {
        self.log.attempts.borrow_mut().push(printer_profile.clone());
        if !(self.accepts)(printer_profile) {
            return Err(Error::PrinterError(format!("no luck with {}", printer_profile.describe())));
        }
        self.log.open_handles.set(self.log.open_handles.get() + 1);
        Ok(MockConnection {
            log: self.log.clone(),
            writes: 0,
            failing_write: self.failing_write
        })
    }
}

impl Connection for MockConnection {
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let index = self.writes;
        self.writes += 1;
        if self.failing_write == Some(index) {
            return Err(Error::Usb(rusb::Error::NoDevice));
        }
        self.log.writes.borrow_mut().push(bytes.to_vec());
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.log.open_handles.set(self.log.open_handles.get() - 1);
    }
}

fn request(value: serde_json::Value) -> PrintRequest {
    serde_json::from_value(value).unwrap()
}

#[test]
fn missing_ids_are_reported_without_touching_the_device() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    for value in vec![
        json!({"text": "hi"}),
        json!({"vendor_id": "0x04b8", "text": "hi"}),
        json!({"product_id": 514, "text": "hi"})
    ] {
        let result = dispatcher.dispatch(&request(value));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": false, "error": "vendor_id and product_id are required"})
        );
    }
    assert!(dispatcher.connector().log.attempts.borrow().is_empty());
}

#[test]
fn hex_and_decimal_ids_reach_the_same_device() {
    let connector = MockConnector {
        accepts: |profile| profile.vendor_id() == 0x04b8 && profile.product_id() == 0x0202,
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let hex = dispatcher.dispatch(&request(json!({"vendor_id": "0x04b8", "product_id": "0x0202", "text": "hi"})));
    let decimal = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "hi"})));
    assert_eq!(hex, PrintResult::success());
    assert_eq!(decimal, PrintResult::success());
}

#[test]
fn auto_detection_rescues_a_wrong_interface() {
    let connector = MockConnector {
        accepts: |profile| profile.interface().is_none(),
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "hi", "interface": 2})));
    assert_eq!(serde_json::to_value(&result).unwrap(), json!({"success": true, "message": "Print successful"}));

    let attempts = dispatcher.connector().log.attempts.borrow();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].interface(), Some(2));
    assert_eq!(attempts[1].interface(), None);
}

#[test]
fn fixed_endpoints_are_the_last_resort() {
    let connector = MockConnector {
        accepts: |profile| profile.endpoints() == Some((0x82, 0x01)),
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "hi"})));
    assert!(result.success);
    assert_eq!(dispatcher.connector().log.attempts.borrow().len(), 3);
}

#[test]
fn total_failure_keeps_every_attempt_message() {
    let connector = MockConnector {
        accepts: |_| false,
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "hi"})));
    assert!(!result.success);
    assert_eq!(result.message, None);
    let error = result.error.unwrap();
    assert!(error.contains("no luck with interface 0;"), "{}", error);
    assert!(error.contains("no luck with auto-detected interface and endpoints;"), "{}", error);
    assert!(error.contains("no luck with interface 0, endpoints in 0x82/out 0x01"), "{}", error);
    assert_eq!(dispatcher.connector().log.open_handles.get(), 0);
}

#[test]
fn text_and_cut_are_written_in_order() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "Hello\n"})));
    assert!(result.success);
    let writes = dispatcher.connector().log.writes.borrow();
    assert_eq!(*writes, vec![b"Hello\n".to_vec(), Command::Cut.as_bytes()]);
}

#[test]
fn no_cut_is_sent_when_disabled() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "Hello", "cut": false})));
    assert!(result.success);
    let writes = dispatcher.connector().log.writes.borrow();
    assert_eq!(*writes, vec![b"Hello".to_vec()]);
}

#[test]
fn failed_cut_fails_the_whole_request() {
    let connector = MockConnector {
        failing_write: Some(1),
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "Hello"})));
    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.starts_with("Failed to cut paper"), "{}", error);
    assert!(error.contains(&rusb::Error::NoDevice.to_string()), "{}", error);
    // The text made it to the device before the cut failed
    assert_eq!(*dispatcher.connector().log.writes.borrow(), vec![b"Hello".to_vec()]);
    assert_eq!(dispatcher.connector().log.open_handles.get(), 0);
}

#[test]
fn failed_write_releases_the_device() {
    let connector = MockConnector {
        failing_write: Some(0),
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let result = dispatcher.dispatch(&request(json!({"vendor_id": 1208, "product_id": 514, "text": "Hello"})));
    assert!(result.error.unwrap().starts_with("Failed to write text to printer"));
    assert!(dispatcher.connector().log.writes.borrow().is_empty());
    assert_eq!(dispatcher.connector().log.open_handles.get(), 0);
}

#[test]
fn repeated_requests_are_independent() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let print = request(json!({"vendor_id": "0x04b8", "product_id": "0x0202", "text": "again"}));
    for _ in 0..5 {
        assert_eq!(dispatcher.dispatch(&print), PrintResult::success());
        assert_eq!(dispatcher.connector().log.open_handles.get(), 0);
    }
    assert_eq!(dispatcher.connector().log.attempts.borrow().len(), 5);
}

#[test]
fn unusable_input_exits_with_failure() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let outcome = cli::run(&dispatcher, "definitely not json", &["0x04b8".to_string(), "0x0202".to_string()]);
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.result.to_json_line(), r#"{"success":false,"error":"Invalid input format"}"#);
    assert!(dispatcher.connector().log.attempts.borrow().is_empty());
}

#[test]
fn positional_arguments_print_when_stdin_is_empty() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let positional: Vec<String> = vec!["1208", "514", "Hi", "False"].into_iter().map(String::from).collect();
    let outcome = cli::run(&dispatcher, "", &positional);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.result, PrintResult::success());
    assert_eq!(*dispatcher.connector().log.writes.borrow(), vec![b"Hi".to_vec()]);
}

#[test]
fn handled_failures_exit_cleanly() {
    let connector = MockConnector {
        accepts: |_| false,
        ..MockConnector::healthy()
    };
    let dispatcher = Dispatcher::new(connector);
    let outcome = cli::run(&dispatcher, r#"{"vendor_id": 1208, "product_id": 514}"#, &[]);
    assert_eq!(outcome.exit_code, 0);
    assert!(!outcome.result.success);
}

/// A connector whose device crashes the process while opening
struct PanickingConnector;

impl Connector for PanickingConnector {
    type Connection = MockConnection;

    fn connect(&self, _printer_profile: &PrinterProfile) -> Result<MockConnection, Error> {
        panic!("usb stack exploded");
    }
}

#[test]
fn a_panic_still_produces_a_failure_line() {
    let dispatcher = Dispatcher::new(PanickingConnector);
    let outcome = cli::run_guarded(&dispatcher, || Ok(r#"{"vendor_id": 1208, "product_id": 514, "text": "hi"}"#.to_string()), &[]);
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&outcome.result.to_json_line()).unwrap(),
        json!({"success": false, "error": "unexpected failure: usb stack exploded"})
    );
}

#[test]
fn unreadable_stdin_is_fatal() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let outcome = cli::run_guarded(
        &dispatcher,
        || Err(Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8"))),
        &[]
    );
    assert_eq!(outcome.exit_code, 1);
    assert_eq!(outcome.result.error.as_deref(), Some("could not read input: stream did not contain valid UTF-8"));
    assert!(dispatcher.connector().log.attempts.borrow().is_empty());
}

#[test]
fn separator_lines_print_from_positional_arguments() {
    let dispatcher = Dispatcher::new(MockConnector::healthy());
    let args: Vec<String> = vec!["escpos-usb-print", "1208", "514", "-----", "false"].into_iter().map(String::from).collect();
    let command_line = cli::CommandLine::split(&args);
    let outcome = cli::run_guarded(&dispatcher, || Ok(String::new()), &command_line.request);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.result, PrintResult::success());
    assert_eq!(*dispatcher.connector().log.writes.borrow(), vec![b"-----".to_vec()]);
}
