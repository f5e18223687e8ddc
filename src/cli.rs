//! Command line surface: where the request comes from and how the process ends.

use crate::{
    Error, Dispatcher, PrintRequest, PrintResult,
    printer::Connector
};

use argh::{FromArgs, EarlyExit};
use log::debug;
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Send text to a usb esc/pos thermal printer.
///
/// The request is read from stdin as a json object with the fields vendor_id, product_id, text, cut and interface. When stdin does not hold json, the positional arguments VENDOR_ID PRODUCT_ID TEXT [CUT] are used instead.
#[derive(FromArgs, Debug, PartialEq)]
pub struct Arguments {
    /// bulk write timeout in milliseconds, 2000 by default.
    #[argh(option, default = "2000")]
    pub timeout_ms: u64,

    /// log debug information to stderr.
    #[argh(switch, short = 'v')]
    pub verbose: bool
}

impl Default for Arguments {
    fn default() -> Arguments {
        Arguments {
            timeout_ms: 2000,
            verbose: false
        }
    }
}

impl Arguments {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The command line, split into leading options and the positional request
///
/// Options are only recognized before the first positional argument, so the print text is never read as an option, whatever it looks like.
/// ```rust
/// use escpos_usb_print::cli::CommandLine;
/// let args: Vec<String> = vec!["escpos-usb-print", "-v", "1208", "514", "-5.00 discount"]
///     .into_iter().map(String::from).collect();
/// let command_line = CommandLine::split(&args);
/// assert_eq!(command_line.options, vec!["-v"]);
/// assert_eq!(command_line.request, vec!["1208", "514", "-5.00 discount"]);
/// ```
#[derive(Debug, PartialEq)]
pub struct CommandLine<'a> {
    pub command: &'a str,
    pub options: Vec<&'a str>,
    pub request: Vec<String>
}

impl<'a> CommandLine<'a> {
    /// Splits the full argument list, program name included
    pub fn split(args: &'a [String]) -> CommandLine<'a> {
        let command = args.first().map(String::as_str).unwrap_or("escpos-usb-print");
        let mut options = Vec::new();
        let mut index = 1;
        while index < args.len() {
            match args[index].as_str() {
                "-v" | "--verbose" | "--help" => {
                    options.push(args[index].as_str());
                    index += 1;
                },
                "--timeout-ms" => {
                    options.extend(args[index..].iter().take(2).map(String::as_str));
                    index += 2;
                },
                "--" => {
                    index += 1;
                    break;
                },
                _ => break
            }
        }
        CommandLine {
            command,
            options,
            request: args.get(index..).map(<[String]>::to_vec).unwrap_or_default()
        }
    }

    /// Parses the leading options
    ///
    /// `--help` comes back as an [EarlyExit](argh::EarlyExit) with a successful status.
    pub fn arguments(&self) -> Result<Arguments, EarlyExit> {
        Arguments::from_args(&[self.command], &self.options)
    }
}

/// What the process prints, and how it exits
#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub result: PrintResult,
    pub exit_code: i32
}

impl Outcome {
    pub fn from_error(error: Error) -> Outcome {
        Outcome {
            exit_code: if error.is_fatal() { 1 } else { 0 },
            result: PrintResult::failure(error)
        }
    }
}

/// Picks the request, json on stdin first and positional arguments second
pub fn read_request(stdin: &str, positional: &[String]) -> Result<PrintRequest, Error> {
    match serde_json::from_str::<Value>(stdin) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value).map_err(|e| Error::InvalidRequest(e.to_string())),
        Ok(other) => Err(Error::UnexpectedInput(json_kind(&other).to_string())),
        Err(e) => {
            debug!("Stdin is not json ({}), using positional arguments", e);
            match positional {
                [vendor_id, product_id, text, rest @ ..] => Ok(PrintRequest::from_args(
                    vendor_id,
                    product_id,
                    text,
                    rest.first().map(String::as_str)
                )),
                _ => Err(Error::InvalidInput)
            }
        }
    }
}

/// Runs one invocation, from raw input to the outcome
pub fn run<K: Connector>(dispatcher: &Dispatcher<K>, stdin: &str, positional: &[String]) -> Outcome {
    match read_request(stdin, positional) {
        Ok(request) => Outcome {
            result: dispatcher.dispatch(&request),
            exit_code: 0
        },
        Err(e) => Outcome::from_error(e)
    }
}

/// Same as [run](run), but reads stdin itself and turns a panic into a failure outcome
///
/// Nothing escapes: the caller always gets an [Outcome](Outcome) to print.
pub fn run_guarded<K, F>(dispatcher: &Dispatcher<K>, read_stdin: F, positional: &[String]) -> Outcome
where
    K: Connector,
    F: FnOnce() -> Result<String, Error>
{
    panic::catch_unwind(AssertUnwindSafe(|| {
        match read_stdin() {
            Ok(stdin) => run(dispatcher, &stdin, positional),
            Err(e) => Outcome::from_error(e)
        }
    })).unwrap_or_else(|panic| {
        Outcome::from_error(Error::Unexpected(panic_message(panic.as_ref())))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic without message".to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn json_takes_precedence_over_arguments() {
        let request = read_request(r#"{"vendor_id": "0x04b8", "product_id": 514}"#, &args(&["1", "2", "other"])).unwrap();
        assert_eq!(request.vendor_id, Some("0x04b8".into()));
        assert_eq!(request.text, None);
    }

    #[test]
    fn positional_arguments_are_used_without_json() {
        let request = read_request("", &args(&["0x04b8", "0x0202", "Hello", "false", "ignored"])).unwrap();
        assert_eq!(request, PrintRequest::from_args("0x04b8", "0x0202", "Hello", Some("false")));
        assert_eq!(request.cut, Some(false));
    }

    #[test]
    fn too_few_arguments_is_invalid_input() {
        assert!(matches!(read_request("not json", &args(&["0x04b8", "0x0202"])), Err(Error::InvalidInput)));
    }

    #[test]
    fn json_that_is_not_an_object_is_fatal() {
        let error = read_request("[1, 2]", &[]).unwrap_err();
        assert!(matches!(error, Error::UnexpectedInput(_)));
        assert_eq!(Outcome::from_error(error).exit_code, 1);
    }

    #[test]
    fn wrongly_typed_fields_are_a_handled_failure() {
        let error = read_request(r#"{"vendor_id": 1, "product_id": 2, "cut": "yes"}"#, &[]).unwrap_err();
        assert!(matches!(error, Error::InvalidRequest(_)));
        assert_eq!(Outcome::from_error(error).exit_code, 0);
    }

    #[test]
    fn options_and_positionals_are_parsed() {
        let args = args(&["escpos-usb-print", "--timeout-ms", "500", "-v", "1208", "514", "hi"]);
        let command_line = CommandLine::split(&args);
        let arguments = command_line.arguments().unwrap();
        assert_eq!(arguments.timeout(), Duration::from_millis(500));
        assert!(arguments.verbose);
        assert_eq!(command_line.request, vec!["1208", "514", "hi"]);
    }

    #[test]
    fn no_arguments_gives_defaults() {
        let args = args(&["escpos-usb-print"]);
        let command_line = CommandLine::split(&args);
        assert_eq!(command_line.arguments().unwrap(), Arguments::default());
        assert!(command_line.request.is_empty());
    }

    #[test]
    fn text_that_looks_like_an_option_is_printed_as_is() {
        for text in &["-----", "-5.00", "-5.00 discount", "--help", "-v", "help"] {
            let args = args(&["escpos-usb-print", "1208", "514", *text]);
            let command_line = CommandLine::split(&args);
            assert!(command_line.options.is_empty(), "{}", text);
            assert_eq!(command_line.arguments().unwrap(), Arguments::default());
            let request = read_request("", &command_line.request).unwrap();
            assert_eq!(request.text.as_deref(), Some(*text));
        }
    }

    #[test]
    fn help_as_a_vendor_id_is_part_of_the_request() {
        let args = args(&["escpos-usb-print", "help", "514", "hi"]);
        let command_line = CommandLine::split(&args);
        assert!(command_line.arguments().is_ok());
        assert_eq!(command_line.request, vec!["help", "514", "hi"]);
    }

    #[test]
    fn double_dash_ends_the_options() {
        let args = args(&["escpos-usb-print", "-v", "--", "--verbose", "514", "hi"]);
        let command_line = CommandLine::split(&args);
        assert_eq!(command_line.options, vec!["-v"]);
        assert_eq!(command_line.request, vec!["--verbose", "514", "hi"]);
    }

    #[test]
    fn leading_help_is_an_early_exit() {
        let args = args(&["escpos-usb-print", "--help"]);
        let early_exit = CommandLine::split(&args).arguments().unwrap_err();
        assert!(early_exit.status.is_ok());
    }

    #[test]
    fn bad_option_values_are_parse_errors() {
        let args = args(&["escpos-usb-print", "--timeout-ms", "soon", "1208", "514", "hi"]);
        let command_line = CommandLine::split(&args);
        assert!(command_line.arguments().unwrap_err().status.is_err());
        assert_eq!(command_line.request, vec!["1208", "514", "hi"]);
    }
}
