use escpos_usb_print::{
    Dispatcher, Error, UsbConnector,
    cli::{self, Arguments, CommandLine}
};

use log::warn;
use std::io::{self, IsTerminal, Read};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let command_line = CommandLine::split(&args);
    let arguments = match command_line.arguments() {
        Ok(arguments) => {
            init_logging(arguments.verbose);
            arguments
        },
        // --help
        Err(early_exit) if early_exit.status.is_ok() => {
            println!("{}", early_exit.output);
            return;
        },
        Err(early_exit) => {
            init_logging(false);
            // Stdin may still hold a json request
            warn!("Ignoring command line options: {}", early_exit.output.trim());
            Arguments::default()
        }
    };

    let dispatcher = Dispatcher::new(UsbConnector).with_timeout(arguments.timeout());
    let outcome = cli::run_guarded(&dispatcher, read_stdin, &command_line.request);

    println!("{}", outcome.result.to_json_line());
    if outcome.exit_code != 0 {
        std::process::exit(outcome.exit_code);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

/// An interactive terminal is never read, so positional arguments work without piping anything
fn read_stdin() -> Result<String, Error> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }
    let mut content = String::new();
    stdin.read_to_string(&mut content)?;
    Ok(content)
}
