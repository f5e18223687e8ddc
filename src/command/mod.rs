pub use self::command::Command;

mod command;
