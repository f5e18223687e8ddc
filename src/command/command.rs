use serde::{Serialize, Deserialize};

/// Raw esc/pos commands understood by the printers this crate talks to
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Command {
    /// Feeds the paper 0x96 vertical units and cuts it. Equivalent to GS V 65 n
    Cut
}

impl Command {
    /// Returns the byte representation of the esc/pos command
    ///
    /// ```rust
    /// use escpos_usb_print::command::Command;
    /// assert_eq!(Command::Cut.as_bytes(), vec![0x1d, 0x56, 0x41, 0x96]);
    /// ```
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Command::Cut => vec![0x1d, 0x56, 0x41, 0x96]
        }
    }
}
