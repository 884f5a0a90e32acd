//! Output destination for `print`, `println` and `printf`.
//!
//! Scripts run by the host write to stdout. Tests capture into a buffer.
//! Included units evaluate with a silent handler so importing a module does
//! not replay its top-level output into the including program.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Where script output goes.
#[derive(Debug)]
pub enum PrintHandler {
    /// Process stdout.
    Stdout,
    /// In-memory capture.
    Buffer(Mutex<String>),
    /// Discard everything.
    Silent,
}

impl PrintHandler {
    /// Write `text` without a trailing newline.
    pub fn print(&self, text: &str) {
        match self {
            Self::Stdout => {
                let mut out = std::io::stdout().lock();
                // Output errors (closed pipe) are not script-visible.
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            Self::Buffer(buf) => buf.lock().push_str(text),
            Self::Silent => {}
        }
    }

    /// Write `text` followed by a newline.
    pub fn println(&self, text: &str) {
        match self {
            Self::Stdout => println!("{text}"),
            Self::Buffer(buf) => {
                let mut buf = buf.lock();
                buf.push_str(text);
                buf.push('\n');
            }
            Self::Silent => {}
        }
    }

    /// Captured output; empty for handlers that do not capture.
    pub fn output(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    /// Drop captured output.
    pub fn clear(&self) {
        if let Self::Buffer(buf) = self {
            buf.lock().clear();
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }
}

/// Print handler shared between an interpreter, its spawned tasks and builtins.
pub type SharedPrintHandler = Arc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(Mutex::new(String::new())))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}
