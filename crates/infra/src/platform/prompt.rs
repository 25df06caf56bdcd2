//! Console guidance for interactive logins
//!
//! Messages go to stderr so stdout stays free for command output.

use std::io::Write;

use azauth_core::LoginPrompt;
use azauth_domain::DeviceCodeInfo;
use tracing::info;

/// Writes login instructions to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt {
    quiet: bool,
}

impl ConsolePrompt {
    /// `quiet` suppresses the browser notice; device-code instructions are
    /// always shown since the login cannot finish without them.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn emit(message: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{message}");
    }
}

impl LoginPrompt for ConsolePrompt {
    fn browser_opened(&self, url: &str) {
        info!(url, "browser opened for login");
        if !self.quiet {
            Self::emit("A web browser has been opened. Please continue the login in the web browser.");
            Self::emit(&format!("If no web browser is available, open this page manually: {url}"));
        }
    }

    fn device_code(&self, info: &DeviceCodeInfo) {
        info!(verification_url = %info.verification_url, "waiting for device code login");
        Self::emit(&info.instructions());
    }
}
