//! System browser launcher

use azauth_core::BrowserLauncher;
use azauth_domain::{AuthError, Result};
use tracing::debug;

/// Opens URLs with the platform's default browser
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BrowserLauncher for SystemBrowser {
    fn is_supported(&self) -> bool {
        webbrowser::Browser::is_available()
    }

    fn open(&self, url: &str) -> Result<()> {
        debug!("opening system browser for login");
        webbrowser::open(url)
            .map_err(|err| AuthError::Interactive(format!("failed to open browser: {err}")))
    }
}
