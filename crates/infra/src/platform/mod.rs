//! Desktop and process integration
//!
//! Adapters for the parts of the login that touch the user's session: the
//! system browser, console guidance and process environment variables.

pub mod browser;
pub mod env;
pub mod prompt;

pub use browser::SystemBrowser;
pub use env::ProcessEnvironment;
pub use prompt::ConsolePrompt;
