//! Process environment access

use azauth_core::AmbientEnvironment;

/// Reads variables from the current process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl AmbientEnvironment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_process_variables() {
        let env = ProcessEnvironment;
        assert!(env.var("PATH").is_some());
        assert!(!env.is_set("AZAUTH_SURELY_UNSET_VARIABLE"));
    }
}
