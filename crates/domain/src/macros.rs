//! Macro for implementing Display and FromStr for label enums
//!
//! Label enums (credential sources, CLI account kinds) are logged and parsed
//! as lowercase snake_case strings.
//!
//! # Example
//!
//! ```rust
//! use azauth_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Grant {
//!     AuthorizationCode,
//!     DeviceCode,
//! }
//!
//! impl_label_conversions!(Grant {
//!     AuthorizationCode => "authorization_code",
//!     DeviceCode => "device_code",
//! });
//! ```

/// Implements Display and FromStr traits for label enums
///
/// - Display writes the label
/// - FromStr parses case-insensitively and ignores surrounding whitespace
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::CredentialSource;

    #[test]
    fn display_uses_label() {
        assert_eq!(CredentialSource::ExplicitConfig.to_string(), "explicit_config");
        assert_eq!(CredentialSource::CliAccount.to_string(), "cli_account");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            CredentialSource::from_str(" Managed_Identity ").unwrap(),
            CredentialSource::ManagedIdentity
        );
        assert_eq!(
            CredentialSource::from_str("PERSISTED_FILE").unwrap(),
            CredentialSource::PersistedFile
        );
    }

    #[test]
    fn rejects_unknown_label() {
        let err = CredentialSource::from_str("keychain").unwrap_err();
        assert!(err.contains("Invalid CredentialSource: keychain"));
    }

    #[test]
    fn round_trips_every_source() {
        for source in [
            CredentialSource::ExplicitConfig,
            CredentialSource::PersistedFile,
            CredentialSource::ManagedIdentity,
            CredentialSource::CliServicePrincipal,
            CredentialSource::CliAccount,
        ] {
            assert_eq!(CredentialSource::from_str(&source.to_string()).unwrap(), source);
        }
    }
}
