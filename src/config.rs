//! Runtime configuration shared between the server binary and the library.

use std::fmt::Display;

/// The environment the server is deployed in.
///
/// The environment controls how much detail error responses carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Environment {
    /// Local development, errors are verbose.
    #[default]
    Development,
    /// Automated tests, errors are verbose.
    Test,
    /// A live deployment, internal error details are hidden from clients.
    Production,
}

impl Environment {
    /// Whether this is a live deployment.
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        };

        f.write_str(name)
    }
}
