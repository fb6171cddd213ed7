pub mod checker;
pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod output;
pub mod scanner;
pub mod severity;
pub mod version;

pub use config::{Config, ScanConfig};
pub use error::ScanError;
pub use model::{Advisory, DependencySet, PackageResult, Report, Severity, Summary};
pub use scanner::Scanner;
