//! Terminal output: theme constants, the console reporter and tables.

pub mod reporter;
pub mod table;
pub mod theme;

pub use reporter::ConsoleReporter;
pub use theme::Theme;
