//! TUI widget modules

pub mod costs;
pub mod header;
pub mod months;
pub mod popup;
pub mod shortcuts;
pub mod statistics;

pub use costs::*;
pub use header::*;
pub use months::*;
pub use popup::*;
pub use shortcuts::*;
pub use statistics::*;
