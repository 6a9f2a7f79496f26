//! Terminal presentation: console styles and the install spinner.

pub mod spinner;
pub mod theme;

pub use spinner::ProgressSpinner;
pub use theme::{should_use_colors, Theme};
