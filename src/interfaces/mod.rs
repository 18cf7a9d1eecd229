//! Outer adapters: CSV export and the interactive menu.

pub mod csv;
pub mod menu;
