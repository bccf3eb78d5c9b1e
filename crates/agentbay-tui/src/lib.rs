// Library root: exposes the terminal UI so tests and the binary share it.

pub mod tui;
