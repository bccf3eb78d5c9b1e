// TUI widget modules: one per page plus the bars and overlays.

pub mod bid_dialog;
pub mod chat;
pub mod help_bar;
pub mod landing;
pub mod listing;
pub mod my_bids;
pub mod notice;
pub mod products;
pub mod quit_confirm;
pub mod recommendations;
pub mod signin;
pub mod signup;
pub mod status_bar;
