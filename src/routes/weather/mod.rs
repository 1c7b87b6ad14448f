pub mod handler;
pub mod view;

pub use handler::{show_by_ip, show_by_place, unmatched};
