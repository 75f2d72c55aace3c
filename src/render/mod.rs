//! Turning the known-networks table into HTML and delivering it somewhere.

pub mod html;
pub mod table;
pub mod target;

pub use table::{placeholder_row, render_page, render_table_body, TABLE_BODY_ID};
pub use target::{FileTarget, MultiTarget, RenderTarget, SharedTarget, StdoutTarget};
