pub mod points_table;

pub use points_table::{extract_html, ExtractedTable};
