pub mod chunking;

pub use chunking::{check_extension, extract_chunks, stored_source_name, ALLOWED_EXTENSIONS};
