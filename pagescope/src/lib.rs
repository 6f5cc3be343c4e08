pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    apply_analyze_overrides, apply_serve_overrides, load_settings, load_urls_from_file,
    load_urls_from_source, parse_url_line,
};
