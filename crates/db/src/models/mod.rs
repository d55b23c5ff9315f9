pub mod content_meta;
