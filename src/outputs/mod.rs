//! Output writers for search results.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── housing-crisis-in-canada.json
//!     └── election-protests.json
//! ```

pub mod json;
