//! Terminal rendering for the relaunch binary
//!
//! - `theme` - colors and icons
//! - `primitives` / `blocks` - reusable pieces (icons, colored text, headers, check lines)
//! - `views` - per-command output
//! - `json` - NDJSON output for `--json`

pub mod blocks;
pub mod context;
pub mod json;
pub mod primitives;
pub mod terminal;
pub mod theme;
pub mod views;
