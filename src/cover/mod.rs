//! Editor state: the cover aggregate, its style catalog and the reducer that
//! is the only way to change either.

mod reducer;
mod styles;
mod types;

pub use reducer::{CoverAction, reduce};
pub use styles::{default_styles, fallback_style, next_style_id};
pub use types::{
    AspectRatio, CoverState, StyleOption, ThemeMode, ToolMode, ViewMode, ViralLayout,
};
