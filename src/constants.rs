//! Shared constants for things
//!

/// Default endpoint root of the generative language API.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for background generation.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Model used for magic edits and title polishing.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Header carrying the API key on provider requests.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Fraction of the frame kept empty at the top in the classic composition.
pub const NEGATIVE_SPACE_TOP: f32 = 0.30;

/// Fraction of the frame kept empty at the bottom in the classic composition.
pub const NEGATIVE_SPACE_BOTTOM: f32 = 0.20;

/// Fraction of the frame reserved for text on the right in the split layout.
pub const SPLIT_TEXT_COLUMN: f32 = 0.40;

/// Supersampling factor applied when exporting.
pub const EXPORT_SCALE: f32 = 2.0;

/// Logical width of the composite canvas in CSS pixels.
pub const CANVAS_WIDTH: f32 = 600.0;

/// Prefix of exported file names, followed by epoch milliseconds.
pub const EXPORT_FILE_PREFIX: &str = "HeroShot";

/// Id of the style synthesised when the catalog would become empty.
pub const FALLBACK_STYLE_ID: &str = "default_fallback";

/// Label of the fallback style.
pub const FALLBACK_STYLE_LABEL: &str = "默认风格";

/// Prompt of the fallback style.
pub const FALLBACK_STYLE_PROMPT: &str = "minimalist, clean background, high quality";

/// Largest accepted upload (subject and reference images together).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Cache-Control value for the generated image; it changes with every generation.
pub const GENERATED_IMAGE_CACHE_CONTROL: &str = "private, no-cache";

/// Idle time after which a session and its workspace are forgotten, in hours.
pub const SESSION_IDLE_HOURS: i64 = 12;

#[cfg(test)]
/// API key used in tests
pub const TEST_API_KEY: &str = "test-key-123";
