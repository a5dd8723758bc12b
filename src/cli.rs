//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "HEROSHOT_DEBUG")]
    /// Enable debug logging. Env: HEROSHOT_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "HEROSHOT_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: HEROSHOT_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "HEROSHOT_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: HEROSHOT_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(long, default_value = DEFAULT_API_BASE, env = "HEROSHOT_API_BASE")]
    /// Root of the generative language API.
    /// Env: HEROSHOT_API_BASE
    pub api_base: String,
    #[clap(long, default_value = DEFAULT_IMAGE_MODEL, env = "HEROSHOT_IMAGE_MODEL")]
    /// Model used to paint backgrounds.
    /// Env: HEROSHOT_IMAGE_MODEL
    pub image_model: String,
    #[clap(long, default_value = DEFAULT_TEXT_MODEL, env = "HEROSHOT_TEXT_MODEL")]
    /// Model used for magic edits and title polish.
    /// Env: HEROSHOT_TEXT_MODEL
    pub text_model: String,
    #[clap(long, env = "HEROSHOT_FONT_DIR")]
    /// Extra directory of .ttf/.otf files for exports, eg `/usr/share/fonts/noto-cjk`.
    /// Env: HEROSHOT_FONT_DIR
    pub font_dir: Option<PathBuf>,
}
