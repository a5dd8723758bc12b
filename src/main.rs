use clap::Parser;
use heroshot::config::{ProviderConfig, setup_logging};
use heroshot::export::Exporter;
use heroshot::gemini::GeminiClient;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = heroshot::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = match ProviderConfig::new(&cli.api_base, &cli.image_model, &cli.text_model) {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid API base {:?}: {}", cli.api_base, err);
            return;
        }
    };

    // font discovery walks the filesystem
    let font_dir = cli.font_dir.clone();
    let exporter =
        match tokio::task::spawn_blocking(move || Exporter::new(font_dir.as_deref())).await {
            Ok(exporter) => exporter,
            Err(err) => {
                error!("Failed to load fonts: {}", err);
                return;
            }
        };

    if let Err(err) = heroshot::web::setup_server(
        &cli.listen_address,
        cli.port,
        GeminiClient::new(config),
        exporter,
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
