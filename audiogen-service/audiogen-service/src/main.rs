use anyhow::Result;
use audiogen_configuration::{load_config, setup_logging};
use audiogen_setup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    setup_logging(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "audiogen service starting");
    let server_config = config.server.clone();
    let app = Application::new(config).await?;
    app.run(server_config).await?;
    Ok(())
}
