//! `vad-streamerd` — boots the HTTP control surface and holds the
//! `VadController` for its lifetime.

use std::sync::Arc;

use vad_streamer::config::{read_vad_options, ServerSettings};
use vad_streamer::controller::VadController;
use vad_streamer::http::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = read_vad_options();
    let server_settings = ServerSettings::from_env();

    println!(
        "vad-streamerd: starting with out_dir={:?} model_path={:?}",
        options.out_dir, options.model_path
    );

    let controller = Arc::new(VadController::new(options));

    let addr = format!("0.0.0.0:{}", server_settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    println!("vad-streamerd: listening on {}", addr);

    axum::serve(listener, router(controller)).await?;

    Ok(())
}
