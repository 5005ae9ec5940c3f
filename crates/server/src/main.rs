use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use deck_agent::{
    AgentConfig, ChatModel, DeckOracle, DeckPipeline, DiagramGenerator, LlmOracle, OpenAiChatModel,
    RfpSummarizer,
};
use deck_core::ArtifactStore;
use std::sync::Arc;

mod config;
mod errors;
mod extract;
mod handlers;

use config::{ServerConfig, MAX_BODY_BYTES};
use handlers::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {e}");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let server_config = ServerConfig::from_env();
    let agent_config = AgentConfig::from_env().context("Model configuration is incomplete")?;

    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(
        agent_config.provider.clone(),
        agent_config.call_timeout,
    )?);
    let oracle: Arc<dyn DeckOracle> = Arc::new(LlmOracle::new(model.clone()));
    let pipeline = DeckPipeline::new(oracle)
        .with_max_iterations(agent_config.max_iterations)
        .with_call_timeout(agent_config.call_timeout);
    let summarizer = RfpSummarizer::new(model.clone()).with_call_timeout(agent_config.call_timeout);
    let diagrams = DiagramGenerator::new(model).with_call_timeout(agent_config.call_timeout);

    std::fs::create_dir_all(&server_config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            server_config.output_dir.display()
        )
    })?;

    let state = web::Data::new(AppState {
        store: ArtifactStore::new(&server_config.output_dir),
        pipeline,
        summarizer,
        diagrams,
    });

    log::info!(
        "Starting server at http://{}:{} (model {}, {} validation round(s), output in {})",
        server_config.host,
        server_config.port,
        agent_config.provider.model(),
        agent_config.max_iterations,
        server_config.output_dir.display()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(MAX_BODY_BYTES))
            .configure(handlers::configure)
    })
    .bind((server_config.host.as_str(), server_config.port))?
    .run()
    .await?;

    Ok(())
}
