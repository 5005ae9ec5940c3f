use actix_web::{http::header, web, HttpResponse};
use deck_agent::{ChatModel, DeckOracle, DeckPipeline, DiagramGenerator, RfpSummarizer};
use deck_core::{cleanup_old_files, ArtifactStore, DeckPayload, DiagramSpec};
use deck_html::MarkupParser;
use deck_pptx::{DeckRenderer, DiagramRenderer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::errors::AppError;
use crate::extract::resolve_source;

const PPTX_MIME: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Shared per-process state.
pub struct AppState {
    pub store: ArtifactStore,
    pub pipeline: DeckPipeline<Arc<dyn DeckOracle>>,
    pub summarizer: RfpSummarizer<Arc<dyn ChatModel>>,
    pub diagrams: DiagramGenerator<Arc<dyn ChatModel>>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/summarizeRfp", web::post().to(summarize_rfp))
        .route("/generateDiagramFromText", web::post().to(generate_diagram))
        .route("/generateDeckFromText", web::post().to(generate_deck))
        .route("/preview-html/{html_id}", web::get().to(preview_html))
        .route("/download/{filename}", web::get().to(download))
        .route("/cleanup", web::post().to(cleanup))
        .route("/health", web::post().to(health));
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Editable deck generator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/summarizeRfp",
            "/generateDiagramFromText",
            "/generateDeckFromText",
            "/preview-html/{html_id}",
            "/download/{filename}",
            "/cleanup",
            "/health"
        ]
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SummarizeRfpRequest {
    #[serde(rename = "rfpText", alias = "description")]
    pub rfp_text: Option<String>,
    pub file_name: Option<String>,
    pub file_base64: Option<String>,
}

pub async fn summarize_rfp(
    state: web::Data<AppState>,
    body: web::Json<SummarizeRfpRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let document = resolve_source(
        request.rfp_text.as_deref(),
        request.file_name.as_deref(),
        request.file_base64.as_deref(),
    )?;

    let summary = state.summarizer.summarize(&document).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateDiagramRequest {
    pub description: Option<String>,
    pub file_name: Option<String>,
    pub file_base64: Option<String>,
}

/// The generated diagram and where to fetch its file.
#[derive(Debug, Serialize)]
struct DiagramResponse {
    #[serde(flatten)]
    spec: DiagramSpec,
    powerpoint_file: String,
    download_url: String,
}

pub async fn generate_diagram(
    state: web::Data<AppState>,
    body: web::Json<GenerateDiagramRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    let description = resolve_source(
        request.description.as_deref(),
        request.file_name.as_deref(),
        request.file_base64.as_deref(),
    )?;

    let spec = state.diagrams.generate(&description).await?;

    let store = state.store.clone();
    let (spec, file_name) = web::block(move || {
        let file_id = ArtifactStore::new_id();
        let output = store.diagram_path(&file_id)?;
        DiagramRenderer::new().render_to_path(&spec, &output)?;
        Ok::<_, deck_core::Error>((spec, ArtifactStore::diagram_file_name(&file_id)))
    })
    .await??;

    log::info!("Rendered diagram {} with {} node(s)", file_name, spec.nodes.len());

    Ok(HttpResponse::Ok().json(DiagramResponse {
        spec,
        download_url: format!("/download/{}", file_name),
        powerpoint_file: file_name,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateDeckRequest {
    pub description: Option<String>,
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub file_base64: Option<String>,
    /// `false`: generate and validate markup. `true`: render stored markup.
    pub confirm_plan: bool,
    pub html_id: Option<String>,
}

pub async fn generate_deck(
    state: web::Data<AppState>,
    body: web::Json<GenerateDeckRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    if request.confirm_plan {
        render_plan(&state, request.html_id.as_deref()).await
    } else {
        produce_plan(&state, &request).await
    }
}

/// Step 1: run the generation-validation loop and keep the markup aside.
async fn produce_plan(
    state: &AppState,
    request: &GenerateDeckRequest,
) -> Result<HttpResponse, AppError> {
    let source = resolve_source(
        request.description.as_deref(),
        request.file_name.as_deref(),
        request.file_base64.as_deref(),
    )?;

    let deck = state.pipeline.run(&source, request.title.as_deref()).await?;

    let html_id = ArtifactStore::new_id();
    let store = state.store.clone();
    let markup = deck.markup.clone();
    let id = html_id.clone();
    web::block(move || store.save_markup(&id, &markup)).await??;

    log::info!(
        "Markup {} ready: {} slide(s), status {} after {} iteration(s)",
        html_id,
        deck.presentation.slide_count(),
        deck.final_status,
        deck.iterations
    );

    let parsed = DeckPayload::from(MarkupParser::new().parse(&deck.markup));
    Ok(HttpResponse::Ok().json(json!({
        "title": deck.presentation.title,
        "slides": parsed.slides,
        "key_messages": deck.key_messages,
        "html_id": html_id,
        "html_preview_url": format!("/preview-html/{}", html_id),
        "validation_status": deck.final_status,
        "validation_iterations": deck.iterations,
        "validation": deck.last_validation(),
        "outcome": deck.outcome,
        "status": "html_ready",
        "message": "Markup generated and validated. Confirm to create the PowerPoint file.",
        "requires_confirmation": true
    })))
}

/// Step 2: render stored markup to a deck and drop the scratch copy.
async fn render_plan(state: &AppState, html_id: Option<&str>) -> Result<HttpResponse, AppError> {
    let html_id = html_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("html_id is required to confirm a plan".to_string())
        })?
        .to_string();

    let store = state.store.clone();
    let (presentation, file_name) = web::block(move || {
        let markup = store.load_markup(&html_id)?;
        let presentation = MarkupParser::new().parse(&markup);

        let file_id = ArtifactStore::new_id();
        let output = store.output_path(&file_id)?;
        DeckRenderer::new().render_to_path(&presentation, &output)?;

        if let Err(e) = store.remove_markup(&html_id) {
            log::warn!("Could not remove markup {}: {}", html_id, e);
        }
        Ok::<_, deck_core::Error>((presentation, ArtifactStore::deck_file_name(&file_id)))
    })
    .await??;

    log::info!("Rendered {} with {} slide(s)", file_name, presentation.slide_count());

    let title = presentation.title.clone();
    let payload = DeckPayload::from(presentation);
    Ok(HttpResponse::Ok().json(json!({
        "title": title,
        "slides": payload.slides,
        "powerpoint_file": file_name,
        "download_url": format!("/download/{}", file_name),
        "status": "completed",
        "message": "Editable PowerPoint file generated.",
        "editable": true
    })))
}

pub async fn preview_html(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let html_id = path.into_inner();
    let store = state.store.clone();
    let markup = web::block(move || store.load_markup(&html_id)).await??;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(markup))
}

pub async fn download(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let file_name = path.into_inner();
    let store = state.store.clone();
    let name = file_name.clone();
    let bytes = web::block(move || -> deck_core::Result<Vec<u8>> {
        let path = store.resolve_download(&name)?;
        Ok(std::fs::read(path)?)
    })
    .await??;

    Ok(HttpResponse::Ok()
        .content_type(PPTX_MIME)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(bytes))
}

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_max_age_hours() -> u64 {
    24
}

pub async fn cleanup(
    state: web::Data<AppState>,
    query: web::Query<CleanupParams>,
) -> Result<HttpResponse, AppError> {
    let CleanupParams {
        max_age_hours,
        dry_run,
    } = query.into_inner();
    let root = state.store.root().to_path_buf();
    let report = web::block(move || cleanup_old_files(&root, max_age_hours, dry_run)).await?;

    Ok(HttpResponse::Ok().json(report))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use async_trait::async_trait;
    use deck_agent::{ChatRequest, GeneratedDeck, ValidationResult};
    use deck_core::{Presentation, Slide};

    struct FixedOracle;

    #[async_trait]
    impl DeckOracle for FixedOracle {
        async fn generate(
            &self,
            _source: &str,
            _title: Option<&str>,
        ) -> deck_agent::Result<GeneratedDeck> {
            let mut presentation = Presentation::new("Cloud").with_subtitle("Why now");
            presentation.add_slide(Slide::title("Cloud", "Why now"));
            presentation.add_slide(Slide::content("Benefits", ["Fast", "Secure"]));
            presentation.add_slide(Slide::comparison("Options", ["A", "B", "C"]));
            Ok(GeneratedDeck {
                presentation,
                key_messages: vec!["Move fast".to_string()],
            })
        }

        async fn validate(
            &self,
            _markup: &str,
            _payload: &DeckPayload,
            _source: &str,
        ) -> deck_agent::Result<ValidationResult> {
            Ok(ValidationResult::valid())
        }
    }

    /// Chat model giving the same answer to every request.
    struct FixedModel(&'static str);

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, _request: ChatRequest) -> deck_agent::Result<String> {
            Ok(self.0.to_string())
        }
    }

    const SUMMARY: &str = r#"{
        "identification_marche": {"client_emetteur": "Ville de Lyon"},
        "calendrier": {"niveau_urgence": "CRITIQUE"},
        "points_attention": ["Délai serré"]
    }"#;

    const DIAGRAM: &str = r#"{
        "title": "Platform",
        "type": "architecture",
        "nodes": [
            {"id": "api", "label": "API", "layer": 1},
            {"id": "db", "label": "Database", "type": "cylinder", "layer": 2,
             "position": {"x": 500, "y": 100}}
        ],
        "connections": [{"from": "api", "to": "db"}]
    }"#;

    fn state(dir: &std::path::Path) -> web::Data<AppState> {
        let oracle: Arc<dyn DeckOracle> = Arc::new(FixedOracle);
        let summaries: Arc<dyn ChatModel> = Arc::new(FixedModel(SUMMARY));
        let diagrams: Arc<dyn ChatModel> = Arc::new(FixedModel(DIAGRAM));
        web::Data::new(AppState {
            store: ArtifactStore::new(dir),
            pipeline: DeckPipeline::new(oracle),
            summarizer: RfpSummarizer::new(summaries),
            diagrams: DiagramGenerator::new(diagrams),
        })
    }

    #[actix_web::test]
    async fn test_two_step_generation() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generateDeckFromText")
            .set_json(json!({ "description": "/deck Our cloud migration cuts costs." }))
            .to_request();
        let plan: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(plan["status"], "html_ready");
        assert_eq!(plan["requires_confirmation"], true);
        assert_eq!(plan["validation_status"], "valid");
        assert_eq!(plan["validation_iterations"], 1);
        assert_eq!(plan["slides"].as_array().unwrap().len(), 3);
        let html_id = plan["html_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/preview-html/{}", html_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("data-slide-type=\"comparison\""));

        let req = test::TestRequest::post()
            .uri("/generateDeckFromText")
            .set_json(json!({ "confirm_plan": true, "html_id": html_id }))
            .to_request();
        let done: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(done["status"], "completed");
        assert_eq!(done["editable"], true);
        assert_eq!(done["title"], "Cloud");

        // Scratch markup is gone once rendered.
        let req = test::TestRequest::get()
            .uri(&format!("/preview-html/{}", html_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 404);

        let req = test::TestRequest::get()
            .uri(done["download_url"].as_str().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            PPTX_MIME
        );
        let bytes = test::read_body(resp).await;
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }

    #[actix_web::test]
    async fn test_summarize_rfp() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let tender = "/rfp Marché de maintenance des écoles de la Ville de Lyon, offres avant le 2 mai.";
        let req = test::TestRequest::post()
            .uri("/summarizeRfp")
            .set_json(json!({ "rfpText": tender }))
            .to_request();
        let summary: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary["identification_marche"]["client_emetteur"], "Ville de Lyon");
        assert_eq!(summary["points_attention"][0], "Délai serré");
        assert_eq!(summary["criteres_eliminatoires"], json!([]));

        // Tender documents have a higher floor than deck sources
        let req = test::TestRequest::post()
            .uri("/summarizeRfp")
            .set_json(json!({ "description": "Short tender text." }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_generate_diagram() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generateDiagramFromText")
            .set_json(json!({ "description": "/diagram An API in front of a database" }))
            .to_request();
        let diagram: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(diagram["title"], "Platform");
        assert_eq!(diagram["type"], "architecture");
        assert_eq!(diagram["nodes"].as_array().unwrap().len(), 2);
        let file_name = diagram["powerpoint_file"].as_str().unwrap();
        assert!(file_name.starts_with("diagram_") && file_name.ends_with(".pptx"));
        assert!(dir.path().join(file_name).exists());

        let req = test::TestRequest::get()
            .uri(diagram["download_url"].as_str().unwrap())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert!(test::read_body(resp).await.starts_with(b"PK\x03\x04"));

        let req = test::TestRequest::post()
            .uri("/generateDiagramFromText")
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_request_errors() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let cases = [
            (json!({ "description": "hi" }), 400),
            (json!({}), 400),
            (json!({ "confirm_plan": true }), 400),
            (json!({ "confirm_plan": true, "html_id": "deadbeef" }), 404),
        ];
        for (body, code) in cases {
            let req = test::TestRequest::post()
                .uri("/generateDeckFromText")
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), code, "{}", body);
            let detail: serde_json::Value = test::read_body_json(resp).await;
            assert!(detail["detail"].is_string());
        }

        let req = test::TestRequest::get()
            .uri("/download/presentation_missing.pptx")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);
    }

    #[actix_web::test]
    async fn test_cleanup_and_health() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("presentation_old.pptx"), b"x").unwrap();
        let app = test::init_service(
            App::new().app_data(state(dir.path())).configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/cleanup?max_age_hours=0&dry_run=true")
            .to_request();
        let report: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(report["status"], "dry_run");
        assert!(dir.path().join("presentation_old.pptx").exists());

        let req = test::TestRequest::post().uri("/health").to_request();
        let health: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health["status"], "ok");

        let req = test::TestRequest::get().uri("/").to_request();
        let index: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(index["endpoints"].as_array().unwrap().contains(&json!("/summarizeRfp")));
    }
}
