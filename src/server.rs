use std::path::Path;

use actix_web::{get, middleware, post, web, App, HttpResponse, HttpServer};
use serde::Deserialize;

use crate::classifier::{Device, ModernBertClassifier};
use crate::error::{Error, Result};
use crate::labels::LabelMap;
use crate::page::Page;
use crate::predict::Predictor;

/// Everything a request needs, built once before the server binds.
pub struct AppState {
    pub predictor: Predictor,
    pub page: Page,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Result<Self> {
        Ok(Self {
            predictor,
            page: Page::new()?,
        })
    }

    /// Loads the label files and the model directory. Any missing or
    /// malformed input fails here, before a socket is opened.
    pub fn load(model_dir: &Path, id2label: &Path, label2id: &Path) -> Result<Self> {
        let labels = LabelMap::load(id2label, label2id)?;
        log::info!(
            "loaded {} labels from {} and {}: {}",
            labels.len(),
            id2label.display(),
            label2id.display(),
            labels.labels().collect::<Vec<_>>().join(", ")
        );
        let classifier = ModernBertClassifier::load(model_dir, &labels, Device::Cpu)?;
        Self::new(Predictor::new(Box::new(classifier), labels))
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upper bound on a urlencoded submission. Length is otherwise left to the
/// tokenizer, which truncates to the model's position limit.
pub const MAX_FORM_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct PredictForm {
    pub content: String,
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(html(state.page.render(None, None)?))
}

#[post("/predict")]
pub async fn predict(
    state: web::Data<AppState>,
    form: web::Form<PredictForm>,
) -> Result<HttpResponse, Error> {
    let content = form.into_inner().content;
    let worker = state.clone();
    // The forward pass is CPU bound; keep it off the async workers.
    let (content, prediction) = web::block(move || {
        let prediction = worker.predictor.predict(&content);
        (content, prediction)
    })
    .await?;
    let prediction = prediction?;
    log::debug!("predicted {:?} for {} bytes", prediction, content.len());
    Ok(html(state.page.render(Some(&content), Some(&prediction))?))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(MAX_FORM_BYTES))
        .service(home)
        .service(predict);
}

pub async fn startup(config: ServerConfig, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);

    log::info!("starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(routes)
    })
    .bind((config.host, config.port))?
    .run()
    .await
}
