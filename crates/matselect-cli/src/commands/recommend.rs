use crate::cli::SelectionArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::report;
use crate::utils::progress::CliProgressHandler;
use matselect::core::io::pool::read_pool;
use matselect::engine::progress::ProgressReporter;
use matselect::workflows::recommend::RecommendationEngine;
use tracing::{info, warn};

pub fn run(args: SelectionArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args)?;

    info!("Loading candidate pool from {:?}", &app.candidates);
    let pool = read_pool(&app.candidates)?;

    let progress_handler = if app.json {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the recommendation workflow...");
    let engine = RecommendationEngine::new(app.engine)?;
    let result = engine.recommend_with_progress(pool, &app.request, &reporter);
    progress_handler.finish();
    let result = result?;

    if result.no_candidates_passed() {
        warn!("No candidate satisfied every requirement.");
    }

    if app.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", report::render_recommendation(&result));
    }
    Ok(())
}
