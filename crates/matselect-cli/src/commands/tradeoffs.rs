use crate::cli::SelectionArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::report;
use crate::utils::progress::CliProgressHandler;
use matselect::core::io::pool::read_pool;
use matselect::engine::progress::ProgressReporter;
use matselect::workflows::tradeoffs;
use tracing::info;

pub fn run(args: SelectionArgs) -> Result<()> {
    let app = build_config(&args)?;

    info!("Loading candidate pool from {:?}", &app.candidates);
    let pool = read_pool(&app.candidates)?;

    let progress_handler = if app.json {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the trade-off exploration workflow...");
    let result = tradeoffs::run(pool, &app.request, &app.engine, &reporter);
    progress_handler.finish();
    let exploration = result?;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&exploration)?);
    } else {
        print!("{}", report::render_tradeoffs(&exploration));
    }
    Ok(())
}
