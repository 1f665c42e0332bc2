use crate::cli::CompareArgs;
use crate::error::Result;
use crate::report;
use matselect::core::io::pool::read_pool;
use matselect::core::models::ids::MaterialId;
use matselect::workflows::compare;
use tracing::info;

pub fn run(args: CompareArgs) -> Result<()> {
    info!("Loading candidate pool from {:?}", &args.candidates);
    let pool = read_pool(&args.candidates)?;

    let baseline = MaterialId::new(args.baseline);
    let alternatives: Vec<MaterialId> = args
        .alternatives
        .into_iter()
        .map(MaterialId::new)
        .collect();
    let properties = (!args.properties.is_empty()).then_some(args.properties.as_slice());

    let comparison = compare::run(&pool, &baseline, &alternatives, properties)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print!("{}", report::render_comparison(&comparison));
    }
    Ok(())
}
