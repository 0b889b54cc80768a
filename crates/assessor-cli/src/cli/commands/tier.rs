use assessor_core::select_tier;

use super::runner_builder::load_config;
use super::TierArgs;
use crate::exit_codes::COMPLETED;

pub fn run(args: TierArgs) -> anyhow::Result<i32> {
    let config = load_config(args.config.as_deref())?;
    let tier = select_tier(args.kind, args.length, args.with_reference);
    println!("{}\t{}", tier, config.models.model_for(tier));
    Ok(COMPLETED)
}
