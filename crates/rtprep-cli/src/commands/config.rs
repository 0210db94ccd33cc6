use rtprep_config::RtPrepConfig;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `rtprep config`.
pub fn handle(config: &RtPrepConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    output(config, flags.format)
}
