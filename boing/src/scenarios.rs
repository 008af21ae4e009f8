use boing_core::ScenarioKind;

use crate::cli::ScenariosArgs;
use crate::output;

pub(crate) fn list(args: ScenariosArgs) {
    let scenarios: Vec<_> = ScenarioKind::all().map(ScenarioKind::scenario).collect();
    output::formatter(args.output).print_scenarios(&scenarios);
}
