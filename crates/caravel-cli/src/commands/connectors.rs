//! Execute the `connectors` command: list supported sources and their
//! step tables.

use anyhow::Result;
use caravel_connectors::registry::table_shape;
use caravel_types::job::SourceKind;

pub fn execute() -> Result<()> {
    println!("Supported connectors:");
    for kind in SourceKind::all() {
        let steps: Vec<&str> = table_shape(*kind)
            .iter()
            .map(caravel_engine::step::StepName::as_str)
            .collect();
        println!("  {:<8} [{}]", kind.as_str(), steps.join(" -> "));
    }
    Ok(())
}
