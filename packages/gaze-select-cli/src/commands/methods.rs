use crate::cli::ListArgs;
use crate::exit_codes;
use crate::output;
use gaze_select::{SelectorConfig, StrategyKind};
use serde::Serialize;

#[derive(Serialize)]
struct MethodInfo {
    name: &'static str,
    dwell_time: f64,
    description: &'static str,
}

pub fn execute(args: ListArgs) -> i32 {
    let defaults = SelectorConfig::default();
    let methods: Vec<MethodInfo> = StrategyKind::ALL
        .iter()
        .map(|m| MethodInfo {
            name: m.as_str(),
            dwell_time: defaults.dwell_time(*m),
            description: m.description(),
        })
        .collect();

    if args.json {
        return output::emit(&methods, false, None);
    }

    println!("Selection methods:\n");
    println!("  {:<12} {:<8} {}", "Name", "Dwell", "Description");
    println!("  {}", "-".repeat(72));
    for m in &methods {
        println!("  {:<12} {:<8} {}", m.name, format!("{:.2}s", m.dwell_time), m.description);
    }
    println!();
    println!("Example: gazeselect run p01 --method blink");

    exit_codes::SUCCESS
}
