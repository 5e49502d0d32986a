use crate::cli::ListArgs;
use crate::exit_codes;
use crate::output;
use gaze_select::{FilterConfig, FilterKind};
use serde::Serialize;

#[derive(Serialize)]
struct FilterInfo {
    name: &'static str,
    default: bool,
    description: &'static str,
}

pub fn execute(args: ListArgs) -> i32 {
    let default_kind = FilterConfig::default().kind;
    let filters: Vec<FilterInfo> = FilterKind::ALL
        .iter()
        .map(|f| FilterInfo {
            name: f.as_str(),
            default: *f == default_kind,
            description: f.description(),
        })
        .collect();

    if args.json {
        return output::emit(&filters, false, None);
    }

    println!("Smoothing filters:\n");
    println!("  {:<18} {}", "Name", "Description");
    println!("  {}", "-".repeat(72));
    for f in &filters {
        let marker = if f.default { " (default)" } else { "" };
        println!("  {:<18} {}{}", f.name, f.description, marker);
    }

    exit_codes::SUCCESS
}
