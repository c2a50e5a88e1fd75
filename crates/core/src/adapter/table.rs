//! Table planners. Spreadsheet conversions share LibreOffice with documents;
//! CSV to JSON runs a short Python script.

use std::path::Path;

use super::{ToolPlan, ToolsConfig};
use crate::process::Invocation;

/// Paths arrive through `sys.argv`, never spliced into the source.
const CSV_TO_JSON: &str = "\
import csv, json, sys
with open(sys.argv[1], newline='', encoding='utf-8-sig') as src:
    rows = list(csv.DictReader(src))
with open(sys.argv[2], 'w', encoding='utf-8') as dst:
    json.dump(rows, dst, ensure_ascii=False, indent=2)
";

pub(super) fn csv_to_json(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.python_path)
        .arg("-c")
        .arg(CSV_TO_JSON)
        .path_arg(input)
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}
