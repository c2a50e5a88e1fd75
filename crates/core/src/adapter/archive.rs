//! Archive planners. Extraction picks the unpacker by input container.

use std::path::Path;

use super::{ToolPlan, ToolsConfig};
use crate::process::Invocation;

pub(super) fn extract_zip(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.unzip_path)
        .arg("-o")
        .path_arg(input)
        .arg("-d")
        .path_arg(output);
    ToolPlan::fills_directory(invocation)
}

pub(super) fn extract_rar(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    // unrar treats the destination as a directory only with a trailing separator
    let mut destination = output.to_string_lossy().into_owned();
    if !destination.ends_with(std::path::MAIN_SEPARATOR) {
        destination.push(std::path::MAIN_SEPARATOR);
    }
    let invocation = Invocation::new(&tools.unrar_path)
        .args(["x", "-o+"])
        .path_arg(input)
        .arg(destination);
    ToolPlan::fills_directory(invocation)
}

pub(super) fn extract_7z(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.seven_zip_path)
        .arg("x")
        .arg(format!("-o{}", output.display()))
        .arg("-y")
        .path_arg(input);
    ToolPlan::fills_directory(invocation)
}

/// Repacks a single file; `-j` keeps upload directories out of the archive.
pub(super) fn zip_compress(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.zip_path)
        .arg("-j")
        .path_arg(output)
        .path_arg(input);
    ToolPlan::writes(invocation, output)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::adapter::Artifact;

    #[test]
    fn test_extract_commands_per_container() {
        let tools = ToolsConfig::default();
        let out = Path::new("/out/job1");

        let plan = extract_zip(&tools, Path::new("/up/a.zip"), out);
        assert_eq!(plan.invocation.program_name(), "unzip");
        assert_eq!(plan.invocation.args, vec!["-o", "/up/a.zip", "-d", "/out/job1"]);
        assert_eq!(plan.artifact, Artifact::Directory);

        let plan = extract_rar(&tools, Path::new("/up/a.rar"), out);
        assert_eq!(plan.invocation.args, vec!["x", "-o+", "/up/a.rar", "/out/job1/"]);

        let plan = extract_7z(&tools, Path::new("/up/a.7z"), out);
        assert_eq!(plan.invocation.program_name(), "7z");
        assert_eq!(plan.invocation.args, vec!["x", "-o/out/job1", "-y", "/up/a.7z"]);
    }

    #[test]
    fn test_zip_compress() {
        let tools = ToolsConfig::default();
        let plan = zip_compress(&tools, Path::new("/up/a.7z"), Path::new("/out/j.zip"));
        assert_eq!(plan.invocation.args, vec!["-j", "/out/j.zip", "/up/a.7z"]);
        assert!(matches!(plan.artifact, Artifact::File { .. }));
    }
}
