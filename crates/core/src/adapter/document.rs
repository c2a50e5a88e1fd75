//! Document planners: LibreOffice, ImageMagick for PDF pages, pdftotext and
//! Calibre.

use std::path::Path;

use super::{file_stem, staging_dir_for, ToolPlan, ToolsConfig};
use crate::process::Invocation;

/// `soffice --convert-to` picks its own output name, `<input stem>.<ext>`,
/// inside `--outdir`. Each job gets a private outdir so two jobs converting
/// the same upload cannot collide, and a private user profile inside it so
/// concurrent instances do not share one.
pub(super) fn office_convert(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    convert_to: &str,
    infilter: Option<&str>,
) -> ToolPlan {
    let staging = staging_dir_for(output);
    let extension = convert_to.split(':').next().unwrap_or(convert_to);
    let produced = staging.join(format!("{}.{}", file_stem(input), extension));

    let mut invocation = Invocation::new(&tools.soffice_path)
        .arg(format!("-env:UserInstallation={}", file_url(&staging.join("profile"))))
        .arg("--headless")
        .arg("--norestore");
    if let Some(filter) = infilter {
        invocation = invocation.arg(format!("--infilter={}", filter));
    }
    let invocation = invocation
        .arg("--convert-to")
        .arg(convert_to)
        .path_arg(input)
        .arg("--outdir")
        .path_arg(&staging);

    ToolPlan::writes_one_of(invocation, vec![produced]).with_staging_dir(staging)
}

/// `file://` URL for a local path, as LibreOffice's bootstrap variables
/// expect.
fn file_url(path: &Path) -> String {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut url = String::from("file://");
    for c in path.to_string_lossy().chars() {
        match c {
            ' ' => url.push_str("%20"),
            '%' => url.push_str("%25"),
            '#' => url.push_str("%23"),
            '?' => url.push_str("%3F"),
            _ => url.push(c),
        }
    }
    url
}

/// PDF to Word goes through Writer's PDF import with an explicit export
/// filter.
pub(super) fn pdf_to_word(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    target: &str,
) -> ToolPlan {
    let convert_to = match target {
        "doc" => "doc:MS Word 97",
        _ => "docx:MS Word 2007 XML",
    };
    office_convert(tools, input, output, convert_to, Some("writer_pdf_import"))
}

/// Rasterizes a PDF; the first page becomes the result.
pub(super) fn pdf_to_image(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    target: &str,
) -> ToolPlan {
    let staging = staging_dir_for(output);
    let invocation = Invocation::new(&tools.magick_path)
        .args(["-density", "300"])
        .path_arg(input)
        .args(["-quality", "90"])
        .path_arg(&staging.join(format!("page-%d.{}", target)));

    // Single page documents may skip the page index
    let candidates = vec![
        staging.join(format!("page-0.{}", target)),
        staging.join(format!("page.{}", target)),
    ];
    ToolPlan::writes_one_of(invocation, candidates).with_staging_dir(staging)
}

pub(super) fn pdf_to_text(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.pdftotext_path)
        .path_arg(input)
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

/// Calibre infers both formats from the file extensions.
pub(super) fn ebook_convert(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.ebook_convert_path)
        .path_arg(input)
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}
