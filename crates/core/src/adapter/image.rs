//! ImageMagick planners.

use std::path::Path;

use super::options::{
    format_number, CompressMode, CompressParams, CropParams, RotateParams, WatermarkParams,
};
use super::{ConversionOptions, OptionsError, ToolPlan, ToolsConfig};
use crate::process::Invocation;

fn magick(tools: &ToolsConfig, input: &Path) -> Invocation {
    Invocation::new(&tools.magick_path).path_arg(input)
}

fn quality_for(target: &str) -> Option<&'static str> {
    match target {
        "jpg" | "jpeg" => Some("85"),
        "png" => Some("90"),
        "webp" => Some("80"),
        _ => None,
    }
}

pub(super) fn image_convert(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    target: &str,
) -> ToolPlan {
    let mut invocation = magick(tools, input);
    if let Some(quality) = quality_for(target) {
        invocation = invocation.args(["-quality", quality]);
    }
    ToolPlan::writes(invocation.path_arg(output), output)
}

pub(super) fn image_compress(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ToolPlan, OptionsError> {
    let params = CompressParams::from_options(options)?;
    let invocation = match params.mode {
        CompressMode::Lossless => {
            magick(tools, input).args(["-strip", "-define", "png:compression-level=9"])
        }
        CompressMode::Lossy => magick(tools, input)
            .arg("-quality")
            .arg(params.quality.to_string())
            .arg("-strip"),
    };
    Ok(ToolPlan::writes(invocation.path_arg(output), output))
}

pub(super) fn image_crop(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ToolPlan, OptionsError> {
    let crop = CropParams::from_options(options)?;
    let invocation = magick(tools, input)
        .arg("-crop")
        .arg(crop.geometry())
        .arg("+repage")
        .path_arg(output);
    Ok(ToolPlan::writes(invocation, output))
}

pub(super) fn image_rotate(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ToolPlan, OptionsError> {
    let rotate = RotateParams::from_options(options)?;
    let invocation = magick(tools, input)
        .arg("-rotate")
        .arg(format_number(rotate.angle))
        .path_arg(output);
    Ok(ToolPlan::writes(invocation, output))
}

pub(super) fn image_watermark(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ToolPlan, OptionsError> {
    let mark = WatermarkParams::from_options(options)?;
    let invocation = magick(tools, input)
        .arg("-pointsize")
        .arg(format_number(mark.size))
        .arg("-fill")
        .arg(mark.fill())
        .arg("-gravity")
        .arg(mark.position.gravity())
        .args(["-annotate", "+10+10"])
        .arg(mark.text)
        .path_arg(output);
    Ok(ToolPlan::writes(invocation, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(value: serde_json::Value) -> ConversionOptions {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_image_convert_quality_by_target() {
        let tools = ToolsConfig::default();
        let plan = image_convert(&tools, Path::new("a.png"), Path::new("b.jpg"), "jpg");
        assert_eq!(plan.invocation.args, vec!["a.png", "-quality", "85", "b.jpg"]);

        let plan = image_convert(&tools, Path::new("a.png"), Path::new("b.bmp"), "bmp");
        assert_eq!(plan.invocation.args, vec!["a.png", "b.bmp"]);
    }

    #[test]
    fn test_image_compress_modes() {
        let tools = ToolsConfig::default();
        let plan = image_compress(
            &tools,
            Path::new("a.png"),
            Path::new("b.png"),
            &opts(json!({"type": "lossless"})),
        )
        .unwrap();
        assert_eq!(
            plan.invocation.args,
            vec!["a.png", "-strip", "-define", "png:compression-level=9", "b.png"]
        );

        let plan = image_compress(
            &tools,
            Path::new("a.jpg"),
            Path::new("b.jpg"),
            &opts(json!({"quality": 60})),
        )
        .unwrap();
        assert_eq!(
            plan.invocation.args,
            vec!["a.jpg", "-quality", "60", "-strip", "b.jpg"]
        );
    }

    #[test]
    fn test_image_crop() {
        let tools = ToolsConfig::default();
        let plan = image_crop(
            &tools,
            Path::new("a.png"),
            Path::new("b.png"),
            &opts(json!({"width": 100, "height": 50, "x": 10, "y": 20})),
        )
        .unwrap();
        assert_eq!(
            plan.invocation.args,
            vec!["a.png", "-crop", "100x50+10+20", "+repage", "b.png"]
        );
    }

    #[test]
    fn test_image_crop_missing_dimensions() {
        let tools = ToolsConfig::default();
        let err = image_crop(
            &tools,
            Path::new("a.png"),
            Path::new("b.png"),
            &ConversionOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, OptionsError::Missing { field: "width" }));
    }

    #[test]
    fn test_image_rotate_default_angle() {
        let tools = ToolsConfig::default();
        let plan = image_rotate(
            &tools,
            Path::new("a.png"),
            Path::new("b.png"),
            &ConversionOptions::new(),
        )
        .unwrap();
        assert_eq!(plan.invocation.args, vec!["a.png", "-rotate", "90", "b.png"]);
    }

    #[test]
    fn test_image_watermark_text_is_one_argument() {
        let tools = ToolsConfig::default();
        let plan = image_watermark(
            &tools,
            Path::new("a.png"),
            Path::new("b.png"),
            &opts(json!({"text": "Draft copy; do not share", "position": "center"})),
        )
        .unwrap();
        assert_eq!(
            plan.invocation.args,
            vec![
                "a.png",
                "-pointsize",
                "24",
                "-fill",
                "rgba(255,255,255,0.5)",
                "-gravity",
                "Center",
                "-annotate",
                "+10+10",
                "Draft copy; do not share",
                "b.png"
            ]
        );
    }

    #[test]
    fn test_image_watermark_rejects_at_prefixed_text() {
        let tools = ToolsConfig::default();
        let err = image_watermark(
            &tools,
            Path::new("a.png"),
            Path::new("b.png"),
            &opts(json!({"text": "@secrets.txt"})),
        )
        .unwrap_err();
        assert!(matches!(err, OptionsError::Invalid { field: "text", .. }));
    }
}
