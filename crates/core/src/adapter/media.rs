//! Video and audio planners, all ffmpeg except GIF optimization.

use std::path::Path;

use super::options::{format_number, CutParams, VolumeParams};
use super::{ConversionOptions, OptionsError, ToolPlan, ToolsConfig};
use crate::process::Invocation;

fn ffmpeg(tools: &ToolsConfig, input: &Path) -> Invocation {
    Invocation::new(&tools.ffmpeg_path)
        .arg("-hide_banner")
        .args(["-loglevel", tools.ffmpeg_log_level.as_str()])
        .arg("-y")
        .arg("-i")
        .path_arg(input)
}

fn video_codec_args(target: &str) -> &'static [&'static str] {
    match target {
        "avi" => &["-c:v", "libxvid", "-q:v", "4", "-c:a", "libmp3lame", "-q:a", "2"],
        "mkv" => &["-c", "copy"],
        "flv" => &["-c:v", "flv1", "-c:a", "mp3", "-ar", "44100"],
        "webm" => &["-c:v", "libvpx-vp9", "-crf", "30", "-b:v", "0", "-c:a", "libopus"],
        _ => &[
            "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-c:a", "aac", "-b:a", "128k",
        ],
    }
}

fn audio_extract_args(target: &str) -> &'static [&'static str] {
    match target {
        "aac" => &["-vn", "-c:a", "aac", "-b:a", "128k"],
        "wav" => &["-vn", "-c:a", "pcm_s16le"],
        _ => &["-vn", "-c:a", "libmp3lame", "-b:a", "192k"],
    }
}

fn audio_codec_args(target: &str) -> &'static [&'static str] {
    match target {
        "wav" => &["-codec:a", "pcm_s16le"],
        "flac" => &["-codec:a", "flac"],
        "m4a" => &["-codec:a", "aac", "-b:a", "128k"],
        "ogg" => &["-codec:a", "libvorbis", "-qscale:a", "6"],
        _ => &["-codec:a", "libmp3lame", "-qscale:a", "2"],
    }
}

pub(super) fn video_transcode(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    target: &str,
) -> ToolPlan {
    let invocation = ffmpeg(tools, input)
        .args(video_codec_args(target).iter().copied())
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

pub(super) fn audio_extract(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    target: &str,
) -> ToolPlan {
    let invocation = ffmpeg(tools, input)
        .args(audio_extract_args(target).iter().copied())
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

pub(super) fn video_to_gif(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = ffmpeg(tools, input)
        .args(["-vf", "fps=15,scale=640:-1:flags=lanczos", "-an", "-c:v", "gif"])
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

/// yuv420p needs even dimensions, so odd-sized GIFs are trimmed by a pixel.
pub(super) fn gif_to_video(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = ffmpeg(tools, input)
        .args([
            "-vf",
            "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-c:v",
            "libx264",
            "-crf",
            "23",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

pub(super) fn gif_optimize(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = Invocation::new(&tools.gifsicle_path)
        .arg("--optimize=3")
        .path_arg(input)
        .arg("-o")
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

/// `-vn` drops embedded cover art, which most audio muxers reject.
pub(super) fn audio_transcode(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    target: &str,
) -> ToolPlan {
    let invocation = ffmpeg(tools, input)
        .arg("-vn")
        .args(audio_codec_args(target).iter().copied())
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

pub(super) fn audio_cut(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ToolPlan, OptionsError> {
    let cut = CutParams::from_options(options)?;
    let mut invocation = ffmpeg(tools, input).args(["-ss".to_string(), format_number(cut.start)]);
    if let Some(duration) = cut.duration {
        invocation = invocation.args(["-t".to_string(), format_number(duration)]);
    }
    let invocation = invocation.args(["-acodec", "copy"]).path_arg(output);
    Ok(ToolPlan::writes(invocation, output))
}

pub(super) fn audio_denoise(tools: &ToolsConfig, input: &Path, output: &Path) -> ToolPlan {
    let invocation = ffmpeg(tools, input)
        .args(["-af", "afftdn=nf=-25"])
        .path_arg(output);
    ToolPlan::writes(invocation, output)
}

pub(super) fn audio_volume(
    tools: &ToolsConfig,
    input: &Path,
    output: &Path,
    options: &ConversionOptions,
) -> Result<ToolPlan, OptionsError> {
    let params = VolumeParams::from_options(options)?;
    let invocation = ffmpeg(tools, input)
        .arg("-af")
        .arg(format!("volume={}", format_number(params.volume)))
        .path_arg(output);
    Ok(ToolPlan::writes(invocation, output))
}
