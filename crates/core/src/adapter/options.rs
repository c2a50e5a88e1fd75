//! The open options record and its typed views.
//!
//! HTTP form clients send numbers both as JSON numbers and as strings, so
//! every numeric accessor accepts either.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while reading operation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// A required option was not supplied.
    #[error("Missing required option: {field}")]
    Missing { field: &'static str },

    /// An option was supplied with an unusable value.
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl OptionsError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Key/value options attached to a job. Shape depends on the operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionOptions(Map<String, Value>);

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a number given as a JSON number or a numeric string.
    pub fn number(&self, field: &'static str) -> Result<Option<f64>, OptionsError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| OptionsError::invalid(field, "not a finite number")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| OptionsError::invalid(field, format!("'{}' is not a number", s))),
            Some(other) => Err(OptionsError::invalid(
                field,
                format!("expected a number, got {}", other),
            )),
        }
    }

    /// Reads a whole number.
    pub fn integer(&self, field: &'static str) -> Result<Option<i64>, OptionsError> {
        match self.number(field)? {
            None => Ok(None),
            Some(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(Some(v as i64)),
            Some(v) => Err(OptionsError::invalid(
                field,
                format!("{} is not a whole number", v),
            )),
        }
    }

    /// Reads a string. Numbers and booleans are rendered as text.
    pub fn text(&self, field: &'static str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for ConversionOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Renders a number for a command line without a trailing `.0`.
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn positive_dimension(
    options: &ConversionOptions,
    field: &'static str,
) -> Result<u32, OptionsError> {
    let value = options
        .integer(field)?
        .ok_or(OptionsError::Missing { field })?;
    if value <= 0 || value > u32::MAX as i64 {
        return Err(OptionsError::invalid(field, "must be a positive integer"));
    }
    Ok(value as u32)
}

fn offset(options: &ConversionOptions, field: &'static str) -> Result<u32, OptionsError> {
    match options.integer(field)? {
        None => Ok(0),
        Some(v) if (0..=u32::MAX as i64).contains(&v) => Ok(v as u32),
        Some(_) => Err(OptionsError::invalid(field, "must not be negative")),
    }
}

/// Crop rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropParams {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropParams {
    pub fn from_options(options: &ConversionOptions) -> Result<Self, OptionsError> {
        Ok(Self {
            width: positive_dimension(options, "width")?,
            height: positive_dimension(options, "height")?,
            x: offset(options, "x")?,
            y: offset(options, "y")?,
        })
    }

    /// ImageMagick geometry, `WxH+X+Y`.
    pub fn geometry(&self) -> String {
        format!("{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressMode {
    Lossy,
    Lossless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressParams {
    pub quality: u8,
    pub mode: CompressMode,
}

impl CompressParams {
    pub fn from_options(options: &ConversionOptions) -> Result<Self, OptionsError> {
        let quality = match options.integer("quality")? {
            None => 80,
            Some(q) if (1..=100).contains(&q) => q as u8,
            Some(_) => return Err(OptionsError::invalid("quality", "must be between 1 and 100")),
        };
        let mode = match options.text("type").as_deref().map(str::trim) {
            None | Some("") | Some("lossy") => CompressMode::Lossy,
            Some("lossless") => CompressMode::Lossless,
            Some(other) => {
                return Err(OptionsError::invalid(
                    "type",
                    format!("'{}' is not lossy or lossless", other),
                ))
            }
        };
        Ok(Self { quality, mode })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateParams {
    pub angle: f64,
}

impl RotateParams {
    pub fn from_options(options: &ConversionOptions) -> Result<Self, OptionsError> {
        Ok(Self {
            angle: options.number("angle")?.unwrap_or(90.0),
        })
    }
}

/// Where a watermark is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl WatermarkPosition {
    /// ImageMagick `-gravity` value.
    pub fn gravity(&self) -> &'static str {
        match self {
            Self::TopLeft => "NorthWest",
            Self::TopRight => "NorthEast",
            Self::BottomLeft => "SouthWest",
            Self::BottomRight => "SouthEast",
            Self::Center => "Center",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top-left" => Some(Self::TopLeft),
            "top-right" => Some(Self::TopRight),
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-right" => Some(Self::BottomRight),
            "center" => Some(Self::Center),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkParams {
    pub text: String,
    pub position: WatermarkPosition,
    pub opacity: f64,
    pub size: f64,
}

impl WatermarkParams {
    pub fn from_options(options: &ConversionOptions) -> Result<Self, OptionsError> {
        let text = options
            .text("text")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Watermark".to_string());
        // ImageMagick reads `-annotate @path` from a file.
        if text.starts_with('@') {
            return Err(OptionsError::invalid("text", "must not start with '@'"));
        }

        let position = match options.text("position") {
            None => WatermarkPosition::BottomRight,
            Some(p) => WatermarkPosition::parse(&p).ok_or_else(|| {
                OptionsError::invalid("position", format!("unknown position '{}'", p))
            })?,
        };

        let opacity = options.number("opacity")?.unwrap_or(0.5);
        if !(0.0..=1.0).contains(&opacity) {
            return Err(OptionsError::invalid("opacity", "must be between 0 and 1"));
        }

        let size = options.number("size")?.unwrap_or(24.0);
        if size <= 0.0 {
            return Err(OptionsError::invalid("size", "must be greater than 0"));
        }

        Ok(Self {
            text,
            position,
            opacity,
            size,
        })
    }

    /// ImageMagick `-fill` colour.
    pub fn fill(&self) -> String {
        format!("rgba(255,255,255,{})", format_number(self.opacity))
    }
}

/// Audio trim window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutParams {
    pub start: f64,
    pub duration: Option<f64>,
}

impl CutParams {
    pub fn from_options(options: &ConversionOptions) -> Result<Self, OptionsError> {
        let start = options.number("start")?.unwrap_or(0.0);
        if start < 0.0 {
            return Err(OptionsError::invalid("start", "must not be negative"));
        }
        let duration = options.number("duration")?;
        if matches!(duration, Some(d) if d <= 0.0) {
            return Err(OptionsError::invalid("duration", "must be greater than 0"));
        }
        Ok(Self { start, duration })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeParams {
    pub volume: f64,
}

impl VolumeParams {
    pub fn from_options(options: &ConversionOptions) -> Result<Self, OptionsError> {
        let volume = options.number("volume")?.unwrap_or(1.0);
        if volume <= 0.0 {
            return Err(OptionsError::invalid("volume", "must be greater than 0"));
        }
        Ok(Self { volume })
    }
}
