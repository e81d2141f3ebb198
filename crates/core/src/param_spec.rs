use serde::Serialize;

use crate::node::ParamValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Float,
    Int,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamWidget {
    Default,
    Slider,
    Combo,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamRange {
    Float { min: f32, max: Option<f32> },
    Int { min: i32, max: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ParamKind,
    pub widget: ParamWidget,
    pub range: Option<ParamRange>,
    pub step: Option<f32>,
    pub default: Option<ParamValue>,
    pub options: Vec<ParamOption>,
    /// Combo values outside `options` pass validation when set.
    pub allow_unlisted: bool,
    pub help: Option<&'static str>,
}

impl ParamSpec {
    pub fn new(key: &'static str, label: &'static str, kind: ParamKind) -> Self {
        Self {
            key,
            label,
            kind,
            widget: ParamWidget::Default,
            range: None,
            step: None,
            default: None,
            options: Vec::new(),
            allow_unlisted: false,
            help: None,
        }
    }

    pub fn float(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ParamKind::Float)
    }

    pub fn int_slider(key: &'static str, label: &'static str, min: i32, max: i32) -> Self {
        Self::new(key, label, ParamKind::Int).with_range(ParamRange::Int { min, max }, true)
    }

    pub fn string_enum(key: &'static str, label: &'static str, options: Vec<String>) -> Self {
        let options = options
            .into_iter()
            .map(|value| ParamOption {
                label: value.clone(),
                value,
            })
            .collect();
        Self::new(key, label, ParamKind::String).with_options(options, true)
    }

    /// Keeps `options` as suggestions and leaves the value to the node.
    pub fn allow_unlisted(mut self) -> Self {
        self.allow_unlisted = true;
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_default(mut self, value: ParamValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_range(mut self, range: ParamRange, slider: bool) -> Self {
        self.range = Some(range);
        if slider {
            self.widget = ParamWidget::Slider;
        }
        self
    }

    pub fn with_options(mut self, options: Vec<ParamOption>, combo: bool) -> Self {
        self.options = options;
        if combo {
            self.widget = ParamWidget::Combo;
        }
        self
    }

    /// Checks a value's type, range and membership in `options`.
    pub fn validate(&self, value: &ParamValue) -> Result<(), String> {
        match (self.kind, value) {
            (ParamKind::Int, ParamValue::Int(v)) => {
                if let Some(ParamRange::Int { min, max }) = self.range {
                    if *v < min || *v > max {
                        return Err(format!(
                            "{} must be between {min} and {max}, got {v}",
                            self.key
                        ));
                    }
                }
            }
            (ParamKind::Float, ParamValue::Float(v)) => {
                if !v.is_finite() {
                    return Err(format!("{} must be finite", self.key));
                }
                if let Some(ParamRange::Float { min, max }) = self.range {
                    if *v < min || max.is_some_and(|max| *v > max) {
                        return Err(format!("{} is out of range: {v}", self.key));
                    }
                }
            }
            (ParamKind::Float, ParamValue::Int(v)) => {
                return self.validate(&ParamValue::Float(*v as f32));
            }
            (ParamKind::String, ParamValue::String(v)) => {
                if self.widget == ParamWidget::Combo
                    && !self.allow_unlisted
                    && !self.options.iter().any(|option| option.value == *v)
                {
                    return Err(format!("{} is not an available option for {}", v, self.key));
                }
            }
            (kind, value) => {
                return Err(format!(
                    "{} expects a {kind:?} value, got {value:?}",
                    self.key
                ));
            }
        }
        Ok(())
    }
}
