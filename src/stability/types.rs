use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const PROMPT_REQUIRED: &str = "Prompt is required";

/// A validated text-to-image request with every parameter resolved.
///
/// Numeric parameters are kept as the caller sent them; their ranges are
/// the upstream API's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub cfg_scale: Number,
    pub width: Number,
    pub height: Number,
    pub steps: Number,
    pub samples: Number,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            cfg_scale: Number::from(7),
            width: Number::from(1024),
            height: Number::from(1024),
            steps: Number::from(30),
            samples: Number::from(1),
        }
    }

    /// Builds a request from a client JSON body.
    ///
    /// `prompt` must be a non-empty string. Each numeric field must be a
    /// JSON number when present; `null` counts as absent.
    pub fn from_json(body: &Value) -> Result<Self> {
        let prompt = body
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|prompt| !prompt.is_empty())
            .ok_or_else(|| Error::invalid_request(PROMPT_REQUIRED))?;

        let mut request = Self::new(prompt);
        for (field, slot) in [
            ("cfg_scale", &mut request.cfg_scale),
            ("width", &mut request.width),
            ("height", &mut request.height),
            ("steps", &mut request.steps),
            ("samples", &mut request.samples),
        ] {
            match body.get(field) {
                None | Some(Value::Null) => {}
                Some(Value::Number(n)) => *slot = n.clone(),
                Some(_) => {
                    return Err(Error::InvalidParameter(format!("{} must be a number", field)));
                }
            }
        }
        Ok(request)
    }
}

/// One generated image as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_b64: String,
    pub image_data_uri: String,
}

impl GeneratedImage {
    pub fn from_base64(image_b64: impl Into<String>) -> Self {
        let image_b64 = image_b64.into();
        let image_data_uri = format!("data:image/png;base64,{}", image_b64);
        Self {
            image_b64,
            image_data_uri,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TextPrompt<'a> {
    pub text: &'a str,
}

/// Body of the upstream `text-to-image` call.
#[derive(Debug, Serialize)]
pub(crate) struct TextToImageBody<'a> {
    pub text_prompts: Vec<TextPrompt<'a>>,
    pub cfg_scale: &'a Number,
    pub width: &'a Number,
    pub height: &'a Number,
    pub steps: &'a Number,
    pub samples: &'a Number,
}

impl<'a> From<&'a GenerationRequest> for TextToImageBody<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            text_prompts: vec![TextPrompt {
                text: &request.prompt,
            }],
            cfg_scale: &request.cfg_scale,
            width: &request.width,
            height: &request.height,
            steps: &request.steps,
            samples: &request.samples,
        }
    }
}

/// Pulls `artifacts[0].base64` out of an upstream success body.
pub(crate) fn first_artifact_base64(body: &Value) -> Option<&str> {
    body.get("artifacts")?
        .get(0)?
        .get("base64")?
        .as_str()
        .filter(|b64| !b64.is_empty())
}
