use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::stage::ElementId;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("missing DOM element #{0}")]
    MissingElement(&'static str),
    #[error("pipeline `{0}` is not registered")]
    MissingPipeline(String),
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),
    #[error("asset `{key}` failed to load: {reason}")]
    AssetLoad { key: String, reason: String },
    #[error("audio playback failed: {0}")]
    Audio(String),
    #[error("{0}")]
    Js(String),
}

pub type Result<T, E = MenuError> = std::result::Result<T, E>;

pub(crate) fn js_value_to_string(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

impl From<JsValue> for MenuError {
    fn from(value: JsValue) -> Self {
        MenuError::Js(js_value_to_string(&value))
    }
}

impl From<MenuError> for JsValue {
    fn from(err: MenuError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
