//! Streaming progress types
//!
//! The chat request loop pushes response fragments to a progress sink as
//! they arrive; the rate-limit layer uses the same seam for advisory
//! notices so they show up inline in the streamed response.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Parts that can be pushed to the response stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsePart {
    /// Text fragment (model output or advisory notice)
    #[serde(rename = "text")]
    Text { text: String },
}

impl ResponsePart {
    pub fn text(text: impl Into<String>) -> Self {
        ResponsePart::Text { text: text.into() }
    }
}

/// Sink accepting streamed response parts
pub trait ProgressSink: Send + Sync {
    fn report(&self, part: ResponsePart);
}

/// Channel-backed sink for the streaming pipeline.
///
/// A closed receiver means nobody is listening anymore; parts are dropped
/// silently rather than treated as an error.
impl ProgressSink for mpsc::UnboundedSender<ResponsePart> {
    fn report(&self, part: ResponsePart) {
        let _ = self.send(part);
    }
}
