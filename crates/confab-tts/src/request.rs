//! GPT-SoVITS request payload.
//!
//! The server takes snake_case JSON; voice parameters come straight from
//! config, only `text` and `streaming_mode` vary per call.

use serde::Serialize;

use confab_core::config::SovitsVoice;

/// Synthesis request body for a GPT-SoVITS `/tts` endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct SovitsRequest {
    pub text: String,
    pub text_lang: String,
    pub ref_audio_path: String,
    pub prompt_text: String,
    pub prompt_lang: String,
    pub text_split_method: String,
    pub batch_size: u32,
    pub media_type: String,
    pub streaming_mode: bool,
}

impl SovitsRequest {
    /// Build a request for `text` with the configured voice.
    pub fn new(text: &str, voice: &SovitsVoice, streaming_mode: bool) -> Self {
        SovitsRequest {
            text: text.to_string(),
            text_lang: voice.text_lang.clone(),
            ref_audio_path: voice.ref_audio_path.clone(),
            prompt_text: voice.prompt_text.clone(),
            prompt_lang: voice.prompt_lang.clone(),
            text_split_method: voice.text_split_method.clone(),
            batch_size: voice.batch_size,
            media_type: voice.media_type.clone(),
            streaming_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let voice = SovitsVoice {
            ref_audio_path: "/voices/ref.wav".to_string(),
            prompt_text: "reference line".to_string(),
            ..SovitsVoice::default()
        };
        let req = SovitsRequest::new("你好", &voice, true);
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["text"], "你好");
        assert_eq!(json["text_lang"], "zh");
        assert_eq!(json["ref_audio_path"], "/voices/ref.wav");
        assert_eq!(json["prompt_text"], "reference line");
        assert_eq!(json["prompt_lang"], "zh");
        assert_eq!(json["text_split_method"], "cut5");
        assert_eq!(json["batch_size"], 1);
        assert_eq!(json["media_type"], "wav");
        assert_eq!(json["streaming_mode"], true);
    }

    #[test]
    fn test_streaming_mode_off_for_buffered() {
        let req = SovitsRequest::new("hi", &SovitsVoice::default(), false);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["streaming_mode"], false);
    }
}
