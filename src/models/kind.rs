use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Language,
    Image,
    Speech,
    Video,
    Transcription,
    Embedding,
    Rerank,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::Image => "image",
            Self::Speech => "speech",
            Self::Video => "video",
            Self::Transcription => "transcription",
            Self::Embedding => "embedding",
            Self::Rerank => "rerank",
        }
    }

    /// Lenient parse used for feed-provided type strings.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "language" | "chat" | "text" | "llm" | "completion" => Some(Self::Language),
            "image" | "images" | "image-generation" => Some(Self::Image),
            "speech" | "tts" | "audio" => Some(Self::Speech),
            "video" | "video-generation" => Some(Self::Video),
            "transcription" | "stt" | "asr" => Some(Self::Transcription),
            "embedding" | "embeddings" => Some(Self::Embedding),
            "rerank" | "reranking" => Some(Self::Rerank),
            _ => None,
        }
    }

    /// Whether models of this type can be picked as a chat/generation target.
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Embedding | Self::Rerank)
    }

    /// Local guess from the model id alone.
    pub fn guess(model_id: &str) -> Self {
        let id = model_id.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| id.contains(n));

        if has(&["embed"]) {
            Self::Embedding
        } else if has(&["rerank"]) {
            Self::Rerank
        } else if has(&["whisper", "transcri", "speech-to-text", "stt"]) {
            Self::Transcription
        } else if has(&["tts", "text-to-speech", "speech", "voice"]) {
            Self::Speech
        } else if has(&["video", "veo", "sora", "kling", "runway"]) {
            Self::Video
        } else if has(&[
            "dall-e",
            "gpt-image",
            "imagen",
            "flux",
            "stable-diffusion",
            "sdxl",
            "midjourney",
            "image",
        ]) {
            Self::Image
        } else {
            Self::Language
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
