use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const CANDIDATE_PREFIX: &str = "candidate:";

/// One discovered network path, in the engine's candidate-init JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl Candidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
            username_fragment: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid candidate json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected candidate payload of type {0}")]
    UnexpectedShape(&'static str),

    #[error("unrecognized candidate text: {0:?}")]
    UnrecognizedText(String),

    #[error("candidate line has no attributes")]
    EmptyCandidateLine,
}

/// A relayed candidate message: either a path or the "no more candidates" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSignal {
    Candidate(Candidate),
    EndOfCandidates,
}

impl CandidateSignal {
    /// Decodes a relayed payload.
    ///
    /// `null`, `""`, `{}` and a candidate object with an empty `candidate`
    /// field all mean end of candidates. Besides the plain candidate object,
    /// a JSON string holding a candidate object and a bare `candidate:...`
    /// line are accepted, since relays and peers disagree on the encoding.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        match payload {
            Value::Null => Ok(Self::EndOfCandidates),
            Value::String(text) => Self::from_text(text),
            Value::Object(map) if map.is_empty() => Ok(Self::EndOfCandidates),
            Value::Object(_) => {
                let candidate = Candidate::deserialize(payload)?;
                Ok(Self::from_candidate(candidate))
            }
            Value::Bool(_) => Err(PayloadError::UnexpectedShape("bool")),
            Value::Number(_) => Err(PayloadError::UnexpectedShape("number")),
            Value::Array(_) => Err(PayloadError::UnexpectedShape("array")),
        }
    }

    pub fn to_payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Candidate(candidate) => serde_json::to_value(candidate),
            Self::EndOfCandidates => Ok(Value::Null),
        }
    }

    fn from_text(text: &str) -> Result<Self, PayloadError> {
        let text = text.trim();

        if text.is_empty() {
            return Ok(Self::EndOfCandidates);
        }

        if text.starts_with('{') {
            let inner: Value = serde_json::from_str(text)?;
            return match inner {
                Value::Object(_) => Self::from_payload(&inner),
                _ => Err(PayloadError::UnrecognizedText(text.to_owned())),
            };
        }

        match text.strip_prefix(CANDIDATE_PREFIX) {
            Some(rest) if rest.trim().is_empty() => Err(PayloadError::EmptyCandidateLine),
            Some(_) => Ok(Self::Candidate(Candidate::new(text))),
            None => Err(PayloadError::UnrecognizedText(text.to_owned())),
        }
    }

    fn from_candidate(candidate: Candidate) -> Self {
        if candidate.candidate.trim().is_empty() {
            Self::EndOfCandidates
        } else {
            Self::Candidate(candidate)
        }
    }
}
