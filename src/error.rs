use std::fmt;

#[derive(Debug)]
pub enum StudioError {
    Audio(AudioError),
    Registry(RegistryError),
    Shell(ShellError),
    Advice(String),
    Export(String),
}

#[derive(Debug)]
pub enum AudioError {
    /// The host refused to hand out an output context.
    OutputUnavailable { reason: String },
    InvalidSampleRate { sample_rate: f64 },
}

#[derive(Debug)]
pub enum RegistryError {
    Empty,
    DuplicateId { id: String },
    NoNotes { id: String },
    InvalidFrequency { id: String, note: String, frequency: f64 },
    InvalidParameter { id: String, field: &'static str, value: f64 },
    Json(serde_json::Error),
}

#[derive(Debug)]
pub enum ShellError {
    UnknownInstrument { id: String },
    UnknownString { index: usize, strings: usize },
}

impl fmt::Display for StudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudioError::Audio(e) => write!(f, "Audio error: {e}"),
            StudioError::Registry(e) => write!(f, "Registry error: {e}"),
            StudioError::Shell(e) => write!(f, "Studio error: {e}"),
            StudioError::Advice(msg) => write!(f, "Advice error: {msg}"),
            StudioError::Export(msg) => write!(f, "Export error: {msg}"),
        }
    }
}

impl std::error::Error for StudioError {}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::OutputUnavailable { reason } => {
                write!(f, "Audio output unavailable: {reason}")
            }
            AudioError::InvalidSampleRate { sample_rate } => {
                write!(f, "Invalid sample rate {sample_rate}")
            }
        }
    }
}

impl std::error::Error for AudioError {}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Empty => write!(f, "Registry has no instruments"),
            RegistryError::DuplicateId { id } => write!(f, "Duplicate instrument id '{id}'"),
            RegistryError::NoNotes { id } => write!(f, "Instrument '{id}' has no notes"),
            RegistryError::InvalidFrequency { id, note, frequency } => {
                write!(f, "Instrument '{id}' note '{note}' has invalid frequency {frequency}")
            }
            RegistryError::InvalidParameter { id, field, value } => {
                write!(f, "Instrument '{id}' has invalid {field} {value}")
            }
            RegistryError::Json(e) => write!(f, "Invalid registry JSON: {e}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::UnknownInstrument { id } => write!(f, "Unknown instrument '{id}'"),
            ShellError::UnknownString { index, strings } => {
                write!(f, "String {index} out of range ({strings} strings)")
            }
        }
    }
}

impl std::error::Error for ShellError {}

impl From<AudioError> for StudioError {
    fn from(e: AudioError) -> Self {
        StudioError::Audio(e)
    }
}

impl From<RegistryError> for StudioError {
    fn from(e: RegistryError) -> Self {
        StudioError::Registry(e)
    }
}

impl From<ShellError> for StudioError {
    fn from(e: ShellError) -> Self {
        StudioError::Shell(e)
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Json(e)
    }
}
