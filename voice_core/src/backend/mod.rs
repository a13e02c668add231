//! Synthesis backends selectable through [`crate::config::BackendKind`].

mod coqui;
mod tone;

pub use coqui::CoquiCli;
pub use tone::{ToneSynthesizer, SUPPORTED_LANGUAGES};
