//! Serverless worker loop: one JSON event per input line, one JSON result per
//! output line.

use std::io::{BufRead, Write};

use serde_json::Value;
use tracing::warn;
use voice_core::{handle_event, InvocationOutput, VoiceCloner};

/// Process events until `input` is exhausted. Returns how many were handled.
///
/// Every non-blank line yields exactly one output line; malformed events get a
/// failure object instead of stopping the loop.
pub fn run<R: BufRead, W: Write>(cloner: &VoiceCloner, input: R, mut output: W) -> std::io::Result<usize> {
    let mut handled = 0;
    // Raw bytes: a line that is not UTF-8 is a bad event, not a reader failure.
    for line in input.split(b'\n') {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let result = match serde_json::from_slice::<Value>(&line) {
            Ok(event) => handle_event(cloner, &event),
            Err(e) => {
                warn!("Discarding malformed event: {e}");
                InvocationOutput::failure(format!("Invalid JSON event: {e}"))
            }
        };

        serde_json::to_writer(&mut output, &result)?;
        output.write_all(b"\n")?;
        output.flush()?;
        handled += 1;
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use voice_core::backend::ToneSynthesizer;
    use voice_core::{Device, ModelHandle};

    #[test]
    fn test_one_result_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelHandle::new(Box::new(ToneSynthesizer::default()), Device::Cpu, "xtts_v2", Duration::ZERO);
        let cloner = VoiceCloner::new(model, dir.path());

        let input = "{\"input\": {\"text\": \"\"}}\n\nnot json\n{}\n";
        let mut out = Vec::new();
        let handled = run(&cloner, input.as_bytes(), &mut out).unwrap();
        assert_eq!(handled, 3);

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["error"], "Missing text parameter");
        assert!(lines[1]["error"].as_str().unwrap().starts_with("Invalid JSON event"));
        assert_eq!(lines[2]["success"], false);
    }

    #[test]
    fn test_non_utf8_line_does_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelHandle::new(Box::new(ToneSynthesizer::default()), Device::Cpu, "xtts_v2", Duration::ZERO);
        let cloner = VoiceCloner::new(model, dir.path());

        let mut input = b"{\"input\": {\"text\": \"\"}}\n".to_vec();
        input.extend_from_slice(b"{\"input\": {\"text\": \"\xff\xfe\"}}\r\n");
        input.extend_from_slice(b"{}");
        let mut out = Vec::new();
        let handled = run(&cloner, input.as_slice(), &mut out).unwrap();
        assert_eq!(handled, 3);

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["error"], "Missing text parameter");
        assert!(lines[1]["error"].as_str().unwrap().starts_with("Invalid JSON event"));
        assert_eq!(lines[2]["error"], "Missing text parameter");
    }
}
