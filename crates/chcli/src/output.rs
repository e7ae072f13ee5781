//! Keyframe stream encodings

use anyhow::Result;
use choreo::{AnimationReport, SinkEvent};
use choreoconf::OutputFormat;
use midi_perform::Feedback;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct RenderOutput {
    pub fps: f64,
    pub frame_offset: i64,
    pub groups: Vec<AnimationReport>,
    pub diagnostics: Vec<Feedback>,
    pub events: Vec<SinkEvent>,
}

impl RenderOutput {
    pub fn write(&self, writer: &mut impl Write, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, self)?;
                writeln!(writer)?;
            }
            OutputFormat::Csv => write_csv(writer, &self.events)?,
        }
        Ok(())
    }
}

/// One row per event; visibility rows leave the channel empty.
fn write_csv(writer: &mut impl Write, events: &[SinkEvent]) -> Result<()> {
    writeln!(writer, "kind,object,channel,frame,value")?;
    for event in events {
        match event {
            SinkEvent::Keyframe {
                object,
                channel,
                frame,
                value,
            } => writeln!(
                writer,
                "keyframe,{},{},{},{}",
                csv_field(object),
                csv_field(&channel.to_string()),
                frame,
                value
            )?,
            SinkEvent::Visibility {
                object,
                frame,
                visible,
            } => writeln!(
                writer,
                "visibility,{},,{},{}",
                csv_field(object),
                frame,
                u8::from(*visible)
            )?,
        }
    }
    Ok(())
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
