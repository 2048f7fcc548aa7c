//! `.lms` (LOR Media Sequence) XML score loader.
//!
//! Grounded on `examples/original_source/src/seqtypes/lormedia.c`
//! (`lormedia_sequence_load`/`lormedia_get_frame`), adapted to `quick-xml`'s
//! pull-parser `Reader` in the event-matching style used throughout
//! `brew-lab-thaumic-cast`'s Sonos XML handling (`sonos/client.rs`,
//! `sonos/utils.rs`'s `get_xml_attr`). The C source makes three linear
//! passes over the parsed `libxml2` tree (step time, frame count, channel
//! population); this re-parses the document text three times instead, since
//! each pass depends on a value the previous one finalized.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::channel::ChannelTable;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::sequence::Sequence;
use crate::wire::duration_to_half_seconds;

/// Default step time (20 FPS), used when the score has no positive-width
/// effects to derive a tighter one from.
const DEFAULT_STEP_TIME_MS: u32 = 50;

/// Loads a `.lms` score from `path`, returning the parsed `Sequence` and the
/// `musicFilename` audio hint (possibly empty if the attribute is absent).
pub fn load(path: &Path) -> Result<(Sequence, String)> {
    check_extension(path)?;

    let xml = std::fs::read_to_string(path)?;

    let audio_hint = extract_music_filename(&xml);
    let step_time_ms = first_pass_step_time(&xml, path)?;
    let frame_count = second_pass_frame_count(&xml, step_time_ms, path)?;
    let channels = third_pass_channels(&xml, step_time_ms, path)?;

    if channels.is_empty() {
        return Err(Error::NoChannels {
            path: path.to_path_buf(),
        });
    }
    if frame_count == 0 {
        return Err(Error::NoFrames {
            path: path.to_path_buf(),
        });
    }

    Ok((Sequence::new(step_time_ms, frame_count, channels), audio_hint))
}

fn check_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        None => Err(Error::BadExt {
            path: path.to_path_buf(),
        }),
        Some(ext) if ext.eq_ignore_ascii_case("lms") => Ok(()),
        Some(ext) => Err(Error::UnsupportedExt {
            path: path.to_path_buf(),
            ext: ext.to_string(),
        }),
    }
}

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn get_attr_u64(e: &BytesStart, name: &[u8]) -> u64 {
    get_attr(e, name)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

/// `sequence[@musicFilename]`. Absent attribute just yields an
/// empty hint — `Player::start` falls back to `<sequence>.wav` either way.
fn extract_music_filename(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"sequence" => {
                return get_attr(e, b"musicFilename").unwrap_or_default();
            }
            Ok(Event::Eof) | Err(_) => return String::new(),
            _ => {}
        }
        buf.clear();
    }
}

/// First pass: smallest positive `(end - start) * 10ms` across every
/// `<effect>`, floored at `DEFAULT_STEP_TIME_MS`.
fn first_pass_step_time(xml: &str, path: &Path) -> Result<u32> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut step_time_ms = DEFAULT_STEP_TIME_MS;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"effect" => {
                let start_cs = get_attr_u64(e, b"startCentisecond");
                let end_cs = get_attr_u64(e, b"endCentisecond");
                if end_cs > start_cs {
                    let duration_ms = (end_cs - start_cs) * 10;
                    if duration_ms > 0 && (duration_ms as u32) < step_time_ms {
                        step_time_ms = duration_ms as u32;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::MalformedData {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(step_time_ms)
}

/// Second pass: the longest `<track totalCentiseconds>`, converted to a tick
/// count via the step time the first pass settled on.
fn second_pass_frame_count(xml: &str, step_time_ms: u32, path: &Path) -> Result<u32> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut highest_total_cs: u64 = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"track" => {
                let total_cs = get_attr_u64(e, b"totalCentiseconds");
                if total_cs > highest_total_cs {
                    highest_total_cs = total_cs;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::MalformedData {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(((highest_total_cs * 10) / u64::from(step_time_ms)) as u32)
}

/// Third pass: populate a channel per `<channel unit circuit>` and write
/// each child `<effect>` into its tick slot.
fn third_pass_channels(xml: &str, step_time_ms: u32, path: &Path) -> Result<ChannelTable> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut channels = ChannelTable::new();
    let mut current: Option<(u8, u8)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"channel" => {
                let unit = get_attr_u64(e, b"unit") as u8;
                let circuit = (get_attr_u64(e, b"circuit") as u8).wrapping_sub(1);
                channels.get_or_insert(unit, circuit)?;
                current = Some((unit, circuit));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"channel" => {
                current = None;
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"effect" => {
                let Some((unit, circuit)) = current else {
                    continue;
                };

                let start_cs = get_attr_u64(e, b"startCentisecond");
                let end_cs = get_attr_u64(e, b"endCentisecond");
                let frame = effect_to_frame(e, start_cs, end_cs, path)?;

                let tick = ((start_cs * 10) / u64::from(step_time_ms)) as u32;
                let channel = channels.get_or_insert(unit, circuit)?;
                channel.set(tick, frame)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::MalformedData {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(channels)
}

/// Translates one `<effect>` element into a `Frame`.
fn effect_to_frame(e: &BytesStart, start_cs: u64, end_cs: u64, path: &Path) -> Result<Frame> {
    let Some(effect_type) = get_attr(e, b"type") else {
        return Err(Error::MalformedData {
            path: path.to_path_buf(),
            reason: "<effect> missing required \"type\" attribute".to_string(),
        });
    };

    match effect_type.to_ascii_lowercase().as_str() {
        "intensity" => {
            if let Some(intensity) = get_attr(e, b"intensity").and_then(|s| s.parse::<u64>().ok()) {
                if intensity >= 100 {
                    Ok(Frame::On)
                } else {
                    Ok(Frame::SetBrightness {
                        level: scale_intensity(intensity),
                    })
                }
            } else if let (Some(start_i), Some(end_i)) = (
                get_attr(e, b"startIntensity").and_then(|s| s.parse::<u64>().ok()),
                get_attr(e, b"endIntensity").and_then(|s| s.parse::<u64>().ok()),
            ) {
                let tenths_of_second = (end_cs.saturating_sub(start_cs)) / 10;
                Ok(Frame::Fade {
                    from: scale_intensity(start_i),
                    to: scale_intensity(end_i),
                    duration_half_seconds: duration_to_half_seconds(tenths_of_second as u32),
                })
            } else {
                Err(Error::MalformedData {
                    path: path.to_path_buf(),
                    reason: "intensity effect has neither \"intensity\" nor \"startIntensity\"/\"endIntensity\"".to_string(),
                })
            }
        }
        "shimmer" => Ok(Frame::Shimmer),
        "twinkle" => Ok(Frame::Twinkle),
        other => Err(Error::UnsupportedData {
            path: path.to_path_buf(),
            reason: format!("unsupported effect type {other:?}"),
        }),
    }
}

/// LMS scores use a 0..=100 intensity scale; rescale onto 0..=255 (matching
/// the original's plain truncating cast, not a rounded one).
fn scale_intensity(pct: u64) -> u8 {
    (((pct.min(100)) as f32 / 100.0) * 255.0) as u8
}

/// Resolves the audio file to play for a loaded sequence: the hint if it
/// exists on disk, otherwise `<sequence_path>.wav`.
pub fn resolve_audio_path(sequence_path: &Path, hint: &str) -> PathBuf {
    if !hint.is_empty() {
        let hint_path = PathBuf::from(hint);
        if hint_path.exists() {
            return hint_path;
        }
        // Hints are often authored relative to the sequence file's directory.
        if let Some(parent) = sequence_path.parent() {
            let relative = parent.join(hint);
            if relative.exists() {
                return relative;
            }
        }
    }

    let mut fallback = sequence_path.as_os_str().to_owned();
    fallback.push(".wav");
    PathBuf::from(fallback)
}
