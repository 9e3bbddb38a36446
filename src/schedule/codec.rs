//! Store key/value encoding for schedule slots and message records.
//!
//! Two key families share one keyspace:
//!
//! ```text
//! {hour}:{minute}/{weekday}/{chat}  =  name1/noisy1,name2/noisy2,...
//! {name}/{chat}                     =  message body
//! ```
//!
//! Hour and minute are intentionally NOT zero-padded (`"9:5"`, never
//! `"09:05"`) — existing databases were written that way and the format
//! is kept byte-compatible. Slot keys start hour-first so that "events
//! due this minute" is a contiguous prefix range.
//!
//! Decoding is tolerant: malformed stored fragments are skipped, never a
//! panic, so a newer writer can't brick an older reader.

use crate::error::{ReminderError, Result};
use crate::schedule::{EventEntry, ScheduleKey};

/// Separator between key fields and between a pair's name and period.
pub const FIELD_SEPARATOR: char = '/';

/// Separator between pairs inside a slot entry.
const PAIR_SEPARATOR: char = ',';

/// Encode a slot key: `"{hour}:{minute}/{weekday}/{chat}"`.
pub fn encode_key(key: &ScheduleKey) -> String {
    format!(
        "{}:{}/{}/{}",
        key.hour, key.minute, key.weekday, key.chat_id
    )
}

/// Decode a slot key, `None` when the string is not a well-formed slot.
///
/// Message-record keys (`"{name}/{chat}"`) fail the time-field parse and
/// come back as `None`, which is how full-store scans tell the two key
/// families apart.
pub fn decode_key(raw: &str) -> Option<ScheduleKey> {
    let mut fields = raw.split(FIELD_SEPARATOR);
    let time = fields.next()?;
    let weekday: u8 = fields.next()?.parse().ok()?;
    let chat_id: i64 = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }

    let (hour_raw, minute_raw) = time.split_once(':')?;
    let hour: u32 = hour_raw.parse().ok()?;
    let minute: u32 = minute_raw.parse().ok()?;
    if hour > 23 || minute > 59 || weekday > 7 {
        return None;
    }

    Some(ScheduleKey {
        hour,
        minute,
        weekday,
        chat_id,
    })
}

/// Prefix matching every slot key for one wall-clock minute.
///
/// Includes the trailing field separator: a bare `"9:5"` prefix would
/// also match `"9:55/..."` keys.
pub fn dispatch_prefix(hour: u32, minute: u32) -> String {
    format!("{hour}:{minute}{FIELD_SEPARATOR}")
}

/// Encode a slot entry: pairs as `name/period`, joined by commas.
pub fn encode_entry(entries: &[EventEntry]) -> String {
    let pairs: Vec<String> = entries
        .iter()
        .map(|e| format!("{}{}{}", e.name, FIELD_SEPARATOR, e.noisy))
        .collect();
    pairs.join(",")
}

/// Decode a slot entry, skipping malformed fragments.
///
/// A pair with no `/` gets period 0; a pair with a non-numeric period is
/// dropped.
pub fn decode_entry(raw: &str) -> Vec<EventEntry> {
    let mut entries = Vec::new();
    for pair in raw.split(PAIR_SEPARATOR) {
        if pair.is_empty() {
            continue;
        }
        match pair.split_once(FIELD_SEPARATOR) {
            None => entries.push(EventEntry {
                name: pair.to_owned(),
                noisy: 0,
            }),
            Some((name, period)) => {
                let Ok(noisy) = period.parse() else {
                    continue;
                };
                entries.push(EventEntry {
                    name: name.to_owned(),
                    noisy,
                });
            }
        }
    }
    entries
}

/// Key of the message record for `(name, chat)`: `"{name}/{chat}"`.
pub fn message_key(name: &str, chat_id: i64) -> String {
    format!("{name}{FIELD_SEPARATOR}{chat_id}")
}

/// Parse a 24-hour `HH:MM` time, accepting single-digit fields.
///
/// # Errors
///
/// Returns a user-facing validation error when the string does not parse
/// or a field is out of range.
pub fn parse_hour_minute(raw: &str) -> Result<(u32, u32)> {
    let invalid = || {
        ReminderError::Validation("Hour is not in valid format, use HH:MM (24h)".to_owned())
    };
    let (hour_raw, minute_raw) = raw.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour_raw.trim().parse().map_err(|_| invalid())?;
    let minute: u32 = minute_raw.trim().parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn key_round_trips_for_all_valid_slots() {
        for hour in 0..24 {
            for minute in [0, 5, 9, 30, 59] {
                for weekday in 0..=7 {
                    let key = ScheduleKey {
                        hour,
                        minute,
                        weekday,
                        chat_id: 34515,
                    };
                    assert_eq!(decode_key(&encode_key(&key)), Some(key));
                }
            }
        }
    }

    #[test]
    fn key_encoding_is_not_zero_padded() {
        let key = ScheduleKey {
            hour: 9,
            minute: 5,
            weekday: 0,
            chat_id: 42,
        };
        assert_eq!(encode_key(&key), "9:5/0/42");
    }

    #[test]
    fn negative_chat_ids_survive_the_round_trip() {
        // Telegram group chats have negative IDs.
        let key = ScheduleKey {
            hour: 20,
            minute: 45,
            weekday: 3,
            chat_id: -1001234,
        };
        assert_eq!(decode_key("20:45/3/-1001234"), Some(key));
    }

    #[test]
    fn malformed_keys_decode_to_none() {
        assert_eq!(decode_key("gallines/42"), None); // message record
        assert_eq!(decode_key("9:5/8/42"), None); // weekday out of range
        assert_eq!(decode_key("25:0/0/42"), None);
        assert_eq!(decode_key("9:5/x/42"), None);
        assert_eq!(decode_key("9:5/0/notachat"), None);
        assert_eq!(decode_key("9:5/0/42/extra"), None);
        assert_eq!(decode_key(""), None);
    }

    #[test]
    fn dispatch_prefix_cannot_match_a_longer_minute() {
        assert_eq!(dispatch_prefix(9, 5), "9:5/");
        assert!(!"9:55/0/42".starts_with(&dispatch_prefix(9, 5)));
        assert!("9:5/0/42".starts_with(&dispatch_prefix(9, 5)));
    }

    #[test]
    fn entry_round_trip_preserves_order() {
        let entries = vec![
            EventEntry {
                name: "gallines".to_owned(),
                noisy: 10,
            },
            EventEntry {
                name: "vidre".to_owned(),
                noisy: 0,
            },
        ];
        let raw = encode_entry(&entries);
        assert_eq!(raw, "gallines/10,vidre/0");
        assert_eq!(decode_entry(&raw), entries);
    }

    #[test]
    fn entry_decoding_tolerates_legacy_and_malformed_pairs() {
        // no slash: period defaults to 0
        let entries = decode_entry("gallines");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].noisy, 0);

        // non-numeric period fragments are dropped, the rest survive
        let entries = decode_entry("gallines/abc,vidre/5,,paper");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "vidre");
        assert_eq!(entries[1].name, "paper");
    }

    #[test]
    fn hour_minute_parsing_accepts_single_digits() {
        assert_eq!(parse_hour_minute("20:45").unwrap(), (20, 45));
        assert_eq!(parse_hour_minute("9:5").unwrap(), (9, 5));
        assert!(parse_hour_minute("24:00").is_err());
        assert!(parse_hour_minute("12:60").is_err());
        assert!(parse_hour_minute("noon").is_err());
        assert!(parse_hour_minute("12").is_err());
    }
}
