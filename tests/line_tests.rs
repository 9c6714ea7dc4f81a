use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::TimeZone;
use linelog::config::{set_err_call_site, CallSite};
use linelog::{Format, Logger};
use serde::Serialize;

/// Sink that collects everything written to it, shared with the test body.
#[derive(Clone)]
struct CollectingSink {
    data: Arc<Mutex<Vec<u8>>>,
}

impl CollectingSink {
    fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn contents(&self) -> String {
        String::from_utf8(self.data.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CollectingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Splits one captured JSON line into the `"time":<n>` head and the rest.
fn split_time(line: &str) -> (i64, String) {
    let rest = line.strip_prefix("{\"time\":").expect("JSON line must start with time");
    let comma = rest.find(',').expect("time must be followed by fields");
    let micros: i64 = rest[..comma].parse().expect("time must be an integer");
    (micros, rest[comma..].to_string())
}

#[test]
fn test_json_end_to_end() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record()
        .str("name", "user")
        .int("age", 30)
        .bool("married", true)
        .msg("hello")
        .unwrap();

    let line = sink.contents();
    assert!(line.ends_with('\n'));
    let (micros, rest) = split_time(line.trim_end());
    assert!(micros > 0);
    assert_eq!(
        rest,
        ", \"name\":\"user\", \"age\":30, \"married\":true, \"msg\":\"hello\"}"
    );

    let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(parsed["name"], "user");
    assert_eq!(parsed["age"], 30);
    assert_eq!(parsed["married"], true);
    assert_eq!(parsed["msg"], "hello");
}

#[test]
fn test_text_end_to_end_plain_print() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Text);
    let child = log
        .with()
        .str("name", "user")
        .int("age", 30)
        .bool("married", true)
        .logger();
    child.print("hello").unwrap();

    let line = sink.contents();
    assert!(line.ends_with('\n'));
    // "YYYY/MM/DD HH:MM:SS " prefix is 20 bytes.
    let (stamp, rest) = line.split_at(20);
    assert_eq!(stamp.as_bytes()[4], b'/');
    assert_eq!(stamp.as_bytes()[13], b':');
    assert_eq!(stamp.as_bytes()[19], b' ');
    assert_eq!(rest, "name=\"user\", age=30, married=true, hello\n");
}

#[test]
fn test_text_builder_msg_is_keyed() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Text);
    log.start_record().str("name", "user").msg("hello").unwrap();

    let line = sink.contents();
    assert!(line.trim_end().ends_with("name=\"user\", msg=\"hello\""));
}

#[test]
fn test_msgf_renders_format_arguments() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record()
        .str("user", "alice")
        .msgf(format_args!("retry {} of {}", 2, 5))
        .unwrap();

    let line = sink.contents();
    let (_, rest) = split_time(line.trim_end());
    assert_eq!(rest, ", \"user\":\"alice\", \"msg\":\"retry 2 of 5\"}");
}

#[test]
fn test_no_context_text_line_has_no_separator() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Text);
    log.print("bare").unwrap();

    let line = sink.contents();
    assert!(line.ends_with(" bare\n"));
    assert!(!line.contains(", bare"));
}

#[test]
fn test_arrays_and_empty_arrays() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    let empty: [i32; 0] = [];
    log.start_record()
        .ints("nums", &[30, 10, 20])
        .uints("sizes", &[1u16, 2, 3])
        .strs("names", &["a", "b"])
        .bools("flags", &[true, false])
        .floats64("ratio", &[1.5, 2.5])
        .ints("none", &empty)
        .msg("arrays")
        .unwrap();

    let line = sink.contents();
    assert!(line.contains("\"nums\":[30, 10, 20]"));
    assert!(line.contains("\"sizes\":[1, 2, 3]"));
    assert!(line.contains("\"names\":[\"a\", \"b\"]"));
    assert!(line.contains("\"flags\":[true, false]"));
    assert!(line.contains("\"ratio\":[1.5, 2.5]"));
    assert!(line.contains("\"none\":[]"));

    let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(parsed["none"], serde_json::json!([]));
    assert_eq!(parsed["nums"], serde_json::json!([30, 10, 20]));
}

#[test]
fn test_float_specials_json_are_null() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record()
        .float64("nan", f64::NAN)
        .float64("pinf", f64::INFINITY)
        .float32("ninf", f32::NEG_INFINITY)
        .floats64("all", &[f64::NAN, f64::NEG_INFINITY, f64::INFINITY])
        .msg("specials")
        .unwrap();

    let line = sink.contents();
    assert!(line.contains("\"nan\":null"));
    assert!(line.contains("\"pinf\":null"));
    assert!(line.contains("\"ninf\":null"));
    assert!(line.contains("\"all\":[null, null, null]"));
    // Still a valid JSON document.
    serde_json::from_str::<serde_json::Value>(line.trim_end()).unwrap();
}

#[test]
fn test_float_specials_text_tokens() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Text);
    log.start_record()
        .float64("nan", f64::NAN)
        .float64("pinf", f64::INFINITY)
        .float64("ninf", f64::NEG_INFINITY)
        .finish()
        .unwrap();

    let line = sink.contents();
    assert!(line.contains("nan='NaN'"));
    assert!(line.contains("pinf='\u{221e}'"));
    assert!(line.contains("ninf='-\u{221e}'"));
}

#[test]
fn test_finite_floats_round_trip() {
    let doubles = [0.1, -2.5e-10, 1234567.875, f64::MIN_POSITIVE, -0.0, 3.141592653589793];
    for v in doubles {
        let sink = CollectingSink::new();
        let log = Logger::new(sink.clone(), Format::Json);
        log.start_record().float64("f", v).msg("rt").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(sink.contents().trim_end()).unwrap();
        let back = parsed["f"].as_f64().unwrap();
        assert_eq!(back, v, "f64 {} did not round trip", v);
    }

    let singles = [0.1f32, 16_777_216.0, -1.5e-7, f32::MIN_POSITIVE];
    for v in singles {
        let sink = CollectingSink::new();
        let log = Logger::new(sink.clone(), Format::Json);
        log.start_record().float32("f", v).msg("rt").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(sink.contents().trim_end()).unwrap();
        let back = parsed["f"].as_f64().unwrap() as f32;
        assert_eq!(back, v, "f32 {} did not round trip", v);
    }
}

#[test]
fn test_time_and_duration_fields() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    let when = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    log.start_record()
        .time("at", &when)
        .dur("took", Duration::from_secs(2))
        .msg("timed")
        .unwrap();

    let line = sink.contents();
    assert!(line.contains("\"at\":\"2024/01/02 03:04:05\""));
    assert!(line.contains("\"took\":\"2000000000\""));
    serde_json::from_str::<serde_json::Value>(line.trim_end()).unwrap();

    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Text);
    log.start_record()
        .time("at", &when)
        .dur("took", Duration::from_millis(150))
        .finish()
        .unwrap();
    let line = sink.contents();
    assert!(line.contains("at=2024/01/02 03:04:05"));
    assert!(line.contains("took=\"150ms\""));
}

#[test]
fn test_err_field_behaviors() {
    // Absent error: no key at all.
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record()
        .err(None::<&io::Error>)
        .msg("clean")
        .unwrap();
    assert!(!sink.contents().contains("err"));

    // Present error renders its message.
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    let failure = io::Error::new(io::ErrorKind::Other, "disk on fire");
    log.start_record().err(Some(&failure)).msg("boom").unwrap();
    let line = sink.contents();
    assert!(line.contains("\"err\":\"disk on fire\""));
    assert!(!line.contains("errLoggedFrom"));

    // With call-site capture enabled the location of this file follows.
    set_err_call_site(CallSite {
        print_for_err: true,
        depth: 1,
    });
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record().err(Some(&failure)).msg("boom").unwrap();
    set_err_call_site(CallSite::default());
    let line = sink.contents();
    assert!(line.contains("\"errLoggedFrom\":"));
    assert!(line.contains("line_tests.rs"));
}

#[derive(Serialize)]
struct Payload {
    id: u32,
    tag: String,
}

#[test]
fn test_value_embeds_escaped_json_string() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    let payload = Payload {
        id: 7,
        tag: String::from("x"),
    };
    log.start_record().value("obj", &payload).msg("v").unwrap();

    let line = sink.contents();
    assert!(line.contains("\"obj\":\"{\\\"id\\\":7,\\\"tag\\\":\\\"x\\\"}\""));

    // The embedded string parses back to the original document.
    let parsed: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    let inner: serde_json::Value = serde_json::from_str(parsed["obj"].as_str().unwrap()).unwrap();
    assert_eq!(inner["id"], 7);
}

#[test]
fn test_type_of_field() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record().type_of("kind", &7u32).msg("t").unwrap();
    assert!(sink.contents().contains("\"kind\":\"u32\""));
}

#[test]
fn test_repeated_keys_both_appear() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record()
        .int("k", 1)
        .int("k", 2)
        .msg("dup")
        .unwrap();
    let line = sink.contents();
    assert!(line.contains("\"k\":1"));
    assert!(line.contains("\"k\":2"));
}

#[test]
fn test_bytes_field_escapes_invalid_utf8() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record()
        .bytes("raw", b"ab\xffcd")
        .msg("b")
        .unwrap();
    let line = sink.contents();
    assert!(line.contains("\"raw\":\"ab\\ufffdcd\""));
    serde_json::from_str::<serde_json::Value>(line.trim_end()).unwrap();
}

#[test]
fn test_zero_field_finish_writes_nothing() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    log.start_record().finish().unwrap();
    assert!(sink.contents().is_empty());
}

#[test]
fn test_dropped_line_writes_nothing() {
    let sink = CollectingSink::new();
    let log = Logger::new(sink.clone(), Format::Json);
    drop(log.start_record().str("a", "b"));
    assert!(sink.contents().is_empty());
}
