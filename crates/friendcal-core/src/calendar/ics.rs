//! RFC 5545 rendering.

use icalendar::{Calendar, Component, Property, ValueType};

use super::{BirthdayCalendar, CalendarEvent, CalendarMetadata};

pub(super) fn render(calendar: &BirthdayCalendar) -> String {
    let stamp = calendar.stamp.format("%Y%m%dT%H%M%SZ").to_string();
    let mut cal = Calendar::new();

    for event in &calendar.events {
        cal.push(build_event(event, &stamp));
    }

    let cal = cal.done();
    rewrite_header(&cal.to_string(), &calendar.metadata)
}

fn build_event(event: &CalendarEvent, stamp: &str) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);
    ics_event.summary(&event.title);
    ics_event.description(&event.description);
    ics_event.add_property("DTSTAMP", stamp);

    let mut start = Property::new("DTSTART", event.start.format("%Y%m%d").to_string());
    start.append_parameter(ValueType::Date);
    ics_event.append_property(start);

    ics_event.add_property("DURATION", "P1D");
    ics_event.add_property("RRULE", "FREQ=YEARLY");
    ics_event.add_property("URL", &event.link);
    ics_event.done()
}

/// Replaces the library's calendar header with ours and drops blank lines.
///
/// Header lines follow `PRODID` in a fixed order; any `CALSCALE` or
/// `METHOD` the library emitted elsewhere is removed so each appears once.
fn rewrite_header(ics: &str, metadata: &CalendarMetadata) -> String {
    let mut result = String::with_capacity(ics.len() + 256);
    let mut in_component = false;

    for line in ics.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("BEGIN:") && line != "BEGIN:VCALENDAR" {
            in_component = true;
        } else if line.starts_with("END:") && line != "END:VCALENDAR" {
            in_component = false;
        }

        if !in_component {
            if line.starts_with("PRODID:") {
                push_folded(&mut result, &format!("PRODID:{}", metadata.product_id));
                push_line(&mut result, "CALSCALE:GREGORIAN");
                push_line(&mut result, "METHOD:PUBLISH");
                push_folded(&mut result, &format!("X-WR-CALNAME:{}", metadata.name));
                push_folded(
                    &mut result,
                    &format!("X-PUBLISHED-TTL:{}", metadata.published_ttl),
                );
                push_folded(
                    &mut result,
                    &format!("X-ORIGINAL-URL:{}", metadata.original_url),
                );
                continue;
            }
            if line.starts_with("CALSCALE:") || line.starts_with("METHOD:") {
                continue;
            }
        }

        push_line(&mut result, line);
    }

    result
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}

/// Octet limit of one content line, excluding the line break.
const MAX_LINE_OCTETS: usize = 75;

/// Pushes `line` folded into 75-octet pieces, continuation lines starting
/// with a single space. Never splits a UTF-8 sequence.
fn push_folded(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MAX_LINE_OCTETS;
    while rest.len() > limit {
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        push_line(out, &rest[..cut]);
        out.push(' ');
        rest = &rest[cut..];
        limit = MAX_LINE_OCTETS - 1;
    }
    push_line(out, rest);
}
