//! Recorded touch sessions.
//!
//! A trace is plain text, one event per line:
//!
//! ```text
//! # pan right, then pinch out
//! start 100,100
//! move 130,100
//! end
//! start 0,0 100,0
//! move 0,0 200,0
//! end
//! ```
//!
//! `start` and `move` take zero or more `x,y` points; `end` and `reset` take
//! none. Blank lines and `#` comments are skipped.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::gesture::GestureTracker;
use crate::transform::Transform;

/// One touch lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub enum TouchEvent {
    /// Contacts were added; carries every active contact.
    Start(Vec<Point>),
    /// Contacts moved; carries every active contact.
    Move(Vec<Point>),
    /// A contact was lifted.
    End,
    /// The preview was closed and reopened.
    Reset,
}

impl TouchEvent {
    /// Feed this event to a tracker.
    pub fn dispatch(&self, tracker: &mut GestureTracker) {
        match self {
            TouchEvent::Start(points) => tracker.on_start(points),
            TouchEvent::Move(points) => {
                let _ = tracker.on_move(points);
            }
            TouchEvent::End => tracker.on_end(),
            TouchEvent::Reset => tracker.reset(),
        }
    }
}

fn parse_point(token: &str) -> std::result::Result<Point, String> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but found {token:?}"))?;
    let coord = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("bad coordinate {s:?}"))
    };
    Ok(Point::new(coord(x)?, coord(y)?))
}

fn parse_line(line: &str) -> std::result::Result<Option<TouchEvent>, String> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = tokens.collect();

    let points = || {
        rest.iter()
            .map(|t| parse_point(t))
            .collect::<std::result::Result<Vec<_>, _>>()
    };
    let no_args = |event: TouchEvent| {
        if rest.is_empty() {
            Ok(Some(event))
        } else {
            Err(format!("{verb} takes no points"))
        }
    };

    match verb.to_ascii_lowercase().as_str() {
        "start" => Ok(Some(TouchEvent::Start(points()?))),
        "move" => Ok(Some(TouchEvent::Move(points()?))),
        "end" => no_args(TouchEvent::End),
        "reset" => no_args(TouchEvent::Reset),
        other => Err(format!("unknown event {other:?}")),
    }
}

/// A parsed touch session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    /// Events in delivery order.
    pub events: Vec<TouchEvent>,
}

impl Trace {
    /// Run every event through a fresh tracker and return the final transform.
    #[must_use]
    pub fn replay(&self) -> Transform {
        let mut tracker = GestureTracker::new();
        self.replay_into(&mut tracker);
        tracker.transform()
    }

    /// Run every event through an existing tracker, in order.
    pub fn replay_into(&self, tracker: &mut GestureTracker) {
        for event in &self.events {
            event.dispatch(tracker);
        }
    }
}

impl FromStr for Trace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let events = s
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                parse_line(line)
                    .map_err(|message| Error::InvalidTrace {
                        line: idx + 1,
                        message,
                    })
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_all_event_kinds() {
        let trace: Trace = "# header\n\nstart 1,2\nmove 3.5,-4 5,6  # two fingers\nEND\nreset\n"
            .parse()
            .unwrap();
        assert_eq!(
            trace.events,
            vec![
                TouchEvent::Start(vec![Point::new(1.0, 2.0)]),
                TouchEvent::Move(vec![Point::new(3.5, -4.0), Point::new(5.0, 6.0)]),
                TouchEvent::End,
                TouchEvent::Reset,
            ]
        );
    }

    #[test]
    fn reports_line_numbers() {
        let err = "start 1,1\nmove 2;2\n".parse::<Trace>().unwrap_err();
        match err {
            Error::InvalidTrace { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("x,y"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!("tap 1,1".parse::<Trace>().is_err());
        assert!("end 1,1".parse::<Trace>().is_err());
        assert!("move nan,1".parse::<Trace>().is_err());
    }

    #[test]
    fn replay_pans_then_pinches_and_twists() {
        let trace: Trace = "\
start 100,100
move 105,105
move 103,108
end
start 0,0 100,0
move 0,0 0,200
end
"
        .parse()
        .unwrap();
        let t = trace.replay();
        assert_relative_eq!(t.translate_x, 3.0);
        assert_relative_eq!(t.translate_y, 8.0);
        assert_relative_eq!(t.scale, 2.0);
        assert_relative_eq!(t.rotation, 90.0);
    }

    #[test]
    fn empty_start_is_kept_and_ignored_by_tracker() {
        let trace: Trace = "start\nmove 4,4".parse().unwrap();
        assert_eq!(trace.events[0], TouchEvent::Start(Vec::new()));
        assert_eq!(trace.replay(), Transform::IDENTITY);
    }
}
