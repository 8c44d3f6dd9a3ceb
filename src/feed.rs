//! Update producers: a line-oriented text feed and a synthetic demo.
//!
//! Both run on their own thread and only ever send [`Update`]s; drawing stays
//! on the render thread. Each wait is bounded by [`POLL_INTERVAL`] so the
//! shutdown flag is noticed promptly without signals.
//!
//! # Line Format
//!
//! One command per line, whitespace separated, `#` starts a comment. Numbers
//! must be finite; times, satellite counts and DOP values must be in range.
//!
//! | Command | Arguments | Update |
//! |---------|-----------|--------|
//! | `dir` | heading magnetic | [`Update::Direction`] |
//! | `trk` | track magnetic | [`Update::Track`] |
//! | `crs` | course deviation_m | [`Update::Course`] |
//! | `dev` | deviation_m | [`Update::Deviation`] |
//! | `alt` | feet | [`Update::Altitude`] |
//! | `exp` | feet | [`Update::ExpectedAltitude`] |
//! | `spd` | km/h | [`Update::Speed`] |
//! | `fix` | none, 2d, 3d, gps, unknown | [`Update::FixMode`] |
//! | `sat` | active in_view | [`Update::Satellites`] |
//! | `dop` | pdop hdop vdop | [`Update::Dilution`] |
//! | `hdop` | hdop | [`Update::HorizontalDilution`] |
//! | `utc` | hour minute second | [`Update::Time`] |
//! | `date` | day month year | [`Update::Date`] |
//! | `pos` | latitude longitude | [`Update::Position`] |

use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::POLL_INTERVAL;
use crate::error::FeedError;
use crate::geometry::normalize_degrees;
use crate::readout::NavStatus;
use crate::render::Update;
use crate::telemetry::{Date, Dilution, FixMode, Position, UtcTime};

// =============================================================================
// Parsing
// =============================================================================

/// Most satellites a receiver reports, active or in view.
const MAX_SATELLITES: u8 = 99;

/// Dilution of precision values accepted from the feed.
const DOP_RANGE: core::ops::Range<f64> = 0.0..100.0;

fn numbers<const N: usize>(
    command: &str,
    args: &[&str],
) -> Result<[f64; N], FeedError> {
    if args.len() != N {
        return Err(FeedError::Arity {
            command: command.to_string(),
            expected: N,
            found: args.len(),
        });
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        let value: f64 = arg.parse().map_err(|_| FeedError::InvalidNumber((*arg).to_string()))?;
        if !value.is_finite() {
            return Err(out_of_range(command, arg));
        }
        *slot = value;
    }
    Ok(out)
}

fn out_of_range(
    command: &str,
    value: &str,
) -> FeedError {
    FeedError::OutOfRange {
        command: command.to_string(),
        value: value.to_string(),
    }
}

/// `value` if it lies in `range`; `arg` is the text it was parsed from.
fn within(
    command: &str,
    arg: &str,
    value: f64,
    range: core::ops::Range<f64>,
) -> Result<f64, FeedError> {
    if range.contains(&value) { Ok(value) } else { Err(out_of_range(command, arg)) }
}

fn count(arg: &str) -> Result<u8, FeedError> { arg.parse().map_err(|_| FeedError::InvalidNumber(arg.to_string())) }

fn fix_mode(arg: &str) -> Result<FixMode, FeedError> {
    match arg.to_ascii_lowercase().as_str() {
        "none" => Ok(FixMode::NoFix),
        "2d" => Ok(FixMode::Fix2D),
        "3d" => Ok(FixMode::Fix3D),
        "gps" => Ok(FixMode::GpsFix),
        "unknown" => Ok(FixMode::Unknown),
        _ => Err(FeedError::UnknownFixMode(arg.to_string())),
    }
}

/// Parse one feed line. Blank lines and comments give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Update>, FeedError> {
    let line = line.split('#').next().unwrap_or_default();
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let update = match command {
        "dir" => {
            let [heading, magnetic] = numbers(command, &args)?;
            Update::Direction { heading, magnetic }
        }
        "trk" => {
            let [true_track, magnetic] = numbers(command, &args)?;
            Update::Track { true_track, magnetic }
        }
        "crs" => {
            let [course, deviation] = numbers(command, &args)?;
            Update::Course { course, deviation }
        }
        "dev" => {
            let [deviation] = numbers(command, &args)?;
            Update::Deviation(deviation)
        }
        "alt" => {
            let [feet] = numbers(command, &args)?;
            Update::Altitude(feet)
        }
        "exp" => {
            let [feet] = numbers(command, &args)?;
            Update::ExpectedAltitude(feet)
        }
        "spd" => {
            let [kmh] = numbers(command, &args)?;
            Update::Speed(kmh)
        }
        "fix" => match args.as_slice() {
            [mode] => Update::FixMode(fix_mode(mode)?),
            _ => {
                return Err(FeedError::Arity {
                    command: command.to_string(),
                    expected: 1,
                    found: args.len(),
                });
            }
        },
        "sat" => match args.as_slice() {
            [active, in_view] => {
                let (active_count, in_view_count) = (count(active)?, count(in_view)?);
                if active_count > MAX_SATELLITES {
                    return Err(out_of_range(command, active));
                }
                if in_view_count > MAX_SATELLITES {
                    return Err(out_of_range(command, in_view));
                }
                Update::Satellites {
                    active: active_count,
                    in_view: in_view_count,
                }
            }
            _ => {
                return Err(FeedError::Arity {
                    command: command.to_string(),
                    expected: 2,
                    found: args.len(),
                });
            }
        },
        "dop" => {
            let [position, horizontal, vertical] = numbers(command, &args)?;
            Update::Dilution(Dilution {
                position: within(command, args[0], position, DOP_RANGE)? as f32,
                horizontal: within(command, args[1], horizontal, DOP_RANGE)? as f32,
                vertical: within(command, args[2], vertical, DOP_RANGE)? as f32,
            })
        }
        "hdop" => {
            let [horizontal] = numbers(command, &args)?;
            Update::HorizontalDilution(within(command, args[0], horizontal, DOP_RANGE)? as f32)
        }
        "utc" => {
            let [hour, minute, second] = numbers(command, &args)?;
            let hour = within(command, args[0], hour, 0.0..24.0)?;
            let minute = within(command, args[1], minute, 0.0..60.0)?;
            // Leap second
            let second = within(command, args[2], second, 0.0..61.0)?;
            Update::Time(UtcTime {
                hour: hour as u8,
                minute: minute as u8,
                second: second as f32,
            })
        }
        "date" => {
            let [day, month, year] = numbers(command, &args)?;
            Update::Date(Date {
                day: within(command, args[0], day, 1.0..32.0)? as u8,
                month: within(command, args[1], month, 1.0..13.0)? as u8,
                year: within(command, args[2], year, 0.0..10_000.0)? as u16,
            })
        }
        "pos" => {
            let [latitude, longitude] = numbers(command, &args)?;
            Update::Position(Position { latitude, longitude })
        }
        _ => return Err(FeedError::UnknownCommand(command.to_string())),
    };
    Ok(Some(update))
}

/// Parse and forward one line. Returns `false` once the receiver is gone.
fn dispatch(
    line: &str,
    updates: &Sender<Update>,
) -> bool {
    match parse_line(line) {
        Ok(Some(update)) => updates.send(update).is_ok(),
        Ok(None) => true,
        Err(err) => {
            log::warn!("Ignoring feed line {:?}: {err}", line.trim());
            true
        }
    }
}

// =============================================================================
// Reader Feed
// =============================================================================

/// Longest accepted feed line in bytes, newline included.
const MAX_LINE_LEN: usize = 256;

/// Wait up to `timeout` for `fd` to become readable (or hit end of input).
fn wait_readable(
    fd: RawFd,
    timeout: Duration,
) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
    // SAFETY: `pfd` is a valid pollfd for the whole call and the count is 1.
    let rc = unsafe { libc::poll(&raw mut pfd, 1, ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(rc > 0)
}

fn run_reader<R: Read + AsRawFd>(
    reader: &mut R,
    updates: &Sender<Update>,
    shutdown: &AtomicBool,
) {
    let mut pending: Vec<u8> = Vec::with_capacity(MAX_LINE_LEN);
    let mut chunk = [0u8; 512];
    // Inside an oversize line, skipping to the next newline
    let mut discarding = false;
    while !shutdown.load(Ordering::Relaxed) {
        match wait_readable(reader.as_raw_fd(), POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                log::error!("Feed poll failed: {err}");
                return;
            }
        }
        let n = match reader.read(&mut chunk) {
            Ok(0) => {
                log::info!("Feed reached end of input");
                break;
            }
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                log::error!("Feed read failed: {err}");
                return;
            }
        };
        for piece in chunk[..n].split_inclusive(|&b| b == b'\n') {
            let complete = piece.last() == Some(&b'\n');
            if discarding {
                discarding = !complete;
                continue;
            }
            pending.extend_from_slice(piece);
            if pending.len() > MAX_LINE_LEN {
                log::warn!("Dropping feed line longer than {MAX_LINE_LEN} bytes");
                pending.clear();
                discarding = !complete;
                continue;
            }
            if complete {
                let line = String::from_utf8_lossy(&pending).into_owned();
                pending.clear();
                if !dispatch(&line, updates) {
                    return;
                }
            }
        }
    }
    // Last line without a newline
    if !pending.is_empty() {
        dispatch(&String::from_utf8_lossy(&pending), updates);
    }
}

/// Read feed lines from `reader` on a new thread until end of input, until
/// the receiver is dropped, or until `shutdown` is set.
///
/// `reader` must be unbuffered: readiness is polled on its descriptor.
pub fn spawn_reader_feed<R>(
    mut reader: R,
    updates: Sender<Update>,
    shutdown: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    R: Read + AsRawFd + Send + 'static,
{
    thread::Builder::new()
        .name("feed-reader".into())
        .spawn(move || run_reader(&mut reader, &updates, &shutdown))
}

// =============================================================================
// Demo Feed
// =============================================================================

/// Period between two demo steps.
pub const DEMO_PERIOD: Duration = Duration::from_millis(100);

/// Distance of the demo route, in km.
const DEMO_ROUTE_KM: f64 = 120.0;

/// Sinusoid between `min` and `max`.
fn fake_signal(
    t: f64,
    min: f64,
    max: f64,
    freq: f64,
) -> f64 {
    let normalized = (t * freq).sin().mul_add(0.5, 0.5);
    min + normalized * (max - min)
}

/// Updates for one step of the demo flight: a slow turn with the needle
/// swinging across the scale while climbing and descending around the
/// expected altitude.
pub fn demo_updates(step: u32) -> Vec<Update> {
    let t = f64::from(step) * 0.1;
    let heading = normalize_degrees(f64::from(step) * 1.5);
    let speed = fake_signal(t, 150.0, 220.0, 0.5);
    let flown = (f64::from(step) * speed / 36_000.0).min(DEMO_ROUTE_KM);
    let remaining = DEMO_ROUTE_KM - flown;
    let leg = remaining % 40.0;

    let mut updates = Vec::with_capacity(16);
    if step == 0 {
        updates.push(Update::FixMode(FixMode::Fix3D));
        updates.push(Update::Satellites { active: 7, in_view: 11 });
        updates.push(Update::Dilution(Dilution {
            position: 1.8,
            horizontal: 1.1,
            vertical: 1.4,
        }));
        updates.push(Update::NavStatus {
            status: NavStatus::ToWaypoint,
            waypoint: "DEMO1".into(),
        });
        updates.push(Update::ExpectedAltitude(1200.0));
        updates.push(Update::Date(Date {
            day: 18,
            month: 10,
            year: 26,
        }));
    }
    updates.push(Update::Direction {
        heading,
        magnetic: normalize_degrees(heading - 2.5),
    });
    updates.push(Update::Course {
        course: 90.0,
        deviation: fake_signal(t, -600.0, 600.0, 0.3).round(),
    });
    updates.push(Update::Altitude(fake_signal(t, 800.0, 1600.0, 0.2)));
    updates.push(Update::Speed(speed.round()));
    updates.push(Update::Position(Position {
        latitude: 45.5 + flown / 111.0,
        longitude: 9.25,
    }));
    let seconds = 12 * 3600 + step / 10;
    updates.push(Update::Time(UtcTime {
        hour: (seconds / 3600 % 24) as u8,
        minute: (seconds / 60 % 60) as u8,
        second: (seconds % 60) as f32,
    }));
    updates.push(Update::NavLeg {
        distance_km: leg,
        avg_kmh: speed,
        hours: leg / speed,
    });
    updates.push(Update::NavAlongTrack(flown / crate::units::EARTH_RADIUS_KM));
    updates.push(Update::NavTotals {
        distance_km: remaining,
        avg_kmh: speed,
        hours: remaining / speed,
    });
    updates
}

/// Send the demo on a new thread, one step every `period`. Runs `frames`
/// steps, or until `shutdown` or the receiver goes away when `None`.
pub fn spawn_demo_feed(
    updates: Sender<Update>,
    shutdown: Arc<AtomicBool>,
    period: Duration,
    frames: Option<u32>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("feed-demo".into()).spawn(move || {
        let mut step = 0;
        while !shutdown.load(Ordering::Relaxed) && frames.is_none_or(|n| step < n) {
            for update in demo_updates(step) {
                if updates.send(update).is_err() {
                    return;
                }
            }
            step += 1;
            thread::sleep(period);
        }
        log::info!("Demo feed stopped after {step} steps");
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_parse_commands() {
        let cases = [
            ("dir 90 88.5", Update::Direction { heading: 90.0, magnetic: 88.5 }),
            ("crs 45 -120", Update::Course { course: 45.0, deviation: -120.0 }),
            ("alt 1500.5", Update::Altitude(1500.5)),
            ("exp 2000", Update::ExpectedAltitude(2000.0)),
            ("spd 180", Update::Speed(180.0)),
            ("fix 3D", Update::FixMode(FixMode::Fix3D)),
            ("fix none", Update::FixMode(FixMode::NoFix)),
            ("sat 4 12", Update::Satellites { active: 4, in_view: 12 }),
            ("hdop 0.9", Update::HorizontalDilution(0.9)),
            ("  trk 10 8   # comment", Update::Track { true_track: 10.0, magnetic: 8.0 }),
        ];
        for (line, expected) in cases {
            assert_eq!(parse_line(line), Ok(Some(expected)), "{line}");
        }
    }

    #[test]
    fn test_parse_blank_and_comment() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   \n"), Ok(None));
        assert_eq!(parse_line("# dir 1 2"), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_line("warp 9"), Err(FeedError::UnknownCommand("warp".into())));
        assert_eq!(
            parse_line("dir 90"),
            Err(FeedError::Arity {
                command: "dir".into(),
                expected: 2,
                found: 1,
            })
        );
        assert_eq!(parse_line("alt high"), Err(FeedError::InvalidNumber("high".into())));
        assert_eq!(parse_line("sat 300 2"), Err(FeedError::InvalidNumber("300".into())));
        assert_eq!(parse_line("fix 4d"), Err(FeedError::UnknownFixMode("4d".into())));
    }

    fn out_of_range(
        command: &str,
        value: &str,
    ) -> Result<Option<Update>, FeedError> {
        Err(FeedError::OutOfRange {
            command: command.into(),
            value: value.into(),
        })
    }

    #[test]
    fn test_parse_rejects_non_finite_numbers() {
        assert_eq!(parse_line("alt inf"), out_of_range("alt", "inf"));
        assert_eq!(parse_line("exp -inf"), out_of_range("exp", "-inf"));
        assert_eq!(parse_line("dir NaN 0"), out_of_range("dir", "NaN"));
        assert_eq!(parse_line("dev 1e400"), out_of_range("dev", "1e400"));
        assert_eq!(parse_line("pos 45.5 infinity"), out_of_range("pos", "infinity"));
    }

    #[test]
    fn test_parse_time_range() {
        assert_eq!(parse_line("utc 300 -5 nan"), out_of_range("utc", "nan"));
        assert_eq!(parse_line("utc 24 0 0"), out_of_range("utc", "24"));
        assert_eq!(parse_line("utc 12 -1 0"), out_of_range("utc", "-1"));
        assert_eq!(parse_line("utc 12 60 0"), out_of_range("utc", "60"));
        assert_eq!(parse_line("utc 12 0 61"), out_of_range("utc", "61"));
        assert_eq!(
            parse_line("utc 23 59 60.5"),
            Ok(Some(Update::Time(UtcTime {
                hour: 23,
                minute: 59,
                second: 60.5,
            })))
        );
    }

    #[test]
    fn test_parse_counts_and_dilution_range() {
        assert_eq!(parse_line("sat 4 120"), out_of_range("sat", "120"));
        assert_eq!(parse_line("sat 100 4"), out_of_range("sat", "100"));
        assert_eq!(parse_line("dop 1 -1 1"), out_of_range("dop", "-1"));
        assert_eq!(parse_line("hdop 100"), out_of_range("hdop", "100"));
        assert_eq!(parse_line("sat 12 12"), Ok(Some(Update::Satellites { active: 12, in_view: 12 })));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_line("date 18 10 26"),
            Ok(Some(Update::Date(Date {
                day: 18,
                month: 10,
                year: 26,
            })))
        );
        assert_eq!(parse_line("date 32 1 26"), out_of_range("date", "32"));
        assert_eq!(parse_line("date 1 13 26"), out_of_range("date", "13"));
        assert_eq!(parse_line("date 0 1 26"), out_of_range("date", "0"));
    }

    #[test]
    fn test_reader_feed_drops_oversize_line() {
        let mut file = tempfile::tempfile().unwrap();
        let junk = "x".repeat(3 * MAX_LINE_LEN);
        write!(file, "spd 90\n{junk}\nalt 1200\n{junk}").unwrap();
        io::Seek::rewind(&mut file).unwrap();

        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        spawn_reader_feed(file, tx, shutdown).unwrap().join().unwrap();

        let received: Vec<Update> = rx.try_iter().collect();
        assert_eq!(received, vec![Update::Speed(90.0), Update::Altitude(1200.0)]);
    }

    #[test]
    fn test_reader_feed_forwards_valid_lines() {
        let mut file = tempfile::tempfile().unwrap();
        write!(file, "dir 10 9\nbogus\n\nalt 1200\nspd 90").unwrap();
        io::Seek::rewind(&mut file).unwrap();

        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        spawn_reader_feed(file, tx, shutdown).unwrap().join().unwrap();

        let received: Vec<Update> = rx.try_iter().collect();
        assert_eq!(
            received,
            vec![
                Update::Direction { heading: 10.0, magnetic: 9.0 },
                Update::Altitude(1200.0),
                Update::Speed(90.0),
            ]
        );
    }

    #[test]
    fn test_reader_feed_stops_on_shutdown() {
        let (reader, _writer) = std::os::unix::net::UnixStream::pair().unwrap();
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let handle = spawn_reader_feed(reader, tx, Arc::clone(&shutdown)).unwrap();
        thread::sleep(POLL_INTERVAL);
        shutdown.store(true, Ordering::Relaxed);
        handle.join().unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_demo_first_step_sets_the_scene() {
        let updates = demo_updates(0);
        assert!(updates.contains(&Update::FixMode(FixMode::Fix3D)));
        assert!(updates.iter().any(|u| matches!(u, Update::Direction { heading, .. } if *heading == 0.0)));
        assert!(!demo_updates(1).iter().any(|u| matches!(u, Update::FixMode(_))));
    }

    #[test]
    fn test_demo_values_stay_in_range() {
        for step in (0..5000).step_by(7) {
            for update in demo_updates(step) {
                match update {
                    Update::Direction { heading, magnetic } => {
                        assert!((0.0..360.0).contains(&heading));
                        assert!((0.0..360.0).contains(&magnetic));
                    }
                    Update::Course { deviation, .. } => assert!(deviation.abs() <= 600.0),
                    Update::NavTotals { distance_km, .. } => assert!(distance_km >= 0.0),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_demo_feed_runs_requested_frames() {
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        spawn_demo_feed(tx, shutdown, Duration::ZERO, Some(3)).unwrap().join().unwrap();
        let expected: usize = (0..3).map(|step| demo_updates(step).len()).sum();
        assert_eq!(rx.try_iter().count(), expected);
    }
}
