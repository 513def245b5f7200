//! Background acquisition loop
//!
//! One dedicated thread per connection owns the read/decode/append cycle.
//! The loop polls the shared engine state at every iteration boundary, so a
//! disconnect request is honored within one read-timeout interval and the
//! thread is never force-killed. No lock is held across the transport read.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{lock, EngineEvent, EngineState, Shared};
use crate::datalog::Sample;
use crate::decode::decode_line;
use crate::render::{RenderThrottle, RenderWindow};
use crate::transport::LineTransport;

pub(crate) fn run(
    mut transport: Box<dyn LineTransport>,
    shared: Arc<Shared>,
    events: Sender<EngineEvent>,
) {
    debug!("acquisition loop started");
    let throttle = RenderThrottle::default();

    loop {
        if lock(&shared.session).state == EngineState::Disconnected {
            debug!("acquisition loop observed disconnect request");
            break;
        }
        if !transport.is_open() {
            connection_lost(&shared, &events, "transport closed");
            break;
        }

        let raw = match transport.read_line() {
            Ok(Some(raw)) => raw,
            // Read timeout; go around and re-check state
            Ok(None) => continue,
            Err(e) => {
                connection_lost(&shared, &events, &e.to_string());
                break;
            }
        };

        // Rejected lines are expected noise, not faults
        let Some(value) = decode_line(&raw) else {
            continue;
        };

        // Stamp and append under the session lock so a concurrent
        // start_recording cannot interleave its clear with this append.
        let appended = {
            let session = lock(&shared.session);
            match (session.state, session.started_at) {
                (EngineState::Recording, Some(started_at)) => {
                    let sample = Sample::new(started_at.elapsed().as_secs_f64(), value);
                    let mut buffer = lock(&shared.buffer);
                    buffer.append(sample);
                    Some(buffer.len())
                }
                _ => None,
            }
        };

        if let Some(count) = appended {
            if throttle.is_due(count) {
                let snapshot = lock(&shared.buffer).snapshot();
                if let Some(window) = RenderWindow::fit(&snapshot) {
                    let _ = events.send(EngineEvent::RenderReady { window, snapshot });
                }
            }
        }
    }

    debug!("acquisition loop exited");
}

/// Transition to Disconnected after a transport failure and tell the shell
/// once. Distinguished from a user-requested disconnect so the shell can
/// say "connection lost" instead of "disconnected".
fn connection_lost(shared: &Shared, events: &Sender<EngineEvent>, reason: &str) {
    warn!("connection lost: {reason}");
    let was = {
        let mut session = lock(&shared.session);
        let was = session.state;
        session.state = EngineState::Disconnected;
        session.started_at = None;
        was
    };
    if was != EngineState::Disconnected {
        let _ = events.send(EngineEvent::ConnectionLost);
        let _ = events.send(EngineEvent::StatusChanged("Connection lost".into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::SessionBuffer;
    use crate::transport::TransportError;
    use pretty_assertions::assert_eq;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Mutex;
    use std::time::Instant;

    /// Feeds a fixed script of lines, then fails like an unplugged device
    struct ScriptedTransport {
        lines: std::vec::IntoIter<Vec<u8>>,
    }

    impl ScriptedTransport {
        fn new(lines: &[&[u8]]) -> Box<Self> {
            Box::new(Self {
                lines: lines
                    .iter()
                    .map(|l| l.to_vec())
                    .collect::<Vec<_>>()
                    .into_iter(),
            })
        }
    }

    impl LineTransport for ScriptedTransport {
        fn read_line(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
            match self.lines.next() {
                Some(line) => Ok(Some(line)),
                None => Err(TransportError::Serial("device unplugged".into())),
            }
        }
    }

    fn shared_in(state: EngineState) -> Arc<Shared> {
        let started_at = (state == EngineState::Recording).then(Instant::now);
        Arc::new(Shared {
            session: Mutex::new(super::super::SessionState { state, started_at }),
            buffer: Mutex::new(SessionBuffer::new()),
        })
    }

    fn drain(events: &Receiver<EngineEvent>) -> Vec<EngineEvent> {
        events.try_iter().collect()
    }

    #[test]
    fn test_noise_lines_are_dropped_and_order_kept() {
        let shared = shared_in(EngineState::Recording);
        let (tx, rx) = mpsc::channel();

        run(
            ScriptedTransport::new(&[b"0.12", b"bad", b"0.35"]),
            Arc::clone(&shared),
            tx,
        );

        let samples = lock(&shared.buffer).snapshot();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, 0.12);
        assert_eq!(samples[1].value, 0.35);
        assert!(samples[0].elapsed_secs >= 0.0);
        assert!(samples[0].elapsed_secs <= samples[1].elapsed_secs);
        // The script ends in a transport failure
        assert!(drain(&rx)
            .iter()
            .any(|e| matches!(e, EngineEvent::ConnectionLost)));
    }

    #[test]
    fn test_first_sample_elapsed_is_near_zero() {
        let shared = shared_in(EngineState::Recording);
        let (tx, _rx) = mpsc::channel();

        run(ScriptedTransport::new(&[b"1.0"]), Arc::clone(&shared), tx);

        let samples = lock(&shared.buffer).snapshot();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].elapsed_secs < 1.0);
    }

    #[test]
    fn test_samples_ignored_while_not_recording() {
        let shared = shared_in(EngineState::Connected);
        let (tx, _rx) = mpsc::channel();

        run(
            ScriptedTransport::new(&[b"0.1", b"0.2", b"0.3"]),
            Arc::clone(&shared),
            tx,
        );

        assert!(lock(&shared.buffer).is_empty());
    }

    #[test]
    fn test_render_fires_once_per_ten_appends() {
        let shared = shared_in(EngineState::Recording);
        let (tx, rx) = mpsc::channel();

        let lines: Vec<Vec<u8>> = (0..25).map(|_| b"1.0".to_vec()).collect();
        let refs: Vec<&[u8]> = lines.iter().map(|l| l.as_slice()).collect();
        run(ScriptedTransport::new(&refs), Arc::clone(&shared), tx);

        let renders: Vec<EngineEvent> = drain(&rx)
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::RenderReady { .. }))
            .collect();
        assert_eq!(renders.len(), 2);

        // Flat trace at 1.0 mV hits the padding floor
        if let EngineEvent::RenderReady { window, snapshot } = &renders[0] {
            assert_eq!(snapshot.len(), 10);
            assert_eq!(window.y_min, 0.5);
            assert_eq!(window.y_max, 1.5);
            assert_eq!(window.x_min, 0.0);
            assert_eq!(window.x_max, 10.0);
        }
    }

    #[test]
    fn test_transport_failure_signals_connection_lost_once() {
        let shared = shared_in(EngineState::Recording);
        let (tx, rx) = mpsc::channel();

        run(ScriptedTransport::new(&[]), Arc::clone(&shared), tx);

        assert_eq!(lock(&shared.session).state, EngineState::Disconnected);
        let lost = drain(&rx)
            .iter()
            .filter(|e| matches!(e, EngineEvent::ConnectionLost))
            .count();
        assert_eq!(lost, 1);
    }

    /// Flips the shared state to Disconnected after its first read,
    /// mimicking a user disconnect arriving mid-session
    struct DisconnectingTransport {
        shared: Arc<Shared>,
    }

    impl LineTransport for DisconnectingTransport {
        fn read_line(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
            lock(&self.shared.session).state = EngineState::Disconnected;
            Ok(None)
        }
    }

    #[test]
    fn test_loop_exits_cooperatively_without_lost_event() {
        let shared = shared_in(EngineState::Recording);
        let (tx, rx) = mpsc::channel();

        run(
            Box::new(DisconnectingTransport {
                shared: Arc::clone(&shared),
            }),
            Arc::clone(&shared),
            tx,
        );

        assert!(!drain(&rx)
            .iter()
            .any(|e| matches!(e, EngineEvent::ConnectionLost)));
    }
}
