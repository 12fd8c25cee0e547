//! Scripted bridge for tests and simulation.
//!
//! [`MockBridge`] never starts a process. Every command answers with the
//! output a healthy encoder would print unless a reply has been queued for
//! it. Clones share state, so a test can keep one handle for inspection
//! while the session owns another.

use crate::{BridgeError, BridgeTransport, RawOutput, Result};
use hotelkey_core::DeviceErrorCode;
use hotelkey_protocol::{CommandKind, Invocation, Reply, render_status};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::trace;

/// Card number reported by the simulated encoder.
pub const SIMULATED_CARD_NUMBER: &str = "3000123456";

/// Card id reported by the simulated encoder.
pub const SIMULATED_CARD_ID: &str = r#"{"cardId":"9F3A61C2","type":"M1"}"#;

/// Hotel array reported by the simulated encoder.
pub const SIMULATED_HOTEL_ARRAY: &str = "1,1,0,0,0,0,0,0";

/// One scripted bridge outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Exit 0 with this stdout.
    Stdout(String),

    /// Nonzero exit with this stderr.
    Exit { code: i32, stderr: String },

    /// Terminated without an exit code.
    Signal,

    /// The process could not be started.
    SpawnFailure(String),

    /// The process never finishes; the invocation times out.
    Hang,
}

impl MockReply {
    /// Successful output for `kind` carrying `reply`.
    pub fn reply(kind: CommandKind, reply: &Reply) -> Self {
        Self::Stdout(reply.render(kind))
    }

    /// Status line with a device code (exit 0).
    pub fn device_code(kind: CommandKind, code: DeviceErrorCode) -> Self {
        Self::Stdout(render_status(kind, code))
    }

    /// Value line (exit 0).
    pub fn value(kind: CommandKind, value: impl Into<String>) -> Self {
        Self::reply(kind, &Reply::Value(value.into()))
    }

    pub fn exit(code: i32, stderr: impl Into<String>) -> Self {
        Self::Exit {
            code,
            stderr: stderr.into(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    queued: HashMap<CommandKind, VecDeque<MockReply>>,
    defaults: HashMap<CommandKind, MockReply>,
    invocations: Vec<Invocation>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<MockState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Scripted, recording bridge transport.
///
/// # Examples
///
/// ```
/// use hotelkey_bridge::{BridgeError, BridgeTransport, MockBridge, MockReply};
/// use hotelkey_protocol::{BridgeCommand, CommandKind};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let bridge = MockBridge::new();
///     bridge.push_reply(CommandKind::GetCardNo, MockReply::exit(1, "no card"));
///
///     let invocation = BridgeCommand::GetCardNo.encode();
///     let first = bridge.invoke(&invocation, Duration::from_secs(1)).await;
///     assert!(matches!(first, Err(BridgeError::TransportFailure { exit_code: Some(1), .. })));
///
///     // Queued replies are used once; the default answer follows.
///     let second = bridge.invoke(&invocation, Duration::from_secs(1)).await.unwrap();
///     assert!(second.stdout.starts_with("Card No: "));
///
///     assert_eq!(bridge.count(CommandKind::GetCardNo), 2);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockBridge {
    shared: Arc<Shared>,
}

impl MockBridge {
    /// A bridge where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bridge that behaves like an idle encoder with a card on it,
    /// taking a moment for every command.
    pub fn simulated_encoder() -> Self {
        Self::new().with_delay(Duration::from_millis(150))
    }

    /// Delay every invocation by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = delay;
        self
    }

    /// Queue a one-shot reply for the next invocation of `kind`.
    pub fn push_reply(&self, kind: CommandKind, reply: MockReply) -> &Self {
        self.lock().queued.entry(kind).or_default().push_back(reply);
        self
    }

    /// Replace the reply used for `kind` whenever nothing is queued.
    pub fn set_default(&self, kind: CommandKind, reply: MockReply) -> &Self {
        self.lock().defaults.insert(kind, reply);
        self
    }

    /// Every invocation received so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().invocations.clone()
    }

    /// Command kinds received so far, in order.
    pub fn commands(&self) -> Vec<CommandKind> {
        self.lock().invocations.iter().map(Invocation::kind).collect()
    }

    /// Number of invocations of `kind`.
    pub fn count(&self, kind: CommandKind) -> usize {
        self.lock()
            .invocations
            .iter()
            .filter(|inv| inv.kind() == kind)
            .count()
    }

    /// Total number of invocations (simulated process spawns).
    pub fn invocation_count(&self) -> usize {
        self.lock().invocations.len()
    }

    /// Highest number of invocations observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic while holding the lock only happens inside a failing test.
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, kind: CommandKind) -> MockReply {
        let mut state = self.lock();
        if let Some(reply) = state.queued.get_mut(&kind).and_then(VecDeque::pop_front) {
            return reply;
        }
        state
            .defaults
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| healthy_reply(kind))
    }
}

impl BridgeTransport for MockBridge {
    async fn invoke(&self, invocation: &Invocation, timeout: Duration) -> Result<RawOutput> {
        let kind = invocation.kind();
        let delay = {
            let mut state = self.lock();
            state.invocations.push(invocation.clone());
            state.delay
        };

        let _in_flight = InFlight::enter(&self.shared);
        trace!(command = kind.name(), "Mock bridge invoked");

        let reply = self.next_reply(kind);
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        if reply == MockReply::Hang || delay >= timeout {
            tokio::time::sleep(timeout).await;
            return Err(BridgeError::timeout(kind.name(), timeout_ms));
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Stdout(stdout) => Ok(RawOutput::new(stdout)),
            MockReply::Exit { code, stderr } => {
                Err(BridgeError::transport_failure(Some(code), stderr))
            }
            MockReply::Signal => Err(BridgeError::transport_failure(None, "")),
            MockReply::SpawnFailure(message) => {
                Err(BridgeError::spawn_failure("mock-bridge", message))
            }
            MockReply::Hang => Err(BridgeError::timeout(kind.name(), timeout_ms)),
        }
    }
}

struct InFlight<'a> {
    shared: &'a Shared,
}

impl<'a> InFlight<'a> {
    fn enter(shared: &'a Shared) -> Self {
        let now = shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        shared.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { shared }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

fn healthy_reply(kind: CommandKind) -> MockReply {
    let value = match kind {
        CommandKind::ReadCard => SIMULATED_HOTEL_ARRAY,
        CommandKind::GetCardNo => SIMULATED_CARD_NUMBER,
        CommandKind::GetCardId => SIMULATED_CARD_ID,
        CommandKind::GetVersion => r#"{"firmware":"3.2.7","hardware":"CE-200","protocol":"2"}"#,
        CommandKind::ReadCancellationInfo => "[]",
        CommandKind::GetSectors => "1,2",
        CommandKind::GetCpuCardSupport => "0",
        CommandKind::ConfigServer => return MockReply::reply(kind, &Reply::Flag(true)),
        CommandKind::ReadSectorRawData => {
            return MockReply::reply(kind, &Reply::Block("0".repeat(32)));
        }
        _ => return MockReply::reply(kind, &Reply::Ack),
    };
    MockReply::value(kind, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotelkey_protocol::{BridgeCommand, decode};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_default_replies_decode_for_every_command() {
        let bridge = MockBridge::new();

        for kind in CommandKind::ALL {
            let MockReply::Stdout(stdout) = healthy_reply(kind) else {
                panic!("healthy reply for {kind} is not stdout");
            };
            assert!(decode(kind, &stdout).is_ok(), "default reply for {kind}");
        }

        let output = bridge
            .invoke(&BridgeCommand::GetCardNo.encode(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(output.stdout, format!("Card No: {SIMULATED_CARD_NUMBER}\n"));
    }

    #[tokio::test]
    async fn test_queued_replies_are_fifo_then_default() {
        let bridge = MockBridge::new();
        bridge
            .push_reply(CommandKind::Connect, MockReply::exit(1, "busy"))
            .push_reply(CommandKind::Connect, MockReply::Signal);

        let connect = BridgeCommand::Connect { port: "COM3".into() }.encode();
        assert!(matches!(
            bridge.invoke(&connect, TIMEOUT).await,
            Err(BridgeError::TransportFailure { exit_code: Some(1), .. })
        ));
        assert!(matches!(
            bridge.invoke(&connect, TIMEOUT).await,
            Err(BridgeError::TransportFailure { exit_code: None, .. })
        ));
        assert!(bridge.invoke(&connect, TIMEOUT).await.is_ok());
        assert_eq!(bridge.count(CommandKind::Connect), 3);
    }

    #[tokio::test]
    async fn test_set_default_persists() {
        let bridge = MockBridge::new();
        bridge.set_default(
            CommandKind::Beep,
            MockReply::device_code(CommandKind::Beep, DeviceErrorCode::CommError(3)),
        );

        let beep = BridgeCommand::Beep(Default::default()).encode();
        for _ in 0..2 {
            let output = bridge.invoke(&beep, TIMEOUT).await.unwrap();
            assert_eq!(output.stdout, "Beep result: 3\n");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_times_out() {
        let bridge = MockBridge::new();
        bridge.push_reply(CommandKind::Connect, MockReply::Hang);

        let connect = BridgeCommand::Connect { port: "COM3".into() }.encode();
        let err = bridge
            .invoke(&connect, Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Timeout {
                command: "connect",
                duration_ms: 250
            }
        ));
    }

    #[tokio::test]
    async fn test_clones_share_recordings() {
        let bridge = MockBridge::new();
        let handle = bridge.clone();

        bridge
            .invoke(&BridgeCommand::Disconnect.encode(), TIMEOUT)
            .await
            .unwrap();

        assert_eq!(handle.commands(), vec![CommandKind::Disconnect]);
        assert_eq!(handle.invocation_count(), 1);
        assert_eq!(handle.max_in_flight(), 1);
    }
}
