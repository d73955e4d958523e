//! Hand-landmark sources: LeapMotion hardware and keyboard/mouse simulation.
//!
//! The public interface is [`SourceEvent`] delivered over a `mpsc` channel.
//! The run loop does not know whether the hands came from real hardware or
//! the simulator; both produce 21-landmark [`HandFrame`]s in normalized
//! image coordinates (x right, y down, 0–1).

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use sculpt_core::landmark::*;

// ════════════════════════════════════════════════════════════════════════════
// SourceEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum SourceEvent {
    /// One inference result: zero, one or two hands.
    Hands(Vec<HandFrame>),

    /// Quit the application.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SourceEvent`]s over a channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>);
}

/// Spawn a hand source on its own thread and return the receiving end.
pub fn spawn_hand_source<H: HandSource>(source: H) -> Receiver<SourceEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Synthetic hands
// ════════════════════════════════════════════════════════════════════════════

/// Finger shape of a synthetic hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pose {
    Open,
    /// Thumb tip on index tip.
    Pinch,
    /// Thumb tip on middle tip.
    Snap,
}

/// Build a plausible 21-point hand whose index fingertip sits at `(x, y)`.
///
/// `side` is +1 for a right hand (thumb to the right of the index finger
/// in image space) and −1 for a left hand.
pub fn synth_hand(x: f32, y: f32, side: f32, pose: Pose) -> HandFrame {
    let at = |dx: f32, dy: f32| Landmark::new(x + side * dx, y + dy, 0.0);
    let lerp = |a: Landmark, b: Landmark, t: f32| {
        Landmark::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t, a.z + (b.z - a.z) * t)
    };

    let mut lm = [Landmark::default(); LANDMARK_COUNT];
    lm[WRIST] = at(0.02, 0.25);

    // Fingers: MCP knuckle and tip, joints in between.
    let fingers = [
        (INDEX_MCP,  at(0.010, 0.120), at(0.000,  0.000)),
        (MIDDLE_MCP, at(0.035, 0.115), at(0.035, -0.010)),
        (RING_MCP,   at(0.060, 0.120), at(0.065,  0.010)),
        (PINKY_MCP,  at(0.080, 0.135), at(0.090,  0.040)),
    ];
    for (mcp, base, tip) in fingers {
        lm[mcp]     = base;
        lm[mcp + 1] = lerp(base, tip, 0.4);
        lm[mcp + 2] = lerp(base, tip, 0.7);
        lm[mcp + 3] = tip;
    }

    let thumb_tip = match pose {
        Pose::Open  => at(0.120, 0.100),
        Pose::Pinch => at(-0.005, 0.012),
        Pose::Snap  => at(0.040, -0.005),
    };
    let cmc = at(0.060, 0.210);
    lm[THUMB_CMC] = cmc;
    lm[THUMB_MCP] = lerp(cmc, thumb_tip, 0.35);
    lm[THUMB_IP]  = lerp(cmc, thumb_tip, 0.7);
    lm[THUMB_TIP] = thumb_tip;

    HandFrame::from_array(lm)
}

// ════════════════════════════════════════════════════════════════════════════
// SimPose — the simulated hands
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer moved, normalized window coordinates.
    Pointer { x: f32, y: f32 },
    /// Mouse button pressed / released.
    Pinch(bool),
    ToggleSecondHand,
    /// Change the distance between the two index tips.
    Spread(f32),
    /// One snap frame.
    Snap,
    ToggleHidden,
    Quit,
}

/// Hands controlled by the mouse.  With two hands the pointer is their
/// midpoint and `spread` the index-tip separation.
#[derive(Clone, Debug, PartialEq)]
pub struct SimPose {
    pub x:         f32,
    pub y:         f32,
    pub pinching:  bool,
    pub two_hands: bool,
    pub spread:    f32,
    pub hidden:    bool,
    snap_pending:  bool,
}

impl Default for SimPose {
    fn default() -> Self {
        SimPose {
            x:            0.5,
            y:            0.5,
            pinching:     false,
            two_hands:    false,
            spread:       0.08,
            hidden:       false,
            snap_pending: false,
        }
    }
}

impl SimPose {
    pub const MAX_SPREAD: f32 = 0.8;

    /// Returns false on `Quit`.
    pub fn apply(&mut self, input: &SimInput) -> bool {
        match *input {
            SimInput::Pointer { x, y }   => { self.x = x.clamp(0.0, 1.0); self.y = y.clamp(0.0, 1.0); }
            SimInput::Pinch(down)        => self.pinching = down,
            SimInput::ToggleSecondHand   => self.two_hands = !self.two_hands,
            SimInput::Spread(delta)      => {
                self.spread = (self.spread + delta).clamp(0.0, Self::MAX_SPREAD);
            }
            SimInput::Snap               => self.snap_pending = true,
            SimInput::ToggleHidden       => self.hidden = !self.hidden,
            SimInput::Quit               => return false,
        }
        true
    }

    /// Current hands.  A pending snap is delivered exactly once.
    pub fn hands(&mut self) -> Vec<HandFrame> {
        if self.hidden {
            return Vec::new();
        }
        let snap = std::mem::take(&mut self.snap_pending);
        let pose = match (snap, self.pinching) {
            (true, _)      => Pose::Snap,
            (false, true)  => Pose::Pinch,
            (false, false) => Pose::Open,
        };

        if self.two_hands {
            let half = self.spread / 2.0;
            // Only one hand snaps.
            let left_pose = if snap { Pose::Open } else { pose };
            vec![
                synth_hand(self.x - half, self.y, -1.0, left_pose),
                synth_hand(self.x + half, self.y,  1.0, pose),
            ]
        } else {
            vec![synth_hand(self.x, self.y, 1.0, pose)]
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource — keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Hand source driven by [`SimInput`] events from the visualizer's window.
///
/// Emits the current pose at a fixed cadence (`period`), independent of how
/// often input arrives, so the engine sees an inference-like stream.
pub struct SimHandSource {
    pub rx:     Receiver<SimInput>,
    pub period: Duration,
}

impl SimHandSource {
    /// ~30 Hz, a typical landmark model rate.
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(33);

    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimHandSource { rx, period: Self::DEFAULT_PERIOD }
    }
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        let mut pose = SimPose::default();
        let mut next_emit = Instant::now() + self.period;

        loop {
            let wait = next_emit.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(wait) {
                Ok(input) => {
                    if !pose.apply(&input) {
                        let _ = tx.send(SourceEvent::Quit);
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout)      => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }

            if Instant::now() >= next_emit {
                next_emit += self.period;
                if tx.send(SourceEvent::Hands(pose.hands())).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Bone joints are mapped onto the 21-point layout and normalized over the
/// interaction box below (millimetres, device origin).
#[cfg(feature = "leap")]
pub struct LeapHandSource;

#[cfg(feature = "leap")]
impl HandSource for LeapHandSource {
    fn run(self: Box<Self>, tx: Sender<SourceEvent>) {
        use leaprs::*;
        use tracing::{error, info};

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => { error!(?e, "failed to create LeapC connection"); return; }
        };
        if let Err(e) = connection.open() {
            error!(?e, "failed to open LeapMotion device");
            return;
        }
        info!("LeapMotion connected");

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let hands: Vec<HandFrame> = frame.hands().take(2).map(|h| leap_hand(&h)).collect();
                if tx.send(SourceEvent::Hands(hands)).is_err() { return; }
            }
        }
    }
}

/// Map a Leap skeleton onto the 21-point layout.
#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> HandFrame {
    // Interaction box, mm.
    const X_SPAN: f32 = 400.0;
    const Y_MIN:  f32 = 80.0;
    const Y_SPAN: f32 = 320.0;

    macro_rules! norm {
        ($joint:expr) => {{
            let v = $joint;
            Landmark::new(
                (v.x + X_SPAN / 2.0) / X_SPAN,
                1.0 - (v.y - Y_MIN) / Y_SPAN,
                v.z / X_SPAN,
            )
        }};
    }

    let mut lm = [Landmark::default(); LANDMARK_COUNT];
    lm[WRIST] = norm!(hand.palm().position());

    let digits: Vec<_> = hand.digits().collect();
    for (i, digit) in digits.iter().enumerate().take(5) {
        let first = 1 + 4 * i;
        if i == 0 {
            // The thumb's metacarpal has zero length; start at the proximal.
            lm[first]     = norm!(digit.proximal().prev_joint());
            lm[first + 1] = norm!(digit.proximal().next_joint());
        } else {
            lm[first]     = norm!(digit.metacarpal().next_joint());
            lm[first + 1] = norm!(digit.proximal().next_joint());
        }
        lm[first + 2] = norm!(digit.intermediate().next_joint());
        lm[first + 3] = norm!(digit.distal().next_joint());
    }
    HandFrame::from_array(lm)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
