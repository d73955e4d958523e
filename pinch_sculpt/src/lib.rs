//! # pinch_sculpt
//!
//! Hand-landmark sculpting front end for [`sculpt_core`]: a software-rendered
//! window showing the shapes, the particle bursts, the snap flash and
//! fingertip markers over the tracked hands.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Hands | Action |
//! |---|---|---|
//! | Pinch with index tips together | Both | Create a shape between the hands |
//! | Keep pinching, move hands apart | Both | Scale the new shape |
//! | Pinch near a shape | One | Drag it |
//! | Snap (thumb on middle finger) | Either | Disintegrate every shape |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: mouse and keyboard drive synthetic hands.
//! * `leap` — **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation controls
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse | Move the hand (or the midpoint of both hands) |
//! | Left button | Pinch |
//! | `Tab` | Toggle the second hand |
//! | `Up` / `Down` | Widen / narrow the two-hand spread |
//! | `S` | Snap |
//! | `H` | Hide / show the hands |
//! | `Q` / `Escape` | Quit |

pub mod source;
pub mod mirror;
pub mod visualizer;
pub mod app;
