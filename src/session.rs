//! The capture/display loop.
//!
//! A session owns one frame source, one classifier and one display. `run` loops
//! until the quit key, end of stream, a failed read, the frame limit or an
//! interrupt, then releases the camera and closes the display exactly once.
//! Release happens in a guard's `Drop`, so it also runs when an iteration returns
//! an error.

use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::classify::ClassifierBackend;
use crate::config::SignConfig;
use crate::display::Display;
use crate::ingest::FrameSource;
use crate::pipeline::Pipeline;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Stopped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitKey,
    EndOfStream,
    /// Frame read failed; treated as end of stream.
    CaptureFailed(String),
    FrameLimit,
    /// Interrupt flag raised, e.g. by Ctrl-C.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::QuitKey => write!(f, "quit key pressed"),
            StopReason::EndOfStream => write!(f, "end of stream"),
            StopReason::CaptureFailed(err) => write!(f, "frame read failed: {}", err),
            StopReason::FrameLimit => write!(f, "frame limit reached"),
            StopReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionReport {
    pub frames: u64,
    pub inferences: u64,
    pub confident: u64,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl SessionReport {
    /// Effective loop rate over the whole session.
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Default)]
struct Tally {
    frames: u64,
    inferences: u64,
    confident: u64,
}

pub struct Session<S, C, D> {
    source: S,
    pipeline: Pipeline<C>,
    display: D,
    quit_key: char,
    max_frames: Option<u64>,
    interrupt: Option<Arc<AtomicBool>>,
    state: SessionState,
}

impl<S, C, D> Session<S, C, D>
where
    S: FrameSource,
    C: ClassifierBackend,
    D: Display,
{
    /// Build a session around an already opened source and display.
    pub fn new(config: &SignConfig, source: S, classifier: C, display: D) -> Self {
        Self {
            source,
            pipeline: Pipeline::new(config, classifier),
            display,
            quit_key: config.display.quit_key,
            max_frames: config.max_frames,
            interrupt: None,
            state: SessionState::Running,
        }
    }

    /// Stop the loop, with the usual cleanup, once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn classifier(&self) -> &C {
        self.pipeline.classifier()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Run the loop to completion. A session runs once; later calls return an
    /// empty report.
    pub fn run(&mut self) -> Result<SessionReport> {
        let started = Instant::now();
        let mut tally = Tally::default();

        if self.state == SessionState::Stopped {
            return Ok(SessionReport {
                frames: 0,
                inferences: 0,
                confident: 0,
                stop_reason: StopReason::EndOfStream,
                elapsed: Duration::ZERO,
            });
        }

        log::info!(
            "session running (source={}, classifier={}, display={}); press '{}' to quit",
            self.source.name(),
            self.pipeline.classifier().name(),
            self.display.name(),
            self.quit_key
        );

        let outcome = {
            let mut resources = Resources {
                source: &mut self.source,
                display: &mut self.display,
            };
            drive(
                &mut resources,
                &mut self.pipeline,
                self.quit_key,
                self.max_frames,
                self.interrupt.as_deref(),
                &mut tally,
            )
        };
        self.state = SessionState::Stopped;

        let stop_reason = outcome?;
        let report = SessionReport {
            frames: tally.frames,
            inferences: tally.inferences,
            confident: tally.confident,
            stop_reason,
            elapsed: started.elapsed(),
        };
        log::info!(
            "session stopped: {} (frames={}, inferences={}, confident={}, {:.1} fps)",
            report.stop_reason,
            report.frames,
            report.inferences,
            report.confident,
            report.fps()
        );
        Ok(report)
    }
}

/// Camera and display borrowed for one run; released on drop.
struct Resources<'a, S: FrameSource, D: Display> {
    source: &'a mut S,
    display: &'a mut D,
}

impl<S: FrameSource, D: Display> Drop for Resources<'_, S, D> {
    fn drop(&mut self) {
        let stats = self.source.stats();
        self.source.release();
        self.display.close();
        log::info!(
            "released {} after {} frames",
            stats.device,
            stats.frames_captured
        );
    }
}

fn drive<S, C, D>(
    resources: &mut Resources<'_, S, D>,
    pipeline: &mut Pipeline<C>,
    quit_key: char,
    max_frames: Option<u64>,
    interrupt: Option<&AtomicBool>,
    tally: &mut Tally,
) -> Result<StopReason>
where
    S: FrameSource,
    C: ClassifierBackend,
    D: Display,
{
    loop {
        if interrupt.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            log::info!("interrupt received");
            return Ok(StopReason::Interrupted);
        }
        if max_frames.is_some_and(|limit| tally.frames >= limit) {
            return Ok(StopReason::FrameLimit);
        }

        let mut frame = match resources.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("capture source reached end of stream");
                return Ok(StopReason::EndOfStream);
            }
            Err(err) => {
                log::error!("failed to read frame: {:#}", err);
                return Ok(StopReason::CaptureFailed(format!("{:#}", err)));
            }
        };
        tally.frames += 1;

        let overlay = pipeline.process(&mut frame)?;
        if let Some(decision) = overlay.decision() {
            tally.inferences += 1;
            if decision.is_confident() {
                tally.confident += 1;
            }
        }

        resources.display.present(&frame, &overlay)?;

        if resources.display.poll_key()? == Some(quit_key) {
            log::info!("quit key '{}' pressed", quit_key);
            return Ok(StopReason::QuitKey);
        }
    }
}
