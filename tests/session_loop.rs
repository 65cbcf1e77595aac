use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use image::RgbImage;

use signcam::{
    Display, Frame, FrameSource, HeadlessDisplay, Overlay, Session, SessionState, SignConfig,
    SourceStats, StopReason, StubClassifier, SyntheticSource,
};

/// Yields `limit` frames (or forever), then end of stream. Counts releases.
struct ScriptedSource {
    limit: Option<u64>,
    served: u64,
    fail_at: Option<u64>,
    /// Raises the flag once this many frames were served, like a Ctrl-C would.
    interrupt_after: Option<(u64, Arc<AtomicBool>)>,
    releases: Rc<Cell<u32>>,
}

impl ScriptedSource {
    fn new(limit: Option<u64>, releases: Rc<Cell<u32>>) -> Self {
        Self {
            limit,
            served: 0,
            fail_at: None,
            interrupt_after: None,
            releases,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.fail_at == Some(self.served + 1) {
            return Err(anyhow!("device unplugged"));
        }
        if self.limit.is_some_and(|limit| self.served >= limit) {
            return Ok(None);
        }
        self.served += 1;
        if let Some((after, flag)) = &self.interrupt_after {
            if self.served >= *after {
                flag.store(true, Ordering::SeqCst);
            }
        }
        let image = RgbImage::from_pixel(640, 480, image::Rgb([10, 20, 30]));
        Ok(Some(Frame::from_image(image, self.served)))
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.served,
            device: "scripted".to_string(),
        }
    }
}

/// Returns the quit key on the given poll. Records what it was shown.
struct ScriptedDisplay {
    quit_on_poll: Option<u32>,
    polls: u32,
    presented: Vec<String>,
    closes: Rc<Cell<u32>>,
    fail_present: bool,
}

impl ScriptedDisplay {
    fn new(quit_on_poll: Option<u32>, closes: Rc<Cell<u32>>) -> Self {
        Self {
            quit_on_poll,
            polls: 0,
            presented: Vec::new(),
            closes,
            fail_present: false,
        }
    }
}

impl Display for ScriptedDisplay {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn present(&mut self, _frame: &Frame, overlay: &Overlay) -> Result<()> {
        if self.fail_present {
            return Err(anyhow!("window vanished"));
        }
        let text = overlay
            .texts
            .last()
            .map(|t| t.text.clone())
            .unwrap_or_default();
        self.presented.push(text);
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        self.polls += 1;
        if self.quit_on_poll == Some(self.polls) {
            Ok(Some('q'))
        } else {
            Ok(None)
        }
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

fn confident_c() -> StubClassifier {
    let mut probs = vec![0.003f32; 29];
    probs[2] = 0.91;
    StubClassifier::new(probs)
}

#[test]
fn three_frames_then_end_of_stream() -> Result<()> {
    let releases = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let source = ScriptedSource::new(Some(3), releases.clone());
    let display = ScriptedDisplay::new(None, closes.clone());

    let mut session = Session::new(&SignConfig::default(), source, confident_c(), display);
    assert_eq!(session.state(), SessionState::Running);
    let report = session.run()?;

    assert_eq!(report.stop_reason, StopReason::EndOfStream);
    assert_eq!(report.frames, 3);
    assert_eq!(report.inferences, 3);
    assert_eq!(report.confident, 3);
    assert_eq!(session.classifier().calls(), 3);
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(releases.get(), 1);
    assert_eq!(closes.get(), 1);
    assert_eq!(
        session.display().presented,
        vec!["Prediction: C (91.0%)"; 3]
    );
    Ok(())
}

#[test]
fn quit_key_on_second_poll() -> Result<()> {
    let releases = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let source = ScriptedSource::new(None, releases.clone());
    let display = ScriptedDisplay::new(Some(2), closes.clone());

    let mut session = Session::new(
        &SignConfig::default(),
        source,
        StubClassifier::uniform(29),
        display,
    );
    let report = session.run()?;

    assert_eq!(report.stop_reason, StopReason::QuitKey);
    assert_eq!(session.classifier().calls(), 2);
    assert_eq!(report.confident, 0);
    assert_eq!(
        session.display().presented,
        vec!["Prediction: Uncertain"; 2]
    );
    assert_eq!(releases.get(), 1);
    assert_eq!(closes.get(), 1);
    Ok(())
}

#[test]
fn failed_read_stops_cleanly() -> Result<()> {
    let releases = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let mut source = ScriptedSource::new(None, releases.clone());
    source.fail_at = Some(2);
    let display = ScriptedDisplay::new(None, closes.clone());

    let mut session = Session::new(&SignConfig::default(), source, confident_c(), display);
    let report = session.run()?;

    assert!(matches!(report.stop_reason, StopReason::CaptureFailed(ref msg) if msg.contains("unplugged")));
    assert_eq!(report.frames, 1);
    assert_eq!(session.classifier().calls(), 1);
    assert_eq!(releases.get(), 1);
    assert_eq!(closes.get(), 1);
    Ok(())
}

#[test]
fn display_error_still_releases_camera() {
    let releases = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let source = ScriptedSource::new(None, releases.clone());
    let mut display = ScriptedDisplay::new(None, closes.clone());
    display.fail_present = true;

    let mut session = Session::new(&SignConfig::default(), source, confident_c(), display);
    assert!(session.run().is_err());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(releases.get(), 1);
    assert_eq!(closes.get(), 1);
}

#[test]
fn frame_limit_stops_synthetic_run() -> Result<()> {
    let mut config = SignConfig::default();
    config.camera.device = "stub://loop".to_string();
    config.max_frames = Some(5);

    let source = SyntheticSource::open(&config.camera)?;
    let mut session = Session::new(&config, source, confident_c(), HeadlessDisplay::new());
    let report = session.run()?;

    assert_eq!(report.stop_reason, StopReason::FrameLimit);
    assert_eq!(report.frames, 5);
    assert_eq!(session.display().frames_presented(), 5);
    assert_eq!(session.source().stats().frames_captured, 5);
    Ok(())
}

#[test]
fn rerun_after_stop_does_nothing() -> Result<()> {
    let releases = Rc::new(Cell::new(0));
    let closes = Rc::new(Cell::new(0));
    let source = ScriptedSource::new(Some(1), releases.clone());
    let display = ScriptedDisplay::new(None, closes.clone());

    let mut session = Session::new(&SignConfig::default(), source, confident_c(), display);
    session.run()?;
    let second = session.run()?;

    assert_eq!(second.frames, 0);
    assert_eq!(session.classifier().calls(), 1);
    assert_eq!(releases.get(), 1);
    assert_eq!(closes.get(), 1);
    Ok(())
}

#[test]
fn interrupt_stops_headless_session_and_cleans_up() -> Result<()> {
    let releases = Rc::new(Cell::new(0));
    let interrupted = Arc::new(AtomicBool::new(false));
    let mut source = ScriptedSource::new(None, releases.clone());
    source.interrupt_after = Some((3, interrupted.clone()));

    let mut session = Session::new(
        &SignConfig::default(),
        source,
        confident_c(),
        HeadlessDisplay::new(),
    )
    .with_interrupt(interrupted);
    let report = session.run()?;

    assert_eq!(report.stop_reason, StopReason::Interrupted);
    assert_eq!(report.frames, 3);
    assert_eq!(session.display().frames_presented(), 3);
    assert!(session.display().is_closed());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(releases.get(), 1);
    Ok(())
}
