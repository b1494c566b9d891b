use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use typlax::clock::ManualClock;
use typlax::input::KeyPress;
use typlax::modes::ModeId;
use typlax::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use typlax::session::PlaySession;

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the runtime + PlaySession without a TTY.
// Verifies that a minimal typing flow completes via Runner/TestEventSource.
#[test]
fn headless_typing_flow_completes() {
    let mut session = PlaySession::new(ModeId::TreeGrowing, "hi");

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let mut runner = Runner::new(es, ticker);

    tx.send(key('h')).unwrap();
    tx.send(key('i')).unwrap();

    let mut ticks = 0;
    for _ in 0..100u32 {
        match runner.step() {
            AppEvent::Tick => {
                ticks += 1;
                let _ = session.poll();
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if session.handle_key(&KeyPress::from(key)).completed {
                    break;
                }
            }
        }
    }

    assert!(session.is_complete(), "session should have completed");
    assert!(ticks < 100);
    let stats = session.final_stats().unwrap();
    assert_eq!(stats.total_chars, 2);
    assert_eq!(stats.accuracy, 100);
}

#[test]
fn headless_hud_polls_while_idle() {
    let (_tx, rx) = mpsc::channel::<AppEvent>();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::from_millis(2));
    let session = PlaySession::new(ModeId::CarRacing, "hello");

    for _ in 0..3 {
        assert!(matches!(runner.step(), AppEvent::Tick));
        let hud = session.poll();
        assert_eq!(hud.wpm, 0);
        assert_eq!(hud.accuracy, 100);
        assert_eq!(hud.elapsed_time, 0.0);
    }
}

#[test]
fn headless_hud_tracks_a_timed_session() {
    let clock = ManualClock::new(1_700_000_000_000);
    let mut session =
        PlaySession::with_clock(ModeId::NightSunrise, "the quick brown fox", clock.clone());

    for c in "the quick ".chars() {
        clock.advance(200);
        session.handle_key(&KeyPress::char(c));
    }

    // 10 keystrokes over 1.8 s since the first one
    let hud = session.poll();
    assert_eq!(hud.total_chars, 10);
    assert_eq!(hud.elapsed_time, 1.8);
    assert_eq!(hud.raw_wpm, 67);

    clock.advance(5_000);
    assert_eq!(session.poll().wpm, 0, "nothing typed in the last window");
    assert!(!session.is_complete());
}

#[test]
fn headless_stats_freeze_at_completion() {
    let clock = ManualClock::new(1_700_000_000_000);
    let mut session = PlaySession::with_clock(ModeId::EggToBird, "ok", clock.clone());

    clock.advance(100);
    session.handle_key(&KeyPress::char('o'));
    clock.advance(400);
    assert!(session.handle_key(&KeyPress::char('k')).completed);

    let at_completion = session.poll();
    clock.advance(60_000);
    assert_eq!(session.poll(), at_completion);
    assert_eq!(session.final_stats(), Some(at_completion));
    assert_eq!(at_completion.elapsed_time, 0.4);
}

#[test]
fn headless_corrections_after_the_end_complete_once() {
    let clock = ManualClock::new(1_700_000_000_000);
    let mut session = PlaySession::with_clock(ModeId::BrokenGlass, "cat", clock.clone());

    let (tx, source) = TestEventSource::channel();
    let mut runner = Runner::new(source, FixedTicker::from_millis(200));
    for ev in [
        key('c'),
        key('x'),
        key('a'),
        AppEvent::Key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
        AppEvent::Key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
        key('a'),
        key('t'),
    ] {
        tx.send(ev).unwrap();
    }

    let (mut keys, mut completions) = (0, 0);
    while keys < 7 {
        if let AppEvent::Key(k) = runner.step() {
            keys += 1;
            clock.advance(120);
            if session.handle_key(&KeyPress::from(k)).completed {
                completions += 1;
            }
        }
    }

    assert_eq!(completions, 1);
    assert_eq!(session.validator().position(), 3);
    assert!(session.validator().error_positions().is_empty());

    let stats = session.final_stats().unwrap();
    assert_eq!(stats.total_chars, 5);
    assert_eq!(stats.accuracy, 60);
}
