use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::board::BoardState;
use crate::calibration::Calibration;
use crate::catalog::Catalog;
use crate::rig::{CalibrationSource, Rig, RigBuilder, StatusSink};
use crate::settings::Settings;
use crate::sleep;
use crate::types::*;
use crate::logger;

/// Session counters. Written by the worker, read by the foreground.
#[derive(Debug, Default)]
pub struct Stats {
    boards_completed: AtomicU64,
    pieces_placed: AtomicU64,
    pieces_discarded: AtomicU64,
    current_board_placed: AtomicU64,
}

impl Stats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            boards_completed: self.boards_completed.load(Ordering::Relaxed),
            pieces_placed: self.pieces_placed.load(Ordering::Relaxed),
            pieces_discarded: self.pieces_discarded.load(Ordering::Relaxed),
            current_board_placed: self.current_board_placed.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.boards_completed.store(0, Ordering::Relaxed);
        self.pieces_placed.store(0, Ordering::Relaxed);
        self.pieces_discarded.store(0, Ordering::Relaxed);
        self.current_board_placed.store(0, Ordering::Relaxed);
    }

    fn piece_placed(&self) {
        self.pieces_placed.fetch_add(1, Ordering::Relaxed);
        self.current_board_placed.fetch_add(1, Ordering::Relaxed);
    }

    fn piece_discarded(&self) {
        self.pieces_discarded.fetch_add(1, Ordering::Relaxed);
    }

    fn board_completed(&self) {
        self.boards_completed.fetch_add(1, Ordering::Relaxed);
        self.current_board_placed.store(0, Ordering::Relaxed);
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Stopped,
    Quit,
    Failed,
}

/// Run flags of a live session; exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Idle,
    Running,
    Paused,
    Stopping,
}

/// Owns everything needed to start sessions.
pub struct Bot {
    calibration: Box<dyn CalibrationSource>,
    rigs: Box<dyn RigBuilder>,
    status: Arc<dyn StatusSink>,
    settings: Settings,
    catalog: Catalog,
    stats: Arc<Stats>,
}

impl Bot {
    pub fn new(
        calibration: Box<dyn CalibrationSource>,
        rigs: Box<dyn RigBuilder>,
        status: Arc<dyn StatusSink>,
        settings: Settings,
        catalog: Catalog,
    ) -> Self {
        Self {
            calibration,
            rigs,
            status,
            settings,
            catalog,
            stats: Arc::new(Stats::default()),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    /// Initialize and run one session until it stops or fails.
    /// Commands are read from `commands` between iterations.
    pub fn run_session(&mut self, commands: &Receiver<Command>) -> SessionEnd {
        self.stats.reset();
        let calibration = match self.calibration.load_calibration() {
            Ok(c) => c,
            Err(e) => {
                logger::error_p("bot", &format!("{:#}", e));
                self.report_failure("no calibration!");
                return SessionEnd::Failed;
            }
        };
        if !calibration.is_complete() {
            logger::error_p(
                "bot",
                &format!("calibration is missing: {}", calibration.missing().join(", ")),
            );
            self.report_failure("calibration incomplete!");
            return SessionEnd::Failed;
        }

        let rig = self.rigs.build(&calibration);
        let mut session = Session {
            rig,
            board: BoardState::new(self.catalog.clone()),
            calibration,
            settings: &self.settings,
            status: self.status.as_ref(),
            commands,
            stats: &self.stats,
            state: BotState::Idle,
            mode: RunMode::Idle,
            quit: false,
            rescan: false,
        };
        session.publish("ready");
        session.run();

        if session.quit {
            SessionEnd::Quit
        } else {
            SessionEnd::Stopped
        }
    }

    fn report_failure(&self, message: &str) {
        self.status.report(&StatusUpdate {
            state: BotState::Error,
            message: message.to_string(),
            stats: self.stats.snapshot(),
            board: String::new(),
            grid: EMPTY_GRID,
        });
    }
}

/// One execution of the control loop.
struct Session<'a> {
    rig: Rig,
    board: BoardState,
    calibration: Calibration,
    settings: &'a Settings,
    status: &'a dyn StatusSink,
    commands: &'a Receiver<Command>,
    stats: &'a Stats,
    state: BotState,
    mode: RunMode,
    quit: bool,
    rescan: bool,
}

impl Session<'_> {
    fn publish(&self, message: &str) {
        match self.state {
            BotState::Fetching | BotState::Detecting => logger::debug_p("bot", message),
            _ => logger::info_p("bot", message),
        }
        self.status.report(&StatusUpdate {
            state: self.state,
            message: message.to_string(),
            stats: self.stats.snapshot(),
            board: self.board.status_text(),
            grid: *self.board.grid(),
        });
    }

    fn enter(&mut self, next: BotState, message: &str) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        self.publish(message);
    }

    fn run(&mut self) {
        self.mode = RunMode::Running;
        self.rescan = true;
        self.enter(BotState::Running, "starting...");

        loop {
            self.drain_commands();
            if self.mode == RunMode::Stopping {
                break;
            }
            if self.mode == RunMode::Paused {
                self.wait_while_paused();
                continue;
            }

            if std::mem::take(&mut self.rescan) {
                self.scan_board();
            }

            if self.board.is_complete() {
                self.complete_board();
            } else {
                match self.fetch_piece() {
                    Some(piece) => self.handle_piece(piece),
                    None => {
                        self.mode = RunMode::Paused;
                        self.enter(BotState::Paused, "supply empty - refill and press HOME/p");
                        self.status.supply_empty();
                    }
                }
            }

            sleep::sleep_ms(self.settings.timing.iteration_delay);
        }

        self.mode = RunMode::Idle;
        self.enter(BotState::Stopped, "stopped");
    }

    fn apply(&mut self, cmd: Command) {
        match (cmd, self.mode) {
            (Command::Stop, _) => self.mode = RunMode::Stopping,
            (Command::Quit, _) => {
                self.mode = RunMode::Stopping;
                self.quit = true;
            }
            (Command::Pause | Command::TogglePause, RunMode::Running) => {
                self.mode = RunMode::Paused;
                self.enter(BotState::Paused, "paused - press HOME/p to resume");
            }
            // HOME is Start; on a paused session it resumes
            (Command::Resume | Command::TogglePause | Command::Start, RunMode::Paused) => {
                self.mode = RunMode::Running;
                self.rescan = true;
                self.enter(BotState::Running, "resuming...");
            }
            (Command::Start, _) => logger::info_p("bot", "already running"),
            (Command::Pause | Command::Resume, _) => {}
            (Command::TogglePause, RunMode::Idle | RunMode::Stopping) => {}
        }
    }

    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(cmd) => self.apply(cmd),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.apply(Command::Quit);
                    return;
                }
            }
        }
    }

    fn wait_while_paused(&mut self) {
        let poll = Duration::from_millis(self.settings.timing.pause_poll.max(1));
        while self.mode == RunMode::Paused {
            match self.commands.recv_timeout(poll) {
                Ok(cmd) => self.apply(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.apply(Command::Quit),
            }
        }
    }

    fn scan_board(&mut self) {
        logger::debug_p("board", "scanning board...");
        let raw = self.rig.scanner.scan_board();
        self.board.reload(&raw);
        logger::info_p("board", &self.board.status_text());
        logger::debug_p("board", &self.board.render());
    }

    /// Fetch pieces until one is classified or the retry bound runs out.
    fn fetch_piece(&mut self) -> Option<PieceType> {
        let retries = self.settings.max_fetch_retries.max(1);
        let staging = self.calibration.staging_point();

        for attempt in 1..=retries {
            self.enter(BotState::Fetching, BotState::Fetching.label());
            self.rig.sequencer.fetch_new_piece();
            sleep::sleep_ms(self.settings.timing.detection_wait);

            self.enter(BotState::Detecting, BotState::Detecting.label());
            if let Some(piece) = self.rig.detector.classify_at(staging) {
                logger::debug_p("bot", &format!("detected {}", piece));
                return Some(piece);
            }

            logger::warn_p("bot", &format!("no piece detected, attempt {}/{}", attempt, retries));
            sleep::sleep_ms(self.settings.timing.retry_delay);
        }

        logger::warn_p("bot", "supply looks empty");
        None
    }

    fn handle_piece(&mut self, piece: PieceType) {
        if piece.is_rejected() {
            self.discard(piece);
            return;
        }
        if !self.board.can_place(piece) {
            logger::info_p("bot", &format!("{} limit reached", piece));
            self.discard(piece);
            return;
        }
        let slot = self.board.next_free_slot(piece).cloned();
        let message = match &slot {
            Some(s) => format!("placing {} at {}...", piece, s.id),
            None => format!("placing {}...", piece),
        };
        self.enter(BotState::Placing, &message);
        let Some(slot) = slot else {
            logger::warn_p("bot", &format!("no free slot for {} despite quota room", piece));
            self.discard(piece);
            return;
        };

        self.rig.sequencer.place_at(slot.target);
        self.board.commit(piece, &slot);
        self.stats.piece_placed();
        logger::info_p(
            "bot",
            &format!("placed {} at {} - {}/{}", piece, slot.id, self.board.total_placed(), BOARD_QUOTA),
        );
    }

    fn discard(&mut self, piece: PieceType) {
        self.enter(BotState::Discarding, &format!("discarding {}...", piece));
        self.rig.sequencer.discard_current();
        self.stats.piece_discarded();
    }

    fn complete_board(&mut self) {
        self.enter(BotState::Completing, "board complete!");
        sleep::sleep_ms(self.settings.timing.completion_settle);
        self.rig.sequencer.confirm_completion();
        self.stats.board_completed();
        self.board.reset();
        logger::info_p(
            "bot",
            &format!("completed board #{}", self.stats.snapshot().boards_completed),
        );
        sleep::sleep_ms(self.settings.timing.after_completion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc::{self, Sender};
    use std::sync::Mutex;

    use anyhow::anyhow;

    use crate::rig::{BoardScanner, Detector, Sequencer};
    use crate::settings::Timing;

    #[derive(Debug, Clone, PartialEq)]
    enum Action {
        Fetch,
        Place(GridPoint),
        Discard,
        Confirm,
    }

    /// Scripted puzzle: each fetch pops the next piece (None = unreadable).
    /// Commands queued in `on_fetch` are sent as the matching fetch happens.
    #[derive(Default)]
    struct World {
        pieces: VecDeque<Option<PieceType>>,
        current: Option<PieceType>,
        actions: Vec<Action>,
        scan: RawGrid,
        next_scan: Option<RawGrid>,
        scans: usize,
        fetches: usize,
        on_fetch: Vec<(usize, Command)>,
        tx: Option<Sender<Command>>,
    }

    type Shared = Arc<Mutex<World>>;

    struct FakeSequencer(Shared);
    struct FakeDetector(Shared);
    struct FakeScanner(Shared);

    impl Sequencer for FakeSequencer {
        fn fetch_new_piece(&mut self) {
            let mut w = self.0.lock().unwrap();
            w.fetches += 1;
            w.current = w.pieces.pop_front().flatten();
            w.actions.push(Action::Fetch);
            if let Some(grid) = w.next_scan.take() {
                w.scan = grid;
            }
            let n = w.fetches;
            let due: Vec<Command> = w.on_fetch.iter().filter(|(at, _)| *at == n).map(|(_, c)| *c).collect();
            if let Some(tx) = &w.tx {
                for cmd in due {
                    tx.send(cmd).unwrap();
                }
            }
        }
        fn place_at(&mut self, target: GridPoint) {
            self.0.lock().unwrap().actions.push(Action::Place(target));
        }
        fn discard_current(&mut self) {
            self.0.lock().unwrap().actions.push(Action::Discard);
        }
        fn confirm_completion(&mut self) {
            self.0.lock().unwrap().actions.push(Action::Confirm);
        }
    }

    impl Detector for FakeDetector {
        fn classify_at(&mut self, _at: Point) -> Option<PieceType> {
            self.0.lock().unwrap().current
        }
    }

    impl BoardScanner for FakeScanner {
        fn scan_board(&mut self) -> RawGrid {
            let mut w = self.0.lock().unwrap();
            w.scans += 1;
            w.scan
        }
    }

    struct FakeRigs(Shared);

    impl RigBuilder for FakeRigs {
        fn build(&mut self, _calibration: &Calibration) -> Rig {
            Rig {
                detector: Box::new(FakeDetector(Arc::clone(&self.0))),
                sequencer: Box::new(FakeSequencer(Arc::clone(&self.0))),
                scanner: Box::new(FakeScanner(Arc::clone(&self.0))),
            }
        }
    }

    struct FakeCalibration(Option<Calibration>);

    impl CalibrationSource for FakeCalibration {
        fn load_calibration(&mut self) -> anyhow::Result<Calibration> {
            self.0.clone().ok_or_else(|| anyhow!("calibration.json not found"))
        }
    }

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<StatusUpdate>>,
        supply_empty: AtomicUsize,
    }

    impl StatusSink for Recorder {
        fn report(&self, update: &StatusUpdate) {
            self.updates.lock().unwrap().push(update.clone());
        }
        fn supply_empty(&self) {
            self.supply_empty.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Recorder {
        fn states(&self) -> Vec<BotState> {
            self.updates.lock().unwrap().iter().map(|u| u.state).collect()
        }
        fn count(&self, state: BotState) -> usize {
            self.states().iter().filter(|s| **s == state).count()
        }
        fn last(&self) -> StatusUpdate {
            self.updates.lock().unwrap().last().cloned().unwrap()
        }
    }

    fn full_calibration() -> Calibration {
        Calibration {
            supply: Some(Point::new(10, 10)),
            staging: Some(Point::new(20, 20)),
            discard: Some(Point::new(30, 30)),
            confirm: Some(Point::new(40, 40)),
            board_top_left: Some(Point::new(100, 100)),
            board_bottom_right: Some(Point::new(700, 500)),
        }
    }

    struct Harness {
        bot: Bot,
        world: Shared,
        sink: Arc<Recorder>,
        tx: Sender<Command>,
        rx: Receiver<Command>,
    }

    fn harness(calibration: Option<Calibration>, pieces: Vec<Option<PieceType>>) -> Harness {
        let (tx, rx) = mpsc::channel();
        let world = Arc::new(Mutex::new(World {
            pieces: pieces.into(),
            tx: Some(tx.clone()),
            ..Default::default()
        }));
        let sink = Arc::new(Recorder::default());
        let settings = Settings {
            timing: Timing::instant(),
            ..Settings::default()
        };
        let bot = Bot::new(
            Box::new(FakeCalibration(calibration)),
            Box::new(FakeRigs(Arc::clone(&world))),
            sink.clone(),
            settings,
            Catalog::standard(),
        );
        Harness { bot, world, sink, tx, rx }
    }

    impl Harness {
        /// Send `cmd` when the n-th fetch happens.
        fn on_fetch(&self, n: usize, cmd: Command) {
            self.world.lock().unwrap().on_fetch.push((n, cmd));
        }

        /// Stop right after the last scripted fetch.
        fn stop_after_script(&self) {
            let n = self.world.lock().unwrap().pieces.len();
            self.on_fetch(n, Command::Stop);
        }

        fn run(&mut self) -> SessionEnd {
            self.bot.run_session(&self.rx)
        }

        fn actions(&self) -> Vec<Action> {
            self.world.lock().unwrap().actions.clone()
        }

        fn count(&self, pred: fn(&Action) -> bool) -> usize {
            self.actions().iter().filter(|a| pred(a)).count()
        }
    }

    fn target(id: &str, piece: PieceType) -> GridPoint {
        Catalog::standard()
            .slots(piece)
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.target)
            .unwrap()
    }

    #[test]
    fn test_missing_calibration_is_fatal() {
        let mut h = harness(None, vec![Some(PieceType::Red)]);
        assert_eq!(h.run(), SessionEnd::Failed);
        assert_eq!(h.sink.states(), vec![BotState::Error]);
        assert_eq!(h.sink.last().message, "no calibration!");
        assert!(h.actions().is_empty());
        assert_eq!(h.world.lock().unwrap().scans, 0);
    }

    #[test]
    fn test_incomplete_calibration_is_fatal() {
        let mut calib = full_calibration();
        calib.discard = None;
        let mut h = harness(Some(calib), vec![Some(PieceType::Red)]);
        assert_eq!(h.run(), SessionEnd::Failed);
        assert_eq!(h.sink.last().state, BotState::Error);
        assert_eq!(h.sink.last().message, "calibration incomplete!");
        assert!(h.actions().is_empty());
    }

    #[test]
    fn test_rejected_pieces_are_discarded() {
        let mut h = harness(Some(full_calibration()), vec![Some(PieceType::Orange); 3]);
        h.stop_after_script();
        assert_eq!(h.run(), SessionEnd::Stopped);

        let stats = h.bot.stats().snapshot();
        assert_eq!(stats.pieces_discarded, 3);
        assert_eq!(stats.pieces_placed, 0);
        assert_eq!(h.count(|a| *a == Action::Discard), 3);

        let last = h.sink.last();
        assert_eq!(last.state, BotState::Stopped);
        assert_eq!(last.grid, EMPTY_GRID);
        assert_eq!(last.board, "pieces 0/7 | empty 24/24");
    }

    #[test]
    fn test_detection_failure_pauses_once() {
        let mut h = harness(Some(full_calibration()), vec![None, None, None]);
        h.stop_after_script();
        assert_eq!(h.run(), SessionEnd::Stopped);

        assert_eq!(h.world.lock().unwrap().fetches, 3);
        assert_eq!(h.sink.count(BotState::Paused), 1);
        assert_eq!(h.sink.supply_empty.load(Ordering::Relaxed), 1);
        assert_eq!(h.count(|a| matches!(a, Action::Place(_) | Action::Discard)), 0);
        assert_eq!(h.sink.last().state, BotState::Stopped);
    }

    #[test]
    fn test_detection_recovers_within_retry_bound() {
        let mut h = harness(Some(full_calibration()), vec![None, None, Some(PieceType::Cyan)]);
        h.stop_after_script();
        h.run();

        assert_eq!(h.sink.count(BotState::Paused), 0);
        assert_eq!(h.sink.supply_empty.load(Ordering::Relaxed), 0);
        assert_eq!(h.actions().last(), Some(&Action::Place(target("C1", PieceType::Cyan))));
    }

    #[test]
    fn test_quota_reached_discards() {
        let mut h = harness(Some(full_calibration()), vec![Some(PieceType::Red); 3]);
        h.stop_after_script();
        h.run();

        let stats = h.bot.stats().snapshot();
        assert_eq!(stats.pieces_placed, 2);
        assert_eq!(stats.pieces_discarded, 1);
        assert_eq!(
            h.actions().into_iter().filter(|a| *a != Action::Fetch).collect::<Vec<_>>(),
            vec![
                Action::Place(target("R1", PieceType::Red)),
                Action::Place(target("R2", PieceType::Red)),
                Action::Discard,
            ]
        );
    }

    #[test]
    fn test_full_board_completes_and_resets() {
        let pieces = vec![
            Some(PieceType::Red),
            Some(PieceType::Cyan),
            Some(PieceType::Blue),
            Some(PieceType::Red),
            Some(PieceType::Green),
            Some(PieceType::Blue),
            Some(PieceType::Yellow),
            Some(PieceType::Red),
        ];
        let mut h = harness(Some(full_calibration()), pieces);
        h.stop_after_script();
        h.run();

        let stats = h.bot.stats().snapshot();
        assert_eq!(stats.boards_completed, 1);
        assert_eq!(stats.pieces_placed, 8);
        assert_eq!(stats.pieces_discarded, 0);
        assert_eq!(stats.current_board_placed, 1);

        let acts: Vec<Action> = h.actions().into_iter().filter(|a| *a != Action::Fetch).collect();
        assert_eq!(acts[7], Action::Confirm);
        // The red after completion lands on a fresh board at R1 again.
        assert_eq!(acts[8], Action::Place(target("R1", PieceType::Red)));
        assert_eq!(h.sink.count(BotState::Completing), 1);
    }

    #[test]
    fn test_initial_scan_counts_existing_pieces() {
        let mut h = harness(Some(full_calibration()), vec![Some(PieceType::Red)]);
        {
            let mut w = h.world.lock().unwrap();
            for (r, c) in [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)] {
                w.scan[r][c] = Some(PieceType::Red);
            }
        }
        h.stop_after_script();
        h.run();

        assert_eq!(h.world.lock().unwrap().scans, 1);
        assert_eq!(h.bot.stats().snapshot().pieces_discarded, 1);
    }

    #[test]
    fn test_resume_rescans_board() {
        let mut h = harness(
            Some(full_calibration()),
            vec![Some(PieceType::Red), Some(PieceType::Blue)],
        );
        h.on_fetch(1, Command::Pause);
        h.on_fetch(1, Command::Resume);
        h.stop_after_script();
        {
            // Someone drops a blue piece on B1 by hand while the bot is paused.
            let mut grid = EMPTY_GRID;
            for (r, c) in [(1, 2), (1, 3), (1, 4)] {
                grid[r][c] = Some(PieceType::Blue);
            }
            h.world.lock().unwrap().next_scan = Some(grid);
        }
        h.run();

        assert_eq!(h.world.lock().unwrap().scans, 2);
        let states = h.sink.states();
        let paused = states.iter().position(|s| *s == BotState::Paused).unwrap();
        assert_eq!(states[paused + 1], BotState::Running);
        assert_eq!(h.actions().last(), Some(&Action::Place(target("B2", PieceType::Blue))));
    }

    #[test]
    fn test_pause_blocks_io_until_stop() {
        let mut h = harness(Some(full_calibration()), vec![Some(PieceType::Orange); 2]);
        h.on_fetch(1, Command::Pause);
        let tx = h.tx.clone();
        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            tx.send(Command::Stop).unwrap();
        });
        assert_eq!(h.run(), SessionEnd::Stopped);
        waker.join().unwrap();

        // Only the first piece was fetched; nothing happened while paused.
        assert_eq!(h.world.lock().unwrap().fetches, 1);
        let states = h.sink.states();
        assert_eq!(&states[states.len() - 2..], &[BotState::Paused, BotState::Stopped]);
    }

    #[test]
    fn test_start_while_running_is_ignored() {
        let mut h = harness(Some(full_calibration()), vec![Some(PieceType::Orange); 2]);
        h.on_fetch(1, Command::Start);
        h.stop_after_script();
        assert_eq!(h.run(), SessionEnd::Stopped);
        assert_eq!(h.bot.stats().snapshot().pieces_discarded, 2);
    }

    #[test]
    fn test_home_resumes_after_supply_empty() {
        let mut h = harness(
            Some(full_calibration()),
            vec![None, None, None, Some(PieceType::Orange)],
        );
        h.on_fetch(3, Command::Start);
        h.stop_after_script();
        assert_eq!(h.run(), SessionEnd::Stopped);

        assert_eq!(h.world.lock().unwrap().fetches, 4);
        assert_eq!(h.world.lock().unwrap().scans, 2);
        assert_eq!(h.bot.stats().snapshot().pieces_discarded, 1);
        let states = h.sink.states();
        let paused = states.iter().position(|s| *s == BotState::Paused).unwrap();
        assert_eq!(states[paused + 1], BotState::Running);
    }

    #[test]
    fn test_no_free_slot_falls_back_to_discard() {
        let mut h = harness(
            Some(full_calibration()),
            vec![Some(PieceType::Red), Some(PieceType::Orange)],
        );
        {
            // One stray cell in each red slot: red count stays 0, no red slot is free.
            let mut w = h.world.lock().unwrap();
            w.scan[0][0] = Some(PieceType::Blue);
            w.scan[3][1] = Some(PieceType::Green);
        }
        h.stop_after_script();
        assert_eq!(h.run(), SessionEnd::Stopped);

        let stats = h.bot.stats().snapshot();
        assert_eq!(stats.pieces_placed, 0);
        assert_eq!(stats.pieces_discarded, 2);
        assert_eq!(h.count(|a| matches!(a, Action::Place(_))), 0);
        // The loop keeps going after the fallback and handles the next piece.
        assert_eq!(h.world.lock().unwrap().fetches, 2);

        let updates = h.sink.updates.lock().unwrap().clone();
        let placing = updates.iter().position(|u| u.state == BotState::Placing).unwrap();
        assert_eq!(updates[placing].message, "placing RED...");
        assert_eq!(updates[placing + 1].state, BotState::Discarding);
    }

    #[test]
    fn test_quit_ends_session() {
        let mut h = harness(Some(full_calibration()), vec![Some(PieceType::Orange); 3]);
        h.on_fetch(1, Command::Quit);
        assert_eq!(h.run(), SessionEnd::Quit);
        assert_eq!(h.world.lock().unwrap().fetches, 1);
    }

    #[test]
    fn test_transitions_follow_table() {
        let mut h = harness(
            Some(full_calibration()),
            vec![Some(PieceType::Red), None, None, None, Some(PieceType::Orange)],
        );
        h.on_fetch(4, Command::Resume);
        h.stop_after_script();
        h.run();

        let states = h.sink.states();
        assert_eq!(states[0], BotState::Idle);
        for pair in states.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }
}
