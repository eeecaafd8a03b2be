use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

use crate::bot::{Bot, SessionEnd};
use crate::types::Command;
use crate::logger;

/// Worker loop: wait for `Start`, run a session, go back to waiting.
/// Returns on `Quit` or when every sender is gone.
pub fn supervise(bot: &mut Bot, cmd_rx: &Receiver<Command>) {
    loop {
        match cmd_rx.recv() {
            Ok(Command::Start) => {
                logger::info_p("bot", "session starting");
                match bot.run_session(cmd_rx) {
                    SessionEnd::Quit => break,
                    SessionEnd::Failed => logger::warn_p("bot", "session failed to start"),
                    SessionEnd::Stopped => {
                        let s = bot.stats().snapshot();
                        logger::info_p(
                            "bot",
                            &format!(
                                "session ended: {} board(s), {} placed, {} discarded",
                                s.boards_completed, s.pieces_placed, s.pieces_discarded
                            ),
                        );
                    }
                }
            }
            Ok(Command::Quit) | Err(_) => break,
            Ok(other) => logger::debug_p("bot", &format!("ignoring {:?} while idle", other)),
        }
    }
    logger::info("supervisor shutting down");
}

/// Run `supervise` on a background thread that owns the bot.
pub fn spawn(mut bot: Bot, cmd_rx: Receiver<Command>) -> JoinHandle<()> {
    thread::spawn(move || supervise(&mut bot, &cmd_rx))
}
