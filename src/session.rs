//! Headless session driver.
//!
//! Owns one [`GameState`] and turns protocol lines into engine calls. Time is
//! whatever the caller says it is: every command carries its own tick count.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::core::{GameConfig, GameState, Step};
use crate::protocol::{
    build_lock_record, build_observation, parse_command, Command, ErrorMessage,
    ObservationMessage,
};
use crate::types::MAX_START_LEVEL;

/// Driver settings, from the environment and then the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub seed: u32,
    pub start_level: u32,
    pub log_path: Option<String>,
    pub quiet: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            start_level: 0,
            log_path: None,
            quiet: false,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let seed = lookup("BLOCKFALL_SEED")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.seed);

        let start_level = lookup("BLOCKFALL_START_LEVEL")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(defaults.start_level)
            .min(MAX_START_LEVEL);

        let log_path = lookup("BLOCKFALL_LOG_PATH")
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        let quiet = lookup("BLOCKFALL_QUIET")
            .map(|s| matches!(s.trim(), "1" | "true"))
            .unwrap_or(defaults.quiet);

        Self {
            seed,
            start_level,
            log_path,
            quiet,
        }
    }

    /// Override fields with `--seed N`, `--level N`, `--log PATH` and `--quiet`.
    pub fn apply_args(mut self, args: &[String]) -> Result<Self> {
        let mut i = 0usize;
        while i < args.len() {
            match args[i].as_str() {
                "--seed" => {
                    i += 1;
                    let v = args
                        .get(i)
                        .ok_or_else(|| anyhow!("missing value for --seed"))?;
                    self.seed = v
                        .parse::<u32>()
                        .map_err(|_| anyhow!("invalid --seed value: {}", v))?;
                }
                "--level" => {
                    i += 1;
                    let v = args
                        .get(i)
                        .ok_or_else(|| anyhow!("missing value for --level"))?;
                    let level = v
                        .parse::<u32>()
                        .map_err(|_| anyhow!("invalid --level value: {}", v))?;
                    self.start_level = level.min(MAX_START_LEVEL);
                }
                "--log" => {
                    i += 1;
                    let v = args
                        .get(i)
                        .ok_or_else(|| anyhow!("missing value for --log"))?;
                    self.log_path = Some(v.clone());
                }
                "--quiet" => self.quiet = true,
                other => {
                    return Err(anyhow!("unknown argument: {}", other));
                }
            }
            i += 1;
        }

        Ok(self)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            seed: self.seed,
            start_level: self.start_level,
        }
    }
}

/// One outbound line
#[derive(Debug, Clone)]
pub enum Reply {
    Observation(ObservationMessage),
    Error(ErrorMessage),
}

impl Reply {
    pub fn to_line(&self) -> Result<String> {
        let line = match self {
            Reply::Observation(m) => serde_json::to_string(m)?,
            Reply::Error(m) => serde_json::to_string(m)?,
        };
        Ok(line)
    }
}

/// Appends one JSON object per line
#[derive(Debug)]
struct EventLog {
    out: BufWriter<File>,
    buf: Vec<u8>,
}

impl EventLog {
    fn open(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening event log {}", path))?;
        Ok(Self {
            out: BufWriter::new(file),
            buf: Vec::with_capacity(256),
        })
    }

    fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        self.buf.clear();
        serde_json::to_writer(&mut self.buf, record)?;
        self.buf.push(b'\n');
        self.out.write_all(&self.buf)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Session {
    game: GameState,
    quiet: bool,
    seq: u64,
    event_log: Option<EventLog>,
    game_over_reported: bool,
    finished: bool,
}

impl Session {
    /// Start a session; opens the event log if one is configured.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let game = GameState::with_config(config.game_config());
        let mut session = Self::with_game(game, config.quiet);
        if let Some(path) = config.log_path.as_deref() {
            session.event_log = Some(EventLog::open(path)?);
        }
        session.diag(&format!(
            "session start seed={} level={}",
            config.seed, config.start_level
        ));
        Ok(session)
    }

    /// Drive an existing game without an event log
    pub fn with_game(game: GameState, quiet: bool) -> Self {
        Self {
            game,
            quiet,
            seq: 0,
            event_log: None,
            game_over_reported: false,
            finished: false,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// A quit intent has been seen; no further lines are handled.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Handle one inbound line. Blank lines produce no reply.
    pub fn handle_line(&mut self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || self.finished {
            return None;
        }

        let command = match parse_command(line) {
            Ok(c) => c,
            Err(e) => {
                self.diag(&format!("rejected line: {}", e.message));
                return Some(Reply::Error(e));
            }
        };

        self.seq += 1;
        let obs = match command {
            Command::NewGame => {
                self.game.new_game();
                self.game_over_reported = false;
                self.diag(&format!("new game episode={}", self.game.episode_id()));
                build_observation(&self.game.snapshot(), self.seq, None)
            }
            Command::Advance { ticks, intents } => {
                let report = self.game.advance(ticks, intents.as_slice());
                // Only a lock from this command is reported.
                let event = self.game.take_last_event().filter(|_| report.locks > 0);
                let mut snap = self.game.snapshot();
                snap.last_event = event;

                if let Some(event) = event {
                    let record = build_lock_record(event, &snap, self.seq, report.locks);
                    self.log_event(&record);
                }
                if report.step == Step::Quit {
                    self.finished = true;
                    self.diag(&format!("quit score={} lines={}", snap.score, snap.lines));
                }
                build_observation(&snap, self.seq, Some(&report))
            }
        };

        if obs.game_over && !self.game_over_reported {
            self.game_over_reported = true;
            self.diag(&format!(
                "game over score={} level={} lines={}",
                obs.score, obs.level, obs.lines
            ));
        }

        Some(Reply::Observation(obs))
    }

    fn log_event<T: Serialize>(&mut self, record: &T) {
        let Some(log) = self.event_log.as_mut() else {
            return;
        };
        if let Err(e) = log.write(record) {
            self.event_log = None;
            self.diag(&format!("event log disabled: {:#}", e));
        }
    }

    fn diag(&self, msg: &str) {
        if !self.quiet {
            eprintln!("[blockfall] {}", msg);
        }
    }
}
