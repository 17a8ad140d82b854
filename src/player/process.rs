// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    io,
    path::Path,
    process::{Child, Command, Stdio},
};

use tracing::{debug, error};

/// Where a player process is in its life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    /// The process ended by itself. None if it was ended by a signal we didn't send.
    Exited(Option<i32>),
    /// We killed it.
    Killed,
}

/// Supervises one external player process. Killed on drop if still running.
pub struct PlayerProcess {
    child: Child,
    state: ProcessState,
}

impl PlayerProcess {
    /// Starts `<command> <args...> <path>` without waiting for it.
    pub fn spawn(command: &str, args: &[String], path: &Path) -> Result<PlayerProcess, io::Error> {
        let child = Command::new(command)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        debug!(command, pid = child.id(), "Player started.");

        Ok(PlayerProcess {
            child,
            state: ProcessState::Running,
        })
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Checks whether a running process has exited, without blocking.
    pub fn poll(&mut self) -> ProcessState {
        if self.state == ProcessState::Running {
            self.state = match self.child.try_wait() {
                Ok(Some(status)) => ProcessState::Exited(status.code()),
                Ok(None) => ProcessState::Running,
                Err(e) => {
                    error!(err = %e, "Unable to check on the player, giving up on it.");
                    self.kill()
                }
            };
        }
        self.state
    }

    /// Terminates a running process and reaps it. Does nothing once it has exited.
    pub fn kill(&mut self) -> ProcessState {
        if self.state != ProcessState::Running {
            return self.state;
        }

        if let Err(e) = self.child.kill() {
            // Most likely it exited between the last poll and now.
            debug!(err = %e, "Unable to kill player.");
        }
        if let Err(e) = self.child.wait() {
            error!(err = %e, "Unable to reap player.");
        }
        self.state = ProcessState::Killed;
        self.state
    }
}

impl Drop for PlayerProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(test)]
mod test {
    use std::{
        path::Path,
        thread,
        time::{Duration, Instant},
    };

    use super::{PlayerProcess, ProcessState};

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_exit() -> Result<(), std::io::Error> {
        let mut process = PlayerProcess::spawn("sh", &sh("exit 3"), Path::new("track.mp3"))?;
        let start = Instant::now();
        while process.poll() == ProcessState::Running {
            assert!(
                start.elapsed() < Duration::from_secs(3),
                "player never exited"
            );
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(ProcessState::Exited(Some(3)), process.state());

        // Killing an exited process changes nothing.
        assert_eq!(ProcessState::Exited(Some(3)), process.kill());
        Ok(())
    }

    #[test]
    fn test_kill() -> Result<(), std::io::Error> {
        let mut process = PlayerProcess::spawn("sh", &sh("sleep 10"), Path::new("track.mp3"))?;
        assert_eq!(ProcessState::Running, process.poll());

        let start = Instant::now();
        assert_eq!(ProcessState::Killed, process.kill());
        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(ProcessState::Killed, process.poll());
        Ok(())
    }

    #[test]
    fn test_missing_binary() {
        let spawned = PlayerProcess::spawn("/nonexistent/ffplay", &[], Path::new("track.mp3"));
        assert!(spawned.is_err());
    }
}
