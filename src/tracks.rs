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
    fs, io,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::util;

/// Extensions the player is handed.
const TRACK_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// The songs directory. Nothing is cached: every lookup reads the directory again, so files
/// dropped in by the upload service show up straight away.
#[derive(Clone, Debug)]
pub struct Tracks {
    dir: PathBuf,
}

impl Tracks {
    pub fn new(dir: &Path) -> Tracks {
        Tracks {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every track file with its number, sorted by file name.
    pub fn list(&self) -> Result<Vec<(u32, PathBuf)>, io::Error> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.is_file())
            .filter(|path| util::has_extension(path, &TRACK_EXTENSIONS))
            .collect();
        paths.sort();

        Ok(paths
            .into_iter()
            .filter_map(|path| {
                // Only canonical numbers, so "07_" never lists a track 7 that resolve can't find.
                let prefix = util::underscore_prefix(&path)?;
                let number = prefix
                    .parse::<u32>()
                    .ok()
                    .filter(|number| number.to_string() == prefix)?;
                Some((number, path))
            })
            .collect())
    }

    /// Finds the file for a track number. With several candidates the first by file name
    /// wins.
    pub fn resolve(&self, number: u32) -> Option<PathBuf> {
        let tracks = match self.list() {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(dir = ?self.dir, err = %e, "Unable to read songs directory.");
                return None;
            }
        };

        let prefix = format!("{}_", number);
        let mut matches = tracks
            .into_iter()
            .map(|(_, path)| path)
            .filter(|path| util::filename_display(path).starts_with(&prefix));
        let first = matches.next()?;
        let others = matches.count();
        if others > 0 {
            warn!(
                number,
                chosen = util::filename_display(&first),
                others,
                "Several files match the track number."
            );
        }
        Some(first)
    }

    /// The distinct track numbers present, ascending.
    pub fn numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = match self.list() {
            Ok(tracks) => tracks.into_iter().map(|(number, _)| number).collect(),
            Err(e) => {
                warn!(dir = ?self.dir, err = %e, "Unable to read songs directory.");
                Vec::new()
            }
        };
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }
}
