//! Top-five score table persisted as a raw block of fixed-size records.
//!
//! File layout: five 24-byte records, each a NUL-padded 20-byte name followed
//! by a native-endian `i32` score. No header, no checksum. The table is kept
//! sorted by score descending, ties by name ascending (byte-wise).

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::Path;

use crate::entities::bounded_name;

pub const SLOTS: usize = 5;
pub const NAME_BYTES: usize = 20;
pub const RECORD_BYTES: usize = std::mem::size_of::<LeaderboardEntry>();
pub const FILE_BYTES: usize = RECORD_BYTES * SLOTS;

const SEED: [(&str, i32); SLOTS] = [
    ("Junior", 50),
    ("Alerrandro", 40),
    ("Adalberto", 110),
    ("Dalessandro", 120),
    ("Fernandao", 150),
];

#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LeaderboardEntry {
    name: [u8; NAME_BYTES],
    pub points: i32,
}

impl LeaderboardEntry {
    pub fn new(name: &str, points: i32) -> Self {
        let mut bytes = [0u8; NAME_BYTES];
        let name = bounded_name(name);
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Self {
            name: bytes,
            points,
        }
    }

    /// Name bytes up to the first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_BYTES);
        &self.name[..end]
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    fn rank(&self, other: &Self) -> Ordering {
        other
            .points
            .cmp(&self.points)
            .then_with(|| self.name_bytes().cmp(other.name_bytes()))
    }
}

impl std::fmt::Debug for LeaderboardEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardEntry")
            .field("name", &self.name())
            .field("points", &self.points)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    entries: [LeaderboardEntry; SLOTS],
}

impl Leaderboard {
    pub fn seed() -> Self {
        let mut board = Self {
            entries: SEED.map(|(name, points)| LeaderboardEntry::new(name, points)),
        };
        board.sort();
        board
    }

    pub fn entries(&self) -> &[LeaderboardEntry; SLOTS] {
        &self.entries
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(LeaderboardEntry::rank);
    }

    /// Overwrite the lowest slot with `candidate` and re-sort. A candidate
    /// that ranks below every entry is dropped.
    pub fn insert(&mut self, candidate: LeaderboardEntry) {
        self.sort();
        self.entries[SLOTS - 1] = candidate;
        self.sort();
    }

    /// Decode a file image. Returns `None` when fewer than five records are present.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < FILE_BYTES {
            return None;
        }
        let mut entries = [LeaderboardEntry::new("", 0); SLOTS];
        for (slot, chunk) in entries.iter_mut().zip(bytes.chunks_exact(RECORD_BYTES)) {
            *slot = bytemuck::pod_read_unaligned(chunk);
        }
        Some(Self { entries })
    }

    pub fn to_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} holds {} bytes, expected {FILE_BYTES}",
                    path.display(),
                    bytes.len()
                ),
            )
        })
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_bytes())
    }

    /// Read the table, or write and return the seed table when the file is
    /// missing or short.
    pub fn load_or_seed(path: &Path) -> Self {
        match Self::load(path) {
            Ok(board) => board,
            Err(err) => {
                log::info!(
                    "Leaderboard '{}' unavailable ({err}); creating it with seed scores.",
                    path.display()
                );
                let board = Self::seed();
                if let Err(err) = board.save(path) {
                    log::error!("Failed to write leaderboard '{}': {err}", path.display());
                }
                board
            }
        }
    }

    /// Register a finished run and persist the result. Write failures are
    /// logged; the updated table is returned either way.
    pub fn record(path: &Path, name: &str, points: i32) -> Self {
        let mut board = Self::load_or_seed(path);
        board.insert(LeaderboardEntry::new(name, points));
        match board.save(path) {
            Ok(()) => log::info!(
                "Score {points} for '{}' saved to '{}'",
                bounded_name(name),
                path.display()
            ),
            Err(err) => log::error!("Failed to write leaderboard '{}': {err}", path.display()),
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "infman_leaderboard_test_{}_{}_{}.bin",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn scores(board: &Leaderboard) -> Vec<i32> {
        board.entries().iter().map(|e| e.points).collect()
    }

    fn names(board: &Leaderboard) -> Vec<String> {
        board.entries().iter().map(|e| e.name().into_owned()).collect()
    }

    #[test]
    fn record_layout_is_24_bytes() {
        assert_eq!(RECORD_BYTES, 24);
        assert_eq!(FILE_BYTES, 120);
    }

    #[test]
    fn seed_is_sorted_descending() {
        let board = Leaderboard::seed();
        assert_eq!(scores(&board), vec![150, 120, 110, 50, 40]);
        assert_eq!(names(&board)[0], "Fernandao");
    }

    #[test]
    fn insert_displaces_lowest_score() {
        let mut board = Leaderboard::seed();
        board.insert(LeaderboardEntry::new("Nova", 125));
        assert_eq!(scores(&board), vec![150, 125, 120, 110, 50]);
        assert_eq!(names(&board)[1], "Nova");
    }

    #[test]
    fn outscored_candidate_is_dropped() {
        let mut board = Leaderboard::seed();
        board.insert(LeaderboardEntry::new("Late", 10));
        assert_eq!(board, Leaderboard::seed());
    }

    #[test]
    fn score_ties_order_by_name() {
        let mut board = Leaderboard::seed();
        board.insert(LeaderboardEntry::new("Bia", 120));
        assert_eq!(scores(&board), vec![150, 120, 120, 110, 50]);
        assert_eq!(names(&board)[1], "Bia");
        assert_eq!(names(&board)[2], "Dalessandro");

        board.insert(LeaderboardEntry::new("Zed", 150));
        assert_eq!(names(&board)[0], "Fernandao");
        assert_eq!(names(&board)[1], "Zed");
    }

    #[test]
    fn long_names_are_bounded() {
        let entry = LeaderboardEntry::new("abcdefghijklmnopqrstuvwxyz", 1);
        assert_eq!(entry.name(), "abcdefghijklmnopqrs");
        assert_eq!(entry.name_bytes().len(), 19);
    }

    #[test]
    fn file_round_trip_and_missing_file_seeds() {
        let path = temp_file_path("seed");
        let board = Leaderboard::load_or_seed(&path);
        assert_eq!(board, Leaderboard::seed());
        assert_eq!(fs::read(&path).expect("seed file written").len(), FILE_BYTES);

        let recorded = Leaderboard::record(&path, "Ana", 300);
        let reloaded = Leaderboard::load(&path).expect("file readable");
        assert_eq!(recorded, reloaded);
        assert_eq!(scores(&reloaded), vec![300, 150, 120, 110, 50]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn short_file_is_replaced_with_seed() {
        let path = temp_file_path("short");
        fs::write(&path, [0u8; 30]).expect("write short file");
        assert!(Leaderboard::load(&path).is_err());

        let board = Leaderboard::load_or_seed(&path);
        assert_eq!(board, Leaderboard::seed());
        assert!(Leaderboard::load(&path).is_ok());

        let _ = fs::remove_file(path);
    }
}
