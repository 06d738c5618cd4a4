//! Checksummed save files for a game in progress plus the player's badges.
//!
//! Layout:
//! ```text
//! 4 magic "B2S1" | 1 version | postcard(Snapshot) | 4 CRC32C (LE) of all preceding bytes
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::badges::BadgeSet;
use crate::game::GameState;

const MAGIC: &[u8; 4] = b"B2S1";
const VERSION: u8 = 2;
const HEADER_LEN: usize = 4 + 1;
const TRAILER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub saved_unix_s: u64,
    pub game: GameState,
    pub badges: BadgeSet,
}

impl Snapshot {
    /// Snapshot stamped with the current wall-clock time.
    pub fn now(game: GameState, badges: BadgeSet) -> Self {
        Snapshot { saved_unix_s: now_unix_seconds(), game, badges }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
}

pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, SnapshotError> {
    let body = postcard::to_allocvec(snapshot)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + body.len() + TRAILER_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&body);
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(SnapshotError::Malformed);
    }

    // Validate checksum first so a corrupt body never reaches postcard
    let (content, trailer) = bytes.split_at(bytes.len() - TRAILER_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) {
        return Err(SnapshotError::Checksum);
    }

    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(SnapshotError::MagicOrVersion);
    }
    Ok(postcard::from_bytes(&content[HEADER_LEN..])?)
}

pub fn write_to_path<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let data = encode(snapshot)?;
    let mut f = fs::File::create(path.as_ref())?;
    f.write_all(&data)?;
    tracing::debug!(path = %path.as_ref().display(), bytes = data.len(), "snapshot written");
    Ok(())
}

pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Snapshot, SnapshotError> {
    let data = fs::read(path.as_ref())?;
    let snapshot = decode(&data)?;
    tracing::debug!(path = %path.as_ref().display(), score = snapshot.game.score, "snapshot loaded");
    Ok(snapshot)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badges::{unlock_for_score, MintRecord, Tier};
    use crate::engine::Board;
    use crate::game::Status;
    use tempfile::NamedTempFile;

    fn sample() -> Snapshot {
        let board = Board::from_rows([[2, 4, 8, 16], [0, 0, 1024, 0], [0; 4], [0, 0, 0, 2048]]).unwrap();
        let badges = unlock_for_score(3000, &BadgeSet::default()).badges;
        let badges = badges.claim(Tier::Bronze, 1_700_000_000).unwrap();
        let badges = badges
            .record_mint(Tier::Bronze, MintRecord { tx_hash: "0xfeed".into(), token_id: Some(3), minted_at: 1_700_000_050 })
            .unwrap();
        Snapshot {
            saved_unix_s: 1_700_000_123,
            game: GameState { board, score: 3000, status: Status::Playing },
            badges,
        }
    }

    #[test]
    fn round_trip_file() {
        let snap = sample();
        let tmp = NamedTempFile::new().unwrap();
        write_to_path(tmp.path(), &snap).unwrap();
        assert_eq!(read_from_path(tmp.path()).unwrap(), snap);
    }

    #[test]
    fn checksum_mismatch() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[HEADER_LEN + 1] ^= 0xFF;
        assert!(matches!(decode(&bytes), Err(SnapshotError::Checksum)));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[4] = VERSION + 1;
        let len = bytes.len();
        let crc = crc32c::crc32c(&bytes[..len - TRAILER_LEN]);
        bytes[len - TRAILER_LEN..].copy_from_slice(&crc.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SnapshotError::MagicOrVersion)));
    }

    #[test]
    fn truncated_input_is_malformed() {
        assert!(matches!(decode(b"B2S"), Err(SnapshotError::Malformed)));
        let bytes = encode(&sample()).unwrap();
        assert!(matches!(decode(&bytes[..bytes.len() - 3]), Err(SnapshotError::Checksum)));
    }

    #[test]
    fn partial_badge_list_is_normalized_on_load() {
        let game = GameState { board: Board::EMPTY, score: 0, status: Status::Playing };
        let partial = PartialSnapshot { saved_unix_s: 9, game, badges: Vec::new() };
        let body = postcard::to_allocvec(&partial).unwrap();
        let mut bytes = MAGIC.to_vec();
        bytes.push(VERSION);
        bytes.extend_from_slice(&body);
        let crc = crc32c::crc32c(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());

        let snap = decode(&bytes).unwrap();
        assert_eq!(snap.badges, BadgeSet::default());
    }

    #[derive(Serialize)]
    struct PartialSnapshot {
        saved_unix_s: u64,
        game: GameState,
        badges: Vec<crate::badges::Badge>,
    }
}
