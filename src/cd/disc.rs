//! CD-ROM disc image loading: cue sheet parsing plus sector-level reads.
//!
//! Supports the common CUE/BIN layout (one or more raw `.bin` tracks
//! described by a `.cue` sheet). CHD and other compressed formats are not
//! supported; callers that need them can convert to CUE/BIN ahead of time.

use bincode::{Decode, Encode};
use std::fmt::{Display, Formatter};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::ops::{Add, Sub};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BYTES_PER_SECTOR: usize = 2352;
const FRAMES_PER_SECOND: u32 = 75;
const SECONDS_PER_MINUTE: u32 = 60;
// Track 1 INDEX 01 is conventionally addressed at 00:02:00 (the disc lead-in).
const LEAD_IN_FRAMES: u32 = 2 * FRAMES_PER_SECOND;

#[derive(Debug, Error)]
pub enum CdRomError {
    #[error("I/O error reading CD-ROM image: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid cue sheet: {0}")]
    CueParse(String),
    #[error("No such track: {0}")]
    TrackNotFound(u8),
}

pub type CdRomResult<T> = Result<T, CdRomError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode)]
pub struct CdTime {
    frames: u32,
}

impl CdTime {
    pub const ZERO: Self = Self { frames: 0 };

    #[must_use]
    pub fn new(minutes: u8, seconds: u8, frames: u8) -> Self {
        Self::new_checked(minutes, seconds, frames)
            .unwrap_or_else(|| panic!("invalid CD-ROM time {minutes:02}:{seconds:02}:{frames:02}"))
    }

    #[must_use]
    pub fn new_checked(minutes: u8, seconds: u8, frames: u8) -> Option<Self> {
        if seconds >= SECONDS_PER_MINUTE as u8 || frames >= FRAMES_PER_SECOND as u8 {
            return None;
        }

        let total = u32::from(minutes) * SECONDS_PER_MINUTE * FRAMES_PER_SECOND
            + u32::from(seconds) * FRAMES_PER_SECOND
            + u32::from(frames);
        Some(Self { frames: total })
    }

    #[must_use]
    pub fn from_frames(frames: u32) -> Self {
        Self { frames }
    }

    #[must_use]
    pub fn to_sector_number(self) -> u32 {
        self.frames
    }

    #[must_use]
    pub fn minutes(self) -> u8 {
        (self.frames / (SECONDS_PER_MINUTE * FRAMES_PER_SECOND)) as u8
    }

    #[must_use]
    pub fn seconds(self) -> u8 {
        ((self.frames / FRAMES_PER_SECOND) % SECONDS_PER_MINUTE) as u8
    }

    #[must_use]
    pub fn frames(self) -> u8 {
        (self.frames % FRAMES_PER_SECOND) as u8
    }
}

impl Display for CdTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.minutes(), self.seconds(), self.frames())
    }
}

impl Add for CdTime {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self { frames: self.frames + rhs.frames }
    }
}

impl Sub for CdTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self { frames: self.frames.saturating_sub(rhs.frames) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum TrackMode {
    Mode1,
    Mode2,
    Audio,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Track {
    pub number: u8,
    pub mode: TrackMode,
    pub start_time: CdTime,
    length_sectors: u32,
    file_path: String,
    file_start_sector: u32,
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct CueSheet {
    tracks: Vec<Track>,
}

impl CueSheet {
    #[must_use]
    pub fn track(&self, track_number: u8) -> &Track {
        self.tracks
            .iter()
            .find(|track| track.number == track_number)
            .unwrap_or_else(|| panic!("no such track: {track_number}"))
    }

    #[must_use]
    pub fn find_track_by_time(&self, time: CdTime) -> Option<&Track> {
        self.tracks.iter().find(|track| {
            let relative = time.frames.saturating_sub(track.start_time.frames);
            relative < track.length_sectors
        })
    }
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct CdRom {
    cue_sheet: CueSheet,
}

struct RawTrack {
    number: u8,
    mode: TrackMode,
    file_path: PathBuf,
    file_start_sector: u32,
}

impl CdRom {
    /// Loads a CUE/BIN disc image from the given `.cue` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cue sheet cannot be read or parsed, or if a
    /// referenced `.bin` file cannot be opened.
    pub fn open(cue_path: impl AsRef<Path>) -> CdRomResult<Self> {
        let cue_path = cue_path.as_ref();
        let cue_text = fs::read_to_string(cue_path)?;
        let cue_dir = cue_path.parent().unwrap_or_else(|| Path::new("."));

        let raw_tracks = parse_cue_sheet(&cue_text, cue_dir)?;
        let cue_sheet = build_cue_sheet(raw_tracks)?;

        Ok(Self { cue_sheet })
    }

    #[must_use]
    pub fn cue(&self) -> &CueSheet {
        &self.cue_sheet
    }

    /// Reads a 2352-byte raw sector at `relative_time` (relative to the
    /// start of `track_number`) into `out`.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors reading from the backing `.bin` file.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than [`BYTES_PER_SECTOR`].
    pub fn read_sector(
        &self,
        track_number: u8,
        relative_time: CdTime,
        out: &mut [u8],
    ) -> CdRomResult<()> {
        let track = self
            .cue_sheet
            .tracks
            .iter()
            .find(|track| track.number == track_number)
            .ok_or(CdRomError::TrackNotFound(track_number))?;

        let sector_number = track.file_start_sector + relative_time.to_sector_number();
        let byte_offset = u64::from(sector_number) * BYTES_PER_SECTOR as u64;

        let mut file = File::open(&track.file_path)?;
        file.seek(SeekFrom::Start(byte_offset))?;
        file.read_exact(&mut out[..BYTES_PER_SECTOR])?;

        Ok(())
    }
}

fn parse_cue_sheet(cue_text: &str, cue_dir: &Path) -> CdRomResult<Vec<RawTrack>> {
    let mut raw_tracks = Vec::new();
    let mut current_file: Option<PathBuf> = None;
    let mut pending_track: Option<(u8, TrackMode)> = None;

    for line in cue_text.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("FILE") {
            let path = rest
                .split('"')
                .nth(1)
                .ok_or_else(|| CdRomError::CueParse(format!("malformed FILE line: {line}")))?;
            current_file = Some(cue_dir.join(path));
        } else if let Some(rest) = line.strip_prefix("TRACK") {
            let mut fields = rest.split_whitespace();
            let number: u8 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| CdRomError::CueParse(format!("malformed TRACK line: {line}")))?;
            let mode_str = fields
                .next()
                .ok_or_else(|| CdRomError::CueParse(format!("malformed TRACK line: {line}")))?;
            let mode = parse_track_mode(mode_str)?;
            pending_track = Some((number, mode));
        } else if let Some(rest) = line.strip_prefix("INDEX") {
            let mut fields = rest.split_whitespace();
            let index_number: u8 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| CdRomError::CueParse(format!("malformed INDEX line: {line}")))?;
            if index_number != 1 {
                // INDEX 00 (pregap) is not tracked separately; reads within
                // the pregap simply fall outside any track's sector range.
                continue;
            }

            let time_str = fields
                .next()
                .ok_or_else(|| CdRomError::CueParse(format!("malformed INDEX line: {line}")))?;
            let file_start_sector = parse_msf(time_str)?;

            let (number, mode) = pending_track
                .take()
                .ok_or_else(|| CdRomError::CueParse("INDEX without TRACK".to_string()))?;
            let file_path = current_file
                .clone()
                .ok_or_else(|| CdRomError::CueParse("TRACK without FILE".to_string()))?;

            raw_tracks.push(RawTrack { number, mode, file_path, file_start_sector });
        }
    }

    if raw_tracks.is_empty() {
        return Err(CdRomError::CueParse("cue sheet contains no tracks".to_string()));
    }

    Ok(raw_tracks)
}

fn parse_track_mode(mode_str: &str) -> CdRomResult<TrackMode> {
    match mode_str {
        "MODE1/2352" | "MODE1/2048" => Ok(TrackMode::Mode1),
        "MODE2/2352" | "MODE2/2336" => Ok(TrackMode::Mode2),
        "AUDIO" => Ok(TrackMode::Audio),
        _ => Err(CdRomError::CueParse(format!("unsupported track mode: {mode_str}"))),
    }
}

fn parse_msf(time_str: &str) -> CdRomResult<u32> {
    let parts: Vec<&str> = time_str.split(':').collect();
    let [m, s, f] = parts[..] else {
        return Err(CdRomError::CueParse(format!("malformed MSF time: {time_str}")));
    };
    let parse = |s: &str| {
        s.parse::<u32>().map_err(|_| CdRomError::CueParse(format!("malformed MSF time: {time_str}")))
    };
    Ok(parse(m)? * SECONDS_PER_MINUTE * FRAMES_PER_SECOND + parse(s)? * FRAMES_PER_SECOND + parse(f)?)
}

fn build_cue_sheet(raw_tracks: Vec<RawTrack>) -> CdRomResult<CueSheet> {
    let mut tracks = Vec::with_capacity(raw_tracks.len());
    let mut absolute_cursor = LEAD_IN_FRAMES;

    for (i, raw) in raw_tracks.iter().enumerate() {
        let length_sectors = if let Some(next) = raw_tracks.get(i + 1) {
            if next.file_path == raw.file_path {
                next.file_start_sector - raw.file_start_sector
            } else {
                file_length_sectors(&raw.file_path)? - raw.file_start_sector
            }
        } else {
            file_length_sectors(&raw.file_path)? - raw.file_start_sector
        };

        tracks.push(Track {
            number: raw.number,
            mode: raw.mode,
            start_time: CdTime::from_frames(absolute_cursor),
            length_sectors,
            file_path: raw.file_path.to_string_lossy().into_owned(),
            file_start_sector: raw.file_start_sector,
        });

        absolute_cursor += length_sectors;
    }

    Ok(CueSheet { tracks })
}

fn file_length_sectors(path: &Path) -> CdRomResult<u32> {
    let metadata = fs::metadata(path)?;
    Ok((metadata.len() / BYTES_PER_SECTOR as u64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cd_time_arithmetic() {
        let a = CdTime::new(0, 1, 0);
        let b = CdTime::new(0, 0, 30);
        assert_eq!(a - b, CdTime::new(0, 0, 45));
        assert_eq!(b + b, CdTime::new(0, 1, 0));
    }

    #[test]
    fn cd_time_checked_rejects_overflow() {
        assert!(CdTime::new_checked(0, 60, 0).is_none());
        assert!(CdTime::new_checked(0, 0, 75).is_none());
        assert!(CdTime::new_checked(0, 59, 74).is_some());
    }

    #[test]
    fn parses_single_track_mode1_cue() {
        let dir = std::env::temp_dir().join("ps1_core_disc_test");
        fs::create_dir_all(&dir).unwrap();
        let bin_path = dir.join("track01.bin");
        fs::write(&bin_path, vec![0u8; BYTES_PER_SECTOR * 4]).unwrap();

        let cue_text = "FILE \"track01.bin\" BINARY\n  TRACK 01 MODE1/2352\n    INDEX 01 00:00:00\n";
        let raw = parse_cue_sheet(cue_text, &dir).unwrap();
        let cue_sheet = build_cue_sheet(raw).unwrap();

        let track = cue_sheet.track(1);
        assert_eq!(track.mode, TrackMode::Mode1);
        assert_eq!(track.start_time, CdTime::new(0, 2, 0));

        let found = cue_sheet.find_track_by_time(CdTime::new(0, 2, 1)).unwrap();
        assert_eq!(found.number, 1);
    }
}
