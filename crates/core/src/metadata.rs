use crate::exif_reader::parse_date;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Which file timestamp a date variable reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeAttr {
    Modified,
    Birth,
    Access,
    Change,
    Now,
}

impl TimeAttr {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "mtime" => Some(Self::Modified),
            "btime" => Some(Self::Birth),
            "atime" => Some(Self::Access),
            "ctime" => Some(Self::Change),
            "now" => Some(Self::Now),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateToken {
    Year,
    YearShort,
    MonthName,
    MonthAbbr,
    MonthPadded,
    Month,
    WeekdayName,
    WeekdayAbbr,
    DayPadded,
    Day,
    Hour24,
    Hour12Padded,
    Hour12,
    MinutePadded,
    Minute,
    SecondPadded,
    Second,
    MeridiemUpper,
    MeridiemLower,
    Unix,
}

impl DateToken {
    pub fn from_token(token: &str) -> Option<Self> {
        let parsed = match token {
            "YYYY" => Self::Year,
            "YY" => Self::YearShort,
            "MMMM" => Self::MonthName,
            "MMM" => Self::MonthAbbr,
            "MM" => Self::MonthPadded,
            "M" => Self::Month,
            "DDDD" => Self::WeekdayName,
            "DDD" => Self::WeekdayAbbr,
            "DD" => Self::DayPadded,
            "D" => Self::Day,
            "H" => Self::Hour24,
            "hh" => Self::Hour12Padded,
            "h" => Self::Hour12,
            "mm" => Self::MinutePadded,
            "m" => Self::Minute,
            "ss" => Self::SecondPadded,
            "s" => Self::Second,
            "A" => Self::MeridiemUpper,
            "a" => Self::MeridiemLower,
            "unix" => Self::Unix,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn format(self, date: &DateTime<Local>) -> String {
        let pattern = match self {
            Self::Unix => return date.timestamp().to_string(),
            Self::Year => "%Y",
            Self::YearShort => "%y",
            Self::MonthName => "%B",
            Self::MonthAbbr => "%b",
            Self::MonthPadded => "%m",
            Self::Month => "%-m",
            Self::WeekdayName => "%A",
            Self::WeekdayAbbr => "%a",
            Self::DayPadded => "%d",
            Self::Day => "%-d",
            Self::Hour24 => "%H",
            Self::Hour12Padded => "%I",
            Self::Hour12 => "%-I",
            Self::MinutePadded => "%M",
            Self::Minute => "%-M",
            Self::SecondPadded => "%S",
            Self::Second => "%-S",
            Self::MeridiemUpper => "%p",
            Self::MeridiemLower => "%P",
        };
        date.format(pattern).to_string()
    }
}

/// Parses a date found inside a file name: the EXIF and ISO layouts, compact
/// camera layouts such as `20240307_150409`, and bare dates at midnight.
pub fn parse_name_date(input: &str) -> Option<DateTime<Local>> {
    let input = input.trim();
    if let Some(date) = parse_date(input) {
        return Some(date);
    }

    const DATE_TIMES: [&str; 4] = [
        "%Y%m%d_%H%M%S",
        "%Y%m%d-%H%M%S",
        "%Y%m%d%H%M%S",
        "%Y-%m-%d_%H-%M-%S",
    ];
    const DATES: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y:%m:%d", "%Y%m%d"];

    let naive = DATE_TIMES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            DATES
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    Local.from_local_datetime(&naive).single()
}

/// Timestamps of one file. Platforms without birth or status-change times
/// leave those empty and readers fall back to the modification time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTimes {
    pub modified: DateTime<Local>,
    pub accessed: DateTime<Local>,
    pub created: Option<DateTime<Local>>,
    pub changed: Option<DateTime<Local>>,
}

impl FileTimes {
    pub fn get(&self, attr: TimeAttr, now: DateTime<Local>) -> DateTime<Local> {
        match attr {
            TimeAttr::Modified => self.modified,
            TimeAttr::Access => self.accessed,
            TimeAttr::Birth => self.created.unwrap_or(self.modified),
            TimeAttr::Change => self.changed.unwrap_or(self.modified),
            TimeAttr::Now => now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExifAttr {
    Iso,
    ExposureTime,
    FocalLength,
    FocalLength35,
    FNumber,
    Width,
    Height,
    Dimensions,
    Make,
    Model,
    Lens,
    Software,
    Latitude,
    Longitude,
    /// Original capture date, rendered through a date token.
    CaptureDate,
}

impl ExifAttr {
    pub fn from_token(token: &str) -> Option<Self> {
        let parsed = match token {
            "iso" => Self::Iso,
            "et" => Self::ExposureTime,
            "fl" => Self::FocalLength,
            "fl35" => Self::FocalLength35,
            "fnum" => Self::FNumber,
            "w" => Self::Width,
            "h" => Self::Height,
            "wh" => Self::Dimensions,
            "make" => Self::Make,
            "model" => Self::Model,
            "lens" => Self::Lens,
            "soft" => Self::Software,
            "lat" => Self::Latitude,
            "lon" => Self::Longitude,
            "cdt" => Self::CaptureDate,
            _ => return None,
        };
        Some(parsed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExifData {
    pub iso: Option<String>,
    pub exposure_time: Option<String>,
    pub focal_length: Option<String>,
    pub focal_length_35: Option<String>,
    pub f_number: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens: Option<String>,
    pub software: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub date: Option<DateTime<Local>>,
}

impl ExifData {
    /// Text value of an attribute. `date_token` renders the capture date and
    /// is ignored by every other attribute.
    pub fn value(&self, attr: ExifAttr, date_token: Option<DateToken>) -> Option<String> {
        match attr {
            ExifAttr::Iso => self.iso.clone(),
            ExifAttr::ExposureTime => self.exposure_time.clone(),
            ExifAttr::FocalLength => self.focal_length.clone(),
            ExifAttr::FocalLength35 => self.focal_length_35.clone(),
            ExifAttr::FNumber => self.f_number.clone(),
            ExifAttr::Width => self.width.clone(),
            ExifAttr::Height => self.height.clone(),
            ExifAttr::Dimensions => match (&self.width, &self.height) {
                (Some(w), Some(h)) => Some(format!("{w}x{h}")),
                _ => None,
            },
            ExifAttr::Make => self.make.clone(),
            ExifAttr::Model => self.model.clone(),
            ExifAttr::Lens => self.lens.clone(),
            ExifAttr::Software => self.software.clone(),
            ExifAttr::Latitude => self.latitude.clone(),
            ExifAttr::Longitude => self.longitude.clone(),
            ExifAttr::CaptureDate => {
                let date = self.date.as_ref()?;
                Some(date_token.unwrap_or(DateToken::Year).format(date))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Id3Tag {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Genre,
    Year,
    Track,
    TotalTracks,
    Disc,
    TotalDiscs,
}

impl Id3Tag {
    pub fn from_token(token: &str) -> Option<Self> {
        let parsed = match token {
            "title" => Self::Title,
            "artist" => Self::Artist,
            "album" => Self::Album,
            "album_artist" => Self::AlbumArtist,
            "genre" => Self::Genre,
            "year" => Self::Year,
            "track" => Self::Track,
            "total_tracks" => Self::TotalTracks,
            "disc" => Self::Disc,
            "total_discs" => Self::TotalDiscs,
            _ => return None,
        };
        Some(parsed)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id3Data {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<String>,
    pub track: Option<String>,
    pub total_tracks: Option<String>,
    pub disc: Option<String>,
    pub total_discs: Option<String>,
}

impl Id3Data {
    pub fn value(&self, tag: Id3Tag) -> Option<&str> {
        let value = match tag {
            Id3Tag::Title => &self.title,
            Id3Tag::Artist => &self.artist,
            Id3Tag::Album => &self.album,
            Id3Tag::AlbumArtist => &self.album_artist,
            Id3Tag::Genre => &self.genre,
            Id3Tag::Year => &self.year,
            Id3Tag::Track => &self.track,
            Id3Tag::TotalTracks => &self.total_tracks,
            Id3Tag::Disc => &self.disc,
            Id3Tag::TotalDiscs => &self.total_discs,
        };
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
